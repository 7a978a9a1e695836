//! Minimal selene example — injected services, middleware, JSON routes.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl http://localhost:3000/greet/world
//!   curl -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl http://localhost:3000/healthz

use std::sync::Arc;

use http::{HeaderValue, StatusCode, header};
use selene::{App, Config, Params, Request, ResponseSink, Router, Server, health, middleware};

/// An application capability: anything registered under `dyn Greeter` can
/// be injected by route handlers that declare `Arc<dyn Greeter>`.
trait Greeter: Send + Sync {
    fn greet(&self, name: &str) -> String;
}

struct English;

impl Greeter for English {
    fn greet(&self, name: &str) -> String {
        format!("hello, {name}")
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = Config::from_env();
    let addr = config.addr();

    let routes = Router::new()
        .get("/greet/{name}", greet)
        .post("/users", create_user)
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness);

    let app = App::with_config(config)
        .register_as::<dyn Greeter>(Arc::new(English))
        .wrap(middleware::logger)
        .wrap(middleware::recovery)
        .router(routes);

    Server::bind(&addr)
        .serve(app.build())
        .await
        .expect("server error");
}

// GET /greet/{name}
//
// Parameters are resolved by type: path params, the greeter capability,
// and the response sink all arrive through the request's container.
async fn greet(params: Arc<Params>, greeter: Arc<dyn Greeter>, sink: Arc<dyn ResponseSink>) {
    let name = params.get("name").unwrap_or("stranger");
    sink.insert_header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    sink.write(greeter.greet(name).as_bytes());
}

// POST /users
async fn create_user(req: Arc<Request>, sink: Arc<dyn ResponseSink>) {
    if req.body().is_empty() {
        sink.set_status(StatusCode::BAD_REQUEST);
        return;
    }

    // Real app: let input: CreateUser = serde_json::from_slice(req.body())?;
    sink.set_status(StatusCode::CREATED);
    sink.insert_header(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    sink.write(br#"{"id":"99","name":"new_user"}"#);
}
