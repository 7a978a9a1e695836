//! # selene
//!
//! A small modular web framework built around request-scoped dependency
//! injection.
//!
//! ## The model
//!
//! Handlers do not take a fixed signature. They declare what they need as
//! parameters, and selene resolves each parameter by type from a
//! [`Container`] before the call — an application-wide container for
//! shared services, shadowed by a per-request scope for anything bound to
//! the request in flight:
//!
//! - **[`Container`]** — type-keyed registry with parent delegation.
//!   Register concrete services with [`Container::register`], trait-object
//!   capabilities with [`Container::register_as`].
//! - **[`Handler`]** — any `async fn` whose parameters all implement
//!   [`Inject`]. A missing registration fails the call *before* the
//!   handler body runs, with an error naming the missing type.
//! - **[`Context`]** — one per request: the request scope plus the
//!   middleware pipeline. Middleware call [`Context::next`] to run
//!   everything downstream inside their own body, and the chain stops as
//!   soon as the response sink reports output has begun.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use selene::{App, Config, Params, ResponseSink, Router, Server, middleware};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env();
//!     let addr = config.addr();
//!
//!     let app = App::with_config(config)
//!         .wrap(middleware::logger)
//!         .wrap(middleware::recovery)
//!         .router(Router::new().get("/users/{id}", get_user));
//!
//!     Server::bind(&addr).serve(app.build()).await.unwrap();
//! }
//!
//! async fn get_user(params: Arc<Params>, sink: Arc<dyn ResponseSink>) {
//!     let id = params.get("id").unwrap_or("unknown");
//!     sink.write(format!(r#"{{"id":"{id}"}}"#).as_bytes());
//! }
//! ```
//!
//! Route handlers, middleware, and the terminal action are all the same
//! kind of handler — the router itself is resolved from the container like
//! any other service.

mod app;
mod apply;
mod config;
mod container;
mod context;
mod error;
mod handler;
mod inject;
mod request;
mod router;
mod server;
mod sink;

pub mod health;
pub mod middleware;

pub use app::{App, Pipeline};
pub use apply::Populate;
pub use config::{Config, Env};
pub use container::{Container, TypeKey};
pub use context::Context;
pub use error::{Error, ResolveError};
pub use handler::{BoxedHandler, Handler, IntoOutcome};
pub use inject::Inject;
pub use request::Request;
pub use router::{Params, Router, dispatch};
pub use server::Server;
pub use sink::{ResponseBuffer, ResponseSink};

// Re-exported for convenience: route tables and sinks speak these types.
pub use http::{Method, StatusCode};
