//! Radix-tree request router, used as the pipeline's terminal action.
//!
//! One tree per HTTP method, O(path-length) lookup via [`matchit`]. Route
//! handlers are ordinary injectable handlers — they can declare the
//! request, the sink, path [`Params`], or any registered service as
//! parameters, exactly like middleware. The router runs after all
//! middleware, exactly once per request, unless an earlier handler already
//! wrote the response.

use std::collections::HashMap;
use std::sync::Arc;

use http::{Method, StatusCode};
use matchit::Router as PathTree;

use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::sink::ResponseSink;

/// Path parameters matched for the current route, registered
/// request-scoped before the route handler is invoked.
///
/// For a route `/users/{id}`, `params.get("id")` on `/users/42` returns
/// `Some("42")`.
pub struct Params(HashMap<String, String>);

impl Params {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The routing table.
///
/// Build it once at startup and hand it to [`App::router`](crate::App::router),
/// which registers it as a service and installs [`dispatch`] as the
/// terminal action. Each registration returns `self` so routes chain.
pub struct Router {
    routes: HashMap<Method, PathTree<BoxedHandler>>,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new() }
    }

    /// Registers a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax:
    ///
    /// ```rust,no_run
    /// # use selene::{Params, Router, ResponseSink};
    /// # use std::sync::Arc;
    /// # use http::Method;
    /// # async fn get_user(_: Arc<Params>, _: Arc<dyn ResponseSink>) {}
    /// # async fn create_user(_: Arc<dyn ResponseSink>) {}
    /// Router::new()
    ///     .on(Method::GET,  "/users/{id}", get_user)
    ///     .on(Method::POST, "/users",      create_user);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics on a malformed or conflicting path pattern — routes are
    /// startup configuration, and a bad table should fail loudly before
    /// serving begins.
    pub fn on<Args>(mut self, method: Method, path: &str, handler: impl Handler<Args>) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub fn get<Args>(self, path: &str, handler: impl Handler<Args>) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post<Args>(self, path: &str, handler: impl Handler<Args>) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put<Args>(self, path: &str, handler: impl Handler<Args>) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn delete<Args>(self, path: &str, handler: impl Handler<Args>) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    pub fn patch<Args>(self, path: &str, handler: impl Handler<Args>) -> Self {
        self.on(Method::PATCH, path, handler)
    }

    pub(crate) fn find(&self, method: &Method, path: &str) -> Option<(BoxedHandler, Params)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = Params(
            matched
                .params
                .iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect(),
        );
        Some((handler, params))
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal action dispatching to the matched route handler.
///
/// Injectable like any handler: the router arrives through the container,
/// so swapping routing strategies means registering a different `Router`.
/// Matched [`Params`] are registered request-scoped before the route
/// handler runs; no match writes `404` through the sink.
pub async fn dispatch(
    router: Arc<Router>,
    ctx: Context,
    req: Arc<Request>,
    sink: Arc<dyn ResponseSink>,
) -> Result<(), Error> {
    match router.find(req.method(), req.path()) {
        Some((handler, params)) => {
            ctx.register(params);
            ctx.invoke(&handler).await
        }
        None => {
            sink.set_status(StatusCode::NOT_FOUND);
            sink.write(b"Not Found");
            Ok(())
        }
    }
}
