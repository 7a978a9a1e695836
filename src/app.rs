//! Application assembly.
//!
//! [`App`] is the mutable startup-time builder: register services, stack
//! middleware, pick a terminal action. [`App::build`] freezes it into a
//! [`Pipeline`] — the application container goes behind an `Arc` and is
//! immutable from then on, which is what makes lock-free concurrent
//! resolution from every request task sound. Anything that must vary per
//! request is registered on the request's own [`Context`] instead.

use std::sync::Arc;

use crate::config::Config;
use crate::container::{Container, TypeKey};
use crate::context::Context;
use crate::handler::{BoxedHandler, Handler};
use crate::router::{self, Router};
use crate::sink::ResponseSink;

/// The top-level application builder.
///
/// ```rust,no_run
/// use selene::{App, Config, Router, middleware};
/// # use std::sync::Arc;
/// # use http::StatusCode;
/// # async fn home(sink: Arc<dyn selene::ResponseSink>) { sink.write(b"hi"); }
///
/// let app = App::with_config(Config::from_env())
///     .wrap(middleware::logger)
///     .wrap(middleware::recovery)
///     .router(Router::new().get("/", home));
/// ```
pub struct App {
    services: Container,
    stack: Vec<BoxedHandler>,
    action: BoxedHandler,
}

impl App {
    /// A bare application with default configuration, no middleware, and a
    /// no-op terminal action.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// An application carrying an explicitly constructed [`Config`].
    pub fn with_config(config: Config) -> Self {
        let mut services = Container::new();
        services.register(config);
        Self {
            services,
            stack: Vec::new(),
            action: (|| async {}).into_boxed_handler(),
        }
    }

    // ── Service registration ─────────────────────────────────────────────

    /// Registers an application-wide service. See [`Container::register`].
    pub fn register<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.services.register(value);
        self
    }

    /// Registers an application-wide capability. See [`Container::register_as`].
    pub fn register_as<C: ?Sized + Send + Sync + 'static>(mut self, value: Arc<C>) -> Self {
        self.services.register_as(value);
        self
    }

    /// Raw application-wide registration. See [`Container::register_raw`].
    pub fn register_raw(
        mut self,
        key: TypeKey,
        value: Box<dyn std::any::Any + Send + Sync>,
    ) -> Self {
        self.services.register_raw(key, value);
        self
    }

    // ── Pipeline assembly ────────────────────────────────────────────────

    /// Appends a middleware handler. Middleware run in the order added.
    pub fn wrap<Args>(mut self, handler: impl Handler<Args>) -> Self {
        self.stack.push(handler.into_boxed_handler());
        self
    }

    /// Sets the terminal action, invoked after all middleware unless an
    /// earlier handler already wrote the response.
    pub fn action<Args>(mut self, handler: impl Handler<Args>) -> Self {
        self.action = handler.into_boxed_handler();
        self
    }

    /// Registers `router` as a service and installs route dispatch as the
    /// terminal action.
    pub fn router(self, router: Router) -> Self {
        self.register(router).action(router::dispatch)
    }

    /// Freezes the application into its shareable serving form.
    pub fn build(self) -> Pipeline {
        Pipeline {
            services: Arc::new(self.services),
            stack: self.stack.into(),
            action: self.action,
        }
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// The frozen application: shared services plus the handler chain, cloned
/// cheaply into every connection task.
#[derive(Clone)]
pub struct Pipeline {
    services: Arc<Container>,
    stack: Arc<[BoxedHandler]>,
    action: BoxedHandler,
}

impl Pipeline {
    /// Creates the context for one request: a fresh child container
    /// parented to the application container, with `sink` registered
    /// under the [`ResponseSink`] capability and the context resolvable
    /// as [`Context`].
    pub fn context(&self, sink: Arc<dyn ResponseSink>) -> Context {
        Context::new(
            Arc::clone(&self.services),
            Arc::clone(&self.stack),
            Arc::clone(&self.action),
            sink,
        )
    }

    /// The shared application container.
    pub fn services(&self) -> &Arc<Container> {
        &self.services
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ResponseBuffer;

    #[tokio::test]
    async fn config_is_resolvable_from_request_contexts() {
        let pipeline = App::with_config(Config { port: 9999, ..Config::default() }).build();

        let sink = Arc::new(ResponseBuffer::new());
        let ctx = pipeline.context(sink);

        let config = ctx.resolve::<Config>().unwrap();
        assert_eq!(config.port, 9999);
    }

    #[tokio::test]
    async fn default_action_is_a_no_op() {
        let pipeline = App::new().build();
        let sink = Arc::new(ResponseBuffer::new());
        let ctx = pipeline.context(Arc::clone(&sink) as Arc<dyn ResponseSink>);

        ctx.run().await.unwrap();
        assert!(!sink.written());
    }
}
