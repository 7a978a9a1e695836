//! Request context and the middleware pipeline.
//!
//! One [`Context`] exists per request. It bundles the request-scoped
//! container (parented to the application container, so request
//! registrations shadow application-wide ones), the ordered middleware
//! stack, the terminal action, and the response sink — then drives them.
//!
//! # The cursor
//!
//! Execution is a cursor walking `[0, N]` over `N` middleware handlers:
//! positions `0..N` select a middleware, position `N` selects the terminal
//! action. [`run`](Context::run) advances the cursor after each handler
//! returns; [`next`](Context::next) lets the *currently executing* handler
//! advance it early and re-enter the loop, deferring downstream execution
//! inside its own body:
//!
//! ```text
//! async fn timing(ctx: Context) -> Result<(), selene::Error> {
//!     let start = Instant::now();
//!     ctx.next().await?;            // everything downstream runs here
//!     record(start.elapsed());      // … then control comes back
//!     Ok(())
//! }
//! ```
//!
//! After any handler returns, the loop stops immediately if the sink
//! reports output has begun — remaining handlers, the terminal action
//! included, are never invoked. The cursor can only be read at a position
//! `<= N`, so "ran past the terminal action" is unreachable by
//! construction rather than checked at runtime.
//!
//! Within one request everything here is strictly sequential; the context
//! never hands control to another task on its own. There is no built-in
//! timeout: a handler that never returns stalls only its own request task.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::apply::Populate;
use crate::container::{Container, TypeKey};
use crate::error::{Error, ResolveError};
use crate::handler::BoxedHandler;
use crate::sink::ResponseSink;

struct Inner {
    scope: RwLock<Container>,
    stack: Arc<[BoxedHandler]>,
    action: BoxedHandler,
    sink: Arc<dyn ResponseSink>,
    cursor: AtomicUsize,
}

/// Weak self-reference stored in the request scope so handlers can ask for
/// the context by type. Weak, because the scope lives inside the context:
/// a strong reference would cycle and the request's storage would never be
/// freed.
#[derive(Clone)]
struct ContextRef(Weak<Inner>);

/// Handle to one request's pipeline and scoped container. Cheap to clone;
/// all clones observe the same cursor and scope.
#[derive(Clone)]
pub struct Context {
    inner: Arc<Inner>,
}

impl Context {
    pub(crate) fn new(
        services: Arc<Container>,
        stack: Arc<[BoxedHandler]>,
        action: BoxedHandler,
        sink: Arc<dyn ResponseSink>,
    ) -> Self {
        let inner = Arc::new_cyclic(|weak: &Weak<Inner>| {
            let mut scope = Container::with_parent(services);
            scope.register(ContextRef(weak.clone()));
            scope.register_as::<dyn ResponseSink>(Arc::clone(&sink));
            Inner {
                scope: RwLock::new(scope),
                stack,
                action,
                sink,
                cursor: AtomicUsize::new(0),
            }
        });
        Self { inner }
    }

    /// Recovers the context owning `scope`, if `scope` is a request scope.
    pub(crate) fn current(scope: &Container) -> Option<Self> {
        let handle = scope.resolve::<ContextRef>()?;
        handle.0.upgrade().map(|inner| Self { inner })
    }

    // ── Request-scoped registration ──────────────────────────────────────

    /// Registers a request-scoped value, shadowing any application-level
    /// registration of the same type for the rest of this request.
    pub fn register<T: Send + Sync + 'static>(&self, value: T) {
        self.inner.scope.write().register(value);
    }

    /// Registers a request-scoped capability. See [`Container::register_as`].
    pub fn register_as<C: ?Sized + Send + Sync + 'static>(&self, value: Arc<C>) {
        self.inner.scope.write().register_as(value);
    }

    /// Raw request-scoped registration. See [`Container::register_raw`].
    pub fn register_raw(&self, key: TypeKey, value: Box<dyn std::any::Any + Send + Sync>) {
        self.inner.scope.write().register_raw(key, value);
    }

    /// Resolves from the request scope, falling back to the application
    /// container.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.inner.scope.read().resolve::<T>()
    }

    /// Populates injected fields of `target` from this request's scope.
    pub fn apply<T: Populate>(&self, target: &mut T) -> Result<(), ResolveError> {
        self.inner.scope.read().apply(target)
    }

    /// Invokes a handler against this request's scope, outside the
    /// pipeline's own cursor. Used by terminal actions that dispatch to
    /// further handlers (the router does this for route handlers).
    pub async fn invoke(&self, handler: &BoxedHandler) -> Result<(), Error> {
        let fut = {
            let scope = self.inner.scope.read();
            handler.call(&scope)?
        };
        fut.await
    }

    // ── Pipeline ─────────────────────────────────────────────────────────

    /// Runs the pipeline from the cursor's current position: each
    /// middleware in order, then the terminal action.
    ///
    /// A handler failure is fatal — it propagates out of `run` (and out of
    /// every pending [`next`](Context::next) on the stack) without being
    /// retried. Recovery, if wanted, is an enclosing middleware's job; see
    /// [`middleware::recovery`](crate::middleware::recovery).
    pub async fn run(&self) -> Result<(), Error> {
        let n = self.inner.stack.len();
        loop {
            let cursor = self.inner.cursor.load(Ordering::Relaxed);
            if cursor > n {
                break;
            }
            let handler = if cursor < n {
                Arc::clone(&self.inner.stack[cursor])
            } else {
                Arc::clone(&self.inner.action)
            };
            self.invoke(&handler).await?;
            self.inner.cursor.fetch_add(1, Ordering::Relaxed);
            if self.written() {
                break;
            }
        }
        Ok(())
    }

    /// Yields to the rest of the chain, returning once everything
    /// downstream has run (or short-circuited). Only meaningful from
    /// within a currently executing handler.
    pub async fn next(&self) -> Result<(), Error> {
        self.inner.cursor.fetch_add(1, Ordering::Relaxed);
        self.run().await
    }

    /// Whether the response sink reports output has begun.
    pub fn written(&self) -> bool {
        self.inner.sink.written()
    }
}
