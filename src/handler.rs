//! Handler trait and type erasure.
//!
//! # How injected handlers are stored
//!
//! The middleware stack and routing table need to hold handlers of
//! *different* arities and parameter types in one `Vec`. Rust collections
//! can only hold one concrete type, so we use **trait objects**
//! (`dyn ErasedHandler`) to hide the concrete handler behind a common
//! interface and store everything uniformly.
//!
//! The chain from user code to vtable call is:
//!
//! ```text
//! async fn audit(ctx: Context, log: Arc<dyn Logger>) { … }  ← user writes this
//!        ↓ app.wrap(audit)
//! audit.into_boxed_handler()                     ← Handler blanket impl
//!        ↓
//! Arc::new(FnHandler { f: audit, … })            ← heap-allocated wrapper
//!        ↓  stored as BoxedHandler = Arc<dyn ErasedHandler>
//! handler.call(&scope)  at request time          ← resolve params, then call
//!        ↓
//! Box::pin(async { audit(ctx, log).await.into_outcome() })
//! ```
//!
//! Parameter resolution happens *before* the future is created: an
//! unresolvable parameter aborts the call with a [`ResolveError`] and the
//! handler body is never entered.
//!
//! "A handler must be callable with resolvable parameters" is not a runtime
//! check here — the `Handler<Args>` bound rejects anything else at the call
//! site of `wrap`/`action`/`on`, at compile time.

use std::future::Future;
use std::marker::PhantomData;
use std::pin::Pin;
use std::sync::Arc;

use crate::container::Container;
use crate::error::{Error, ResolveError};
use crate::inject::Inject;

// ── Internal types ────────────────────────────────────────────────────────────

/// A heap-allocated, type-erased future for one handler invocation.
///
/// `Pin<Box<…>>` because the runtime must poll it in place; `Send` so tokio
/// may move it across worker threads between polls.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Result<(), Error>> + Send + 'static>>;

/// Internal dispatch interface.
///
/// `#[doc(hidden)] pub` rather than `pub(crate)` because it appears in the
/// return type of the public `Handler` trait's `into_boxed_handler` method.
#[doc(hidden)]
pub trait ErasedHandler: Send + Sync {
    /// Resolves the handler's parameters against `scope` and, if every one
    /// of them is available, returns the call as a future.
    fn call(&self, scope: &Container) -> Result<BoxFuture, ResolveError>;
}

/// A heap-allocated, type-erased handler shared across concurrent requests.
///
/// `Arc` gives cheap, thread-safe shared ownership — one atomic increment
/// per invocation, no copying.
#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + 'static>;

// ── Public Handler trait ──────────────────────────────────────────────────────

/// Implemented for every valid handler.
///
/// You never implement this yourself. It is automatically satisfied for any
/// `async fn` (or `Fn` returning a future) of up to eight parameters, where
/// every parameter implements [`Inject`] and the return type is `()` or
/// `Result<(), Error>`:
///
/// ```text
/// async fn name(a: Arc<Db>, ctx: Context, …) -> Result<(), Error>
/// ```
///
/// The `Args` parameter only disambiguates the blanket impls per arity;
/// inference fills it in. The trait is **sealed**: only the blanket impls
/// below can satisfy it.
pub trait Handler<Args>: private::Sealed<Args> + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed<Args> {}
}

// ── Outcomes ──────────────────────────────────────────────────────────────────

/// Conversion from a handler's return value into the pipeline's verdict.
///
/// Handlers speak through the response sink; their return value only says
/// whether they failed. `()` means success, `Err` is fatal to the pipeline.
pub trait IntoOutcome {
    fn into_outcome(self) -> Result<(), Error>;
}

impl IntoOutcome for () {
    fn into_outcome(self) -> Result<(), Error> {
        Ok(())
    }
}

impl<E: Into<Error>> IntoOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), Error> {
        self.map_err(Into::into)
    }
}

// ── Blanket implementations ───────────────────────────────────────────────────

/// Newtype wrapper holding a concrete handler `F`, bridging the typed world
/// to the trait-object world. The phantom pins down which `Args` impl `F`
/// was erased through.
struct FnHandler<F, Args> {
    f: F,
    _args: PhantomData<fn(Args)>,
}

macro_rules! impl_handler {
    ($($ty:ident),*) => {
        impl<F, Fut, R, $($ty,)*> private::Sealed<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoOutcome + 'static,
            $($ty: Inject,)*
        {
        }

        impl<F, Fut, R, $($ty,)*> Handler<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoOutcome + 'static,
            $($ty: Inject,)*
        {
            fn into_boxed_handler(self) -> BoxedHandler {
                Arc::new(FnHandler { f: self, _args: PhantomData })
            }
        }

        impl<F, Fut, R, $($ty,)*> ErasedHandler for FnHandler<F, ($($ty,)*)>
        where
            F: Fn($($ty),*) -> Fut + Send + Sync + 'static,
            Fut: Future<Output = R> + Send + 'static,
            R: IntoOutcome + 'static,
            $($ty: Inject,)*
        {
            #[allow(non_snake_case, unused_variables)]
            fn call(&self, scope: &Container) -> Result<BoxFuture, ResolveError> {
                // Resolve everything first. One miss and the body never runs.
                $(let $ty = <$ty as Inject>::inject(scope)?;)*
                let fut = (self.f)($($ty),*);
                Ok(Box::pin(async move { fut.await.into_outcome() }))
            }
        }
    };
}

impl_handler!();
impl_handler!(A1);
impl_handler!(A1, A2);
impl_handler!(A1, A2, A3);
impl_handler!(A1, A2, A3, A4);
impl_handler!(A1, A2, A3, A4, A5);
impl_handler!(A1, A2, A3, A4, A5, A6);
impl_handler!(A1, A2, A3, A4, A5, A6, A7);
impl_handler!(A1, A2, A3, A4, A5, A6, A7, A8);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Tally(AtomicU32);

    async fn bump(tally: Arc<Tally>) {
        tally.0.fetch_add(1, Ordering::SeqCst);
    }

    #[tokio::test]
    async fn invoke_resolves_parameters_in_declared_order() {
        let mut scope = Container::new();
        scope.register(Tally(AtomicU32::new(0)));
        scope.register("hello".to_owned());

        async fn read(tally: Arc<Tally>, s: Arc<String>) {
            tally.0.store(s.len() as u32, Ordering::SeqCst);
        }

        let handler = read.into_boxed_handler();
        scope.invoke(&handler).await.unwrap();
        assert_eq!(scope.resolve::<Tally>().unwrap().0.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn failed_resolution_never_enters_the_body() {
        // `bump` needs a Tally; the container has none registered, so the
        // shared counter must stay untouched.
        let scope = Container::new();
        let witness = Arc::new(Tally(AtomicU32::new(0)));

        let w = Arc::clone(&witness);
        let handler = (move |_missing: Arc<String>| {
            let w = Arc::clone(&w);
            async move { bump(w).await }
        })
        .into_boxed_handler();

        let err = scope.invoke(&handler).await.unwrap_err();
        assert_eq!(witness.0.load(Ordering::SeqCst), 0);
        match err {
            Error::Resolve(e) => assert!(e.type_name().contains("String")),
            other => panic!("expected resolve error, got {other}"),
        }
    }

    #[tokio::test]
    async fn handler_failure_is_surfaced_not_swallowed() {
        let scope = Container::new();
        let handler =
            (|| async { Err::<(), Error>(Error::handler("boom")) }).into_boxed_handler();

        let err = scope.invoke(&handler).await.unwrap_err();
        assert!(matches!(err, Error::Handler(_)));
    }

    #[tokio::test]
    async fn zero_arity_handlers_work() {
        let scope = Container::new();
        let handler = (|| async {}).into_boxed_handler();
        scope.invoke(&handler).await.unwrap();
    }
}
