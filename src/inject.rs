//! Parameter resolution.
//!
//! [`Inject`] is the seam between the container and everything that wants
//! values out of it: handler parameters and injected struct fields both go
//! through this trait. Implementations resolve, they never construct —
//! absence is always reported as a [`ResolveError`] naming the type.

use std::sync::Arc;

use crate::container::Container;
use crate::context::Context;
use crate::error::ResolveError;

/// A value that can be resolved from a [`Container`].
///
/// Implemented out of the box for:
///
/// - `Arc<T>` — any registered service or capability (`T` may be a trait
///   object, e.g. `Arc<dyn Logger>`),
/// - [`Context`] — the current request context,
/// - `Option<T>` — optional dependency; absence resolves to `None` instead
///   of failing.
pub trait Inject: Sized + Send + 'static {
    fn inject(scope: &Container) -> Result<Self, ResolveError>;
}

impl<T: ?Sized + Send + Sync + 'static> Inject for Arc<T> {
    fn inject(scope: &Container) -> Result<Self, ResolveError> {
        scope.resolve::<T>().ok_or_else(ResolveError::missing::<T>)
    }
}

impl<T: Inject> Inject for Option<T> {
    fn inject(scope: &Container) -> Result<Self, ResolveError> {
        Ok(T::inject(scope).ok())
    }
}

impl Inject for Context {
    fn inject(scope: &Container) -> Result<Self, ResolveError> {
        Context::current(scope).ok_or_else(ResolveError::missing::<Context>)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Metrics;

    #[test]
    fn arc_injection_resolves_and_fails_by_name() {
        let mut scope = Container::new();
        scope.register(Metrics);

        assert!(<Arc<Metrics> as Inject>::inject(&scope).is_ok());

        let err = <Arc<String> as Inject>::inject(&scope).unwrap_err();
        assert!(err.type_name().contains("String"));
    }

    #[test]
    fn option_injection_never_fails() {
        let scope = Container::new();
        let got = <Option<Arc<Metrics>> as Inject>::inject(&scope).unwrap();
        assert!(got.is_none());
    }
}
