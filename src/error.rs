//! Unified error types.
//!
//! Two layers, deliberately kept apart:
//!
//! - [`ResolveError`] — a requested type has no value anywhere in the
//!   container chain. Raised by the callers of `resolve` (invocation and
//!   field injection), never by `resolve` itself, which returns `None`.
//!   It always names the missing type, so a failed injection reads like a
//!   diagnostic, not a shrug.
//! - [`Error`] — everything selene's fallible operations can surface:
//!   resolution failures, a handler's own failure (fatal to the pipeline),
//!   and infrastructure errors from the serving glue.
//!
//! Application-level errors (404, 422, …) are not `Error`s. They are
//! written through the response sink.

use std::any::type_name;

/// A type could not be resolved from the container chain.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// No registration for the requested type, locally or in any ancestor.
    #[error("no value registered for type `{0}`")]
    Missing(&'static str),
    /// Field injection found no registration for a field's declared type.
    #[error("no value registered for type `{type_name}` (field `{field}`)")]
    MissingField {
        field: &'static str,
        type_name: &'static str,
    },
}

impl ResolveError {
    /// Not-found error for the type `T`, carrying its name.
    pub fn missing<T: ?Sized>() -> Self {
        Self::Missing(type_name::<T>())
    }

    /// The name of the type that failed to resolve.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Missing(name) => name,
            Self::MissingField { type_name, .. } => type_name,
        }
    }
}

/// The error type returned by selene's fallible operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A handler parameter or injected field could not be resolved.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// A handler was invoked and reported failure. The pipeline treats
    /// this as fatal: it is escalated, never retried or swallowed.
    /// Recovery belongs to an enclosing middleware, not to the core.
    #[error("handler failed: {0}")]
    Handler(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// I/O failure in the serving glue (bind, accept, …).
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// Protocol-level failure while reading a request body.
    #[error("http: {0}")]
    Http(#[from] hyper::Error),
}

impl Error {
    /// Wraps an application error as a fatal handler failure.
    pub fn handler(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Handler(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_names_the_type() {
        struct Database;
        let err = ResolveError::missing::<Database>();
        assert!(err.to_string().contains("Database"));
    }

    #[test]
    fn field_error_names_field_and_type() {
        let err = ResolveError::MissingField {
            field: "logger",
            type_name: "alloc::sync::Arc<dyn Logger>",
        };
        let msg = err.to_string();
        assert!(msg.contains("logger"));
        assert!(msg.contains("dyn Logger"));
    }
}
