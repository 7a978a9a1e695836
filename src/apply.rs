//! Struct field injection.
//!
//! The second way dependencies get where they are needed: instead of
//! declaring them as handler parameters, a long-lived object can have its
//! fields filled in from a container after construction. Marking which
//! fields participate is done with [`inject_fields!`] — everything it does
//! not list is left strictly alone.
//!
//! ```rust
//! use std::sync::Arc;
//! use selene::{inject_fields, Container};
//!
//! #[derive(Default)]
//! struct Worker {
//!     db: Option<Arc<String>>, // injected
//!     attempts: u32,           // plain field, never touched
//! }
//!
//! inject_fields!(Worker {
//!     db: Option<Arc<String>>,
//! });
//!
//! let mut services = Container::new();
//! services.register("postgres://localhost".to_owned());
//!
//! let mut worker = Worker { attempts: 3, ..Default::default() };
//! services.apply(&mut worker).unwrap();
//! assert!(worker.db.is_some());
//! assert_eq!(worker.attempts, 3);
//! ```

use crate::container::Container;
use crate::error::ResolveError;

/// A struct whose injected fields can be populated from a [`Container`].
///
/// Usually implemented by [`inject_fields!`] rather than by hand. Fields
/// are assigned in the order listed; the first unresolvable field aborts
/// with an error naming it, and fields assigned before the failure keep
/// their new values — there is no rollback.
pub trait Populate {
    fn populate(&mut self, scope: &Container) -> Result<(), ResolveError>;
}

/// Implements [`Populate`] for a struct, listing the fields to inject.
///
/// Each listed field must implement [`Inject`](crate::Inject) (so `Arc<T>`,
/// `Option<Arc<T>>`, …). Unlisted fields are left untouched. Only
/// externally unassignable fields are out of reach here — the macro can
/// only name fields visible where it is invoked, which keeps injection an
/// explicit, reviewable list instead of something discovered at runtime.
#[macro_export]
macro_rules! inject_fields {
    ($target:ty { $($field:ident: $ty:ty),+ $(,)? }) => {
        impl $crate::Populate for $target {
            fn populate(
                &mut self,
                scope: &$crate::Container,
            ) -> ::std::result::Result<(), $crate::ResolveError> {
                $(
                    self.$field = <$ty as $crate::Inject>::inject(scope).map_err(|_| {
                        $crate::ResolveError::MissingField {
                            field: stringify!($field),
                            type_name: ::std::any::type_name::<$ty>(),
                        }
                    })?;
                )+
                Ok(())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Clock;
    struct Mailer;

    #[derive(Default)]
    struct Job {
        clock: Option<Arc<Clock>>,
        mailer: Option<Arc<Mailer>>,
        label: &'static str,
    }

    // `label` is deliberately not listed.
    inject_fields!(Job {
        clock: Option<Arc<Clock>>,
        mailer: Option<Arc<Mailer>>,
    });

    #[test]
    fn only_listed_fields_are_assigned() {
        let mut scope = Container::new();
        scope.register(Clock);
        scope.register(Mailer);

        let mut job = Job { label: "nightly", ..Default::default() };
        scope.apply(&mut job).unwrap();

        assert!(job.clock.is_some());
        assert!(job.mailer.is_some());
        assert_eq!(job.label, "nightly");
    }

    struct Strict {
        clock: Arc<Clock>,
        mailer: Arc<Mailer>,
    }

    inject_fields!(Strict {
        clock: Arc<Clock>,
        mailer: Arc<Mailer>,
    });

    #[test]
    fn first_missing_field_aborts_and_names_itself() {
        let mut scope = Container::new();
        scope.register(Clock);
        // Mailer not registered.

        let original_clock = Arc::new(Clock);
        let original_mailer = Arc::new(Mailer);
        let mut strict = Strict {
            clock: Arc::clone(&original_clock),
            mailer: Arc::clone(&original_mailer),
        };
        let err = scope.apply(&mut strict).unwrap_err();

        match err {
            ResolveError::MissingField { field, type_name } => {
                assert_eq!(field, "mailer");
                assert!(type_name.contains("Mailer"));
            }
            other => panic!("unexpected error: {other}"),
        }

        // No rollback: `clock` keeps the value injected before the failure,
        // `mailer` keeps its original.
        assert!(!Arc::ptr_eq(&strict.clock, &original_clock));
        assert!(Arc::ptr_eq(&strict.mailer, &original_mailer));
    }
}
