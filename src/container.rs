//! Type-keyed service container.
//!
//! # How type-directed resolution is stored
//!
//! The container needs to hold services of *different* types in a single
//! map and hand them back by type alone. Every registration is wrapped in
//! an `Arc<T>` and erased to `Box<dyn Any + Send + Sync>`, keyed by
//! `TypeId::of::<T>()`:
//!
//! ```text
//! container.register(Database::connect(url))      ← user writes this
//!        ↓
//! values[TypeId::of::<Database>()] = Box::new(Arc::new(db))
//!        ↓  later, in a handler parameter or injected field
//! container.resolve::<Database>()                 ← one HashMap lookup
//!        ↓
//! entry.downcast_ref::<Arc<Database>>().cloned()  ← one Arc clone
//! ```
//!
//! Because `TypeId::of` also works for unsized trait-object types,
//! capabilities register the same way: [`Container::register_as`] keys an
//! `Arc<dyn Logger>` under `TypeId::of::<dyn Logger>()`. Every capability
//! must be registered explicitly — there is no "scan everything for an
//! implementer" fallback, so resolution is deterministic by construction.
//!
//! Containers form a tree. Each request gets a fresh child parented to the
//! shared application container; lookup falls back to the parent chain, so
//! request-scoped registrations shadow application-wide ones of the same
//! type. Parent links are set exactly once, at creation, to a container
//! that already exists — the tree cannot contain a cycle.
//!
//! # Mutation and sharing
//!
//! Registration takes `&mut self`. The application container is built
//! during startup, then frozen behind an `Arc` when serving begins, which
//! makes concurrent reads safe without any locking. Request containers are
//! exclusively owned by the single task handling that request.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::apply::Populate;
use crate::error::{Error, ResolveError};
use crate::handler::BoxedHandler;

// ── TypeKey ───────────────────────────────────────────────────────────────────

/// An opaque token identifying a type, carrying its name for diagnostics.
///
/// Obtained via [`TypeKey::of`]; equality is identity of the type, never of
/// instances. Only needed with [`Container::register_raw`] — the typed
/// registration methods derive the key themselves.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self { id: TypeId::of::<T>(), name: type_name::<T>() }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeKey({})", self.name)
    }
}

// ── Container ─────────────────────────────────────────────────────────────────

/// A type-erased registration: always an `Arc<T>` boxed as `dyn Any`.
type AnyService = Box<dyn Any + Send + Sync>;

struct Entry {
    value: AnyService,
    name: &'static str,
}

/// The service container: a type-keyed registry with parent delegation,
/// handler invocation, and struct field injection.
///
/// ```rust
/// use std::sync::Arc;
/// use selene::Container;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// let mut services = Container::new();
/// services.register(42u16);
/// services.register_as::<dyn Greeter>(Arc::new(English));
///
/// assert_eq!(*services.resolve::<u16>().unwrap(), 42);
/// assert_eq!(services.resolve::<dyn Greeter>().unwrap().greet(), "hello");
/// ```
#[derive(Default)]
pub struct Container {
    values: HashMap<TypeId, Entry>,
    parent: Option<Arc<Container>>,
}

impl Container {
    /// An empty container with no parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty container that delegates unresolved lookups to `parent`.
    pub fn with_parent(parent: Arc<Container>) -> Self {
        Self { values: HashMap::new(), parent: Some(parent) }
    }

    /// Sets the parent container lookups fall back to.
    ///
    /// # Panics
    ///
    /// Panics if a parent is already set. The link is part of the
    /// container's identity; reassigning it mid-flight is a programmer
    /// error, not a runtime condition.
    pub fn set_parent(&mut self, parent: Arc<Container>) {
        assert!(self.parent.is_none(), "container parent is already set");
        self.parent = Some(parent);
    }

    // ── Registration ─────────────────────────────────────────────────────

    /// Registers `value` under its own concrete type.
    ///
    /// The value is wrapped in an `Arc` and resolved as `Arc<T>`.
    /// Registering a second value of the same type overwrites the first —
    /// last write wins.
    pub fn register<T: Send + Sync + 'static>(&mut self, value: T) {
        self.insert(TypeKey::of::<T>(), Box::new(Arc::new(value)));
    }

    /// Registers a shared value under an explicitly chosen type `C`,
    /// usually a trait-object capability:
    ///
    /// ```rust,ignore
    /// services.register_as::<dyn Logger>(Arc::new(StdoutLogger::new()));
    /// ```
    ///
    /// A concrete value's type cannot by itself say which capability it
    /// should satisfy, so capabilities are always registered explicitly.
    /// Registering under `C` does not also register under the concrete
    /// type of the value.
    pub fn register_as<C: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<C>) {
        self.insert(TypeKey::of::<C>(), Box::new(value));
    }

    /// Raw escape hatch: stores a pre-erased value under an arbitrary key.
    ///
    /// `value` must be the `Arc<T>` matching `key`, boxed — exactly what
    /// [`resolve`](Self::resolve) will downcast to. A mismatched entry is
    /// simply unreachable (resolution treats it as absent).
    pub fn register_raw(&mut self, key: TypeKey, value: Box<dyn Any + Send + Sync>) {
        self.insert(key, value);
    }

    fn insert(&mut self, key: TypeKey, value: AnyService) {
        self.values.insert(key.id, Entry { value, name: key.name });
    }

    // ── Resolution ───────────────────────────────────────────────────────

    /// Looks up the value registered for `T`: exact local match first,
    /// then the parent chain. `None` means not found — absence is the
    /// caller's problem to classify.
    ///
    /// Resolution never mutates the container; repeated calls return
    /// clones of the same `Arc`.
    pub fn resolve<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        if let Some(entry) = self.values.get(&TypeId::of::<T>()) {
            if let Some(arc) = entry.value.downcast_ref::<Arc<T>>() {
                return Some(Arc::clone(arc));
            }
        }
        self.parent.as_ref().and_then(|p| p.resolve::<T>())
    }

    /// Whether `key` has a registration, locally or in any ancestor.
    pub fn contains(&self, key: TypeKey) -> bool {
        self.values.contains_key(&key.id)
            || self.parent.as_ref().is_some_and(|p| p.contains(key))
    }

    // ── Invocation and field injection ───────────────────────────────────

    /// Resolves every parameter the handler declares and calls it.
    ///
    /// If any parameter is unresolvable the handler body is never entered
    /// and the returned [`ResolveError`] names the missing type. A failure
    /// reported by the handler itself surfaces as [`Error::Handler`].
    pub async fn invoke(&self, handler: &BoxedHandler) -> Result<(), Error> {
        let fut = handler.call(self)?;
        fut.await
    }

    /// Populates the injected fields of `target` from this container.
    ///
    /// Fields are assigned in declaration order; the first unresolvable
    /// field aborts with an error naming it, leaving fields already
    /// assigned as they are. Fields not marked for injection are never
    /// touched. See [`inject_fields!`](crate::inject_fields).
    pub fn apply<T: Populate>(&self, target: &mut T) -> Result<(), ResolveError> {
        target.populate(self)
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.values.values().map(|e| e.name).collect();
        names.sort_unstable();
        f.debug_struct("Container")
            .field("types", &names)
            .field("parent", &self.parent.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Database {
        url: String,
    }

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    struct English;
    impl Greeter for English {
        fn greet(&self) -> &'static str { "hello" }
    }

    #[test]
    fn exact_match_resolves_registered_value() {
        let mut c = Container::new();
        c.register(Database { url: "postgres://localhost".into() });

        let db = c.resolve::<Database>().unwrap();
        assert_eq!(db.url, "postgres://localhost");
    }

    #[test]
    fn unregistered_type_resolves_to_none() {
        let c = Container::new();
        assert!(c.resolve::<Database>().is_none());
    }

    #[test]
    fn last_write_wins() {
        let mut c = Container::new();
        c.register(Database { url: "first".into() });
        c.register(Database { url: "second".into() });
        assert_eq!(c.resolve::<Database>().unwrap().url, "second");
    }

    #[test]
    fn capability_registration_is_independent_of_concrete_type() {
        let mut c = Container::new();
        c.register_as::<dyn Greeter>(Arc::new(English));

        assert_eq!(c.resolve::<dyn Greeter>().unwrap().greet(), "hello");
        // Registering under the capability does not register the concrete type.
        assert!(c.resolve::<English>().is_none());
    }

    #[test]
    fn child_shadows_parent_and_delegates_the_rest() {
        let mut parent = Container::new();
        parent.register(Database { url: "app".into() });
        parent.register(7u32);
        let parent = Arc::new(parent);

        let mut child = Container::with_parent(Arc::clone(&parent));
        child.register(Database { url: "request".into() });

        // Shadowed locally, untouched in the parent.
        assert_eq!(child.resolve::<Database>().unwrap().url, "request");
        assert_eq!(parent.resolve::<Database>().unwrap().url, "app");
        // Only present in the parent: delegated.
        assert_eq!(*child.resolve::<u32>().unwrap(), 7);
        // Request-scoped values never leak upward.
        assert!(parent.resolve::<u32>().is_some());
        assert!(child.resolve::<String>().is_none());
    }

    #[test]
    fn resolution_is_idempotent() {
        let mut c = Container::new();
        c.register(Database { url: "x".into() });

        let a = c.resolve::<Database>().unwrap();
        let b = c.resolve::<Database>().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn raw_registration_round_trips() {
        // The raw form exists for values whose key cannot be derived from
        // the value expression alone, e.g. channel halves behind aliases.
        let (tx, _rx) = std::sync::mpsc::channel::<u8>();
        let mut c = Container::new();
        c.register_raw(TypeKey::of::<std::sync::mpsc::Sender<u8>>(), Box::new(Arc::new(tx)));

        assert!(c.resolve::<std::sync::mpsc::Sender<u8>>().is_some());
        assert!(c.contains(TypeKey::of::<std::sync::mpsc::Sender<u8>>()));
    }

    #[test]
    #[should_panic(expected = "parent is already set")]
    fn reparenting_is_a_programmer_error() {
        let root = Arc::new(Container::new());
        let mut child = Container::with_parent(Arc::clone(&root));
        child.set_parent(root);
    }
}
