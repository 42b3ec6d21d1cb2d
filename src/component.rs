//! # Dependency-Injection Components
//!
//! A `Component` is the cache-bearing node of the dependency-injection graph.
//! Each unit of the tree pairs one component with one router: the component
//! carries the capability bag the parent supplied (`dependency()`) and lazily
//! memoizes the objects the unit constructs from it (`shared()`).
//!
//! # Architecture Note
//! The dependency bag is a passive, immutable record. It never references the
//! component built from it, so holding it behind an `Rc` cannot form a cycle:
//! ownership flows strictly from builder to component to constructed objects.
//! The bag outlives every component built from it because the owning builder
//! keeps its own strong reference for as long as it can build.
//!
//! # Concurrency
//! A component's cache is private to that instance and is never aliased across
//! instances. Calls into one component are expected to be serialized by its
//! logical owner; there is no internal locking, and concurrent first-access
//! races are a precondition violation rather than a case this type defends
//! against.

use std::any::Any;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::debug;

/// The special empty dependency bag, for units at the root of the graph that
/// require nothing from a parent.
#[derive(Debug, Default)]
pub struct EmptyDependency;

/// A component built over the empty dependency bag.
pub type EmptyComponent = Component<EmptyDependency>;

/// A cache-bearing node over a dependency bag of type `T`.
///
/// The component exposes the bag supplied at construction and a keyed,
/// compute-at-most-once cache for objects the unit wants to construct a single
/// time and hand to several dependents. The cache is cleared only when the
/// component itself is dropped.
pub struct Component<T> {
    dependency: Rc<T>,
    cache: RefCell<HashMap<String, Rc<dyn Any>>>,
    in_flight: RefCell<HashSet<String>>,
}

impl<T> Component<T> {
    /// Creates a component over the given dependency bag.
    pub fn new(dependency: Rc<T>) -> Self {
        Self {
            dependency,
            cache: RefCell::new(HashMap::new()),
            in_flight: RefCell::new(HashSet::new()),
        }
    }

    /// The dependency bag supplied at construction.
    pub fn dependency(&self) -> &T {
        &self.dependency
    }

    /// Returns the memoized value for `key`, running `factory` only on the
    /// first access for that key. Later calls with the same key return the
    /// stored value regardless of any external state changes in between.
    ///
    /// The factory may call `shared` for *other* keys while it runs. Calling
    /// back into `shared` for the same key is a cyclic factory, which is a
    /// wiring bug and panics.
    ///
    /// # Panics
    /// Panics on a cyclic factory, or when a key is reused with a different
    /// value type than it was first stored with.
    pub fn shared<S: 'static>(&self, key: &str, factory: impl FnOnce() -> S) -> Rc<S> {
        if let Some(hit) = self.cache.borrow().get(key) {
            return hit
                .clone()
                .downcast::<S>()
                .unwrap_or_else(|_| panic!("shared key `{key}` was stored with a different type"));
        }

        assert!(
            self.in_flight.borrow_mut().insert(key.to_string()),
            "cyclic shared factory: `{key}` re-entered its own construction"
        );

        let value = Rc::new(factory());
        self.in_flight.borrow_mut().remove(key);
        debug!(key, "shared instance constructed");

        self.cache
            .borrow_mut()
            .insert(key.to_string(), value.clone() as Rc<dyn Any>);
        value
    }
}

impl Component<EmptyDependency> {
    /// Creates a component with nothing injected into it.
    pub fn empty() -> Self {
        Self::new(Rc::new(EmptyDependency))
    }
}
