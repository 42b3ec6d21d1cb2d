//! # Builders
//!
//! A `Builder` is the factory of a unit: it owns the dependency bag a parent
//! supplied and constructs a fully wired (router, interactor) pair on demand.
//! Builders also declare, by [`Capability`], the child builders the
//! constructed router can later resolve for capability-based lookup.
//!
//! # Architecture Note
//! Child lookup is deliberately a closed, capability-keyed table instead of
//! reflection-style dispatch. Parents declare exactly which subtrees they can
//! produce; requesting an undeclared capability returns `None`, which callers
//! must treat as "subtree unavailable" rather than a failure.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::router::Routing;

/// A named contract used to match builders and routers during lookup.
///
/// Capabilities are compared by identity of their name, so declare them as
/// constants next to the unit that provides them:
///
/// ```
/// use unit_tree::Capability;
///
/// pub const SETTINGS: Capability = Capability::named("settings");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Capability(&'static str);

impl Capability {
    /// Declares a capability tag with the given name.
    pub const fn named(name: &'static str) -> Self {
        Self(name)
    }

    /// The declared name.
    pub fn name(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// The type-erased build entry a parent registers per child capability.
///
/// The declaring builder captures whatever listener and dependencies the
/// child needs, so the tree can construct the subtree later without the
/// caller re-supplying them.
pub trait BuildChild: 'static {
    /// Builds one instance of the child unit and returns its router.
    fn build_child(&self) -> Rc<dyn Routing>;

    /// Declares whether repeated builds must yield independent units. The
    /// default, and the expected answer, is `true`. `false` is reserved for
    /// shared singletons; callers must check before assuming freshness.
    fn need_create_new_instance(&self) -> bool {
        true
    }
}

impl<F> BuildChild for F
where
    F: Fn() -> Rc<dyn Routing> + 'static,
{
    fn build_child(&self) -> Rc<dyn Routing> {
        self()
    }
}

/// The capability-keyed table of child builders a parent hands to the router
/// it constructs.
#[derive(Default)]
pub struct ChildBuilders {
    entries: HashMap<Capability, Rc<dyn BuildChild>>,
}

impl ChildBuilders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a child builder for `capability`.
    pub fn declare(mut self, capability: Capability, builder: Rc<dyn BuildChild>) -> Self {
        self.entries.insert(capability, builder);
        self
    }

    /// Declares a child builder from a plain closure.
    pub fn declare_fn(
        self,
        capability: Capability,
        build: impl Fn() -> Rc<dyn Routing> + 'static,
    ) -> Self {
        self.declare(capability, Rc::new(build))
    }

    /// The declared builder for `capability`, or `None` when the subtree is
    /// unavailable.
    pub fn get(&self, capability: Capability) -> Option<Rc<dyn BuildChild>> {
        self.entries.get(&capability).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// The generic builder contract.
///
/// A builder constructs a fully wired unit from the dependency bag it owns,
/// optionally parameterized by a caller-supplied listener. Child declarations
/// come in two flavors: static ([`Buildable::child_builders`]) and derived
/// from a runtime dependency value
/// ([`Buildable::child_builders_with_dependency`]).
pub trait Buildable: 'static {
    /// The router type of the constructed unit.
    type Router: Routing;

    /// The caller-supplied collaborator the built interactor reports to.
    /// Use `()` when the unit has no listener.
    type Listener;

    /// The runtime value dynamic child declarations are derived from.
    /// Use `()` when child declarations are static.
    type ChildDependency;

    /// Constructs a fully wired unit, handing `listener` to its interactor.
    fn build_with_listener(&self, listener: Self::Listener) -> Rc<Self::Router>;

    /// Whether repeated builds must yield independent units. Defaults to
    /// `true`; `false` is reserved for shared singletons and callers must
    /// check it before assuming freshness.
    fn need_create_new_instance(&self) -> bool {
        true
    }

    /// The statically declared child builders, keyed by capability. Defaults
    /// to none.
    fn child_builders(&self) -> ChildBuilders {
        ChildBuilders::new()
    }

    /// Child builders derived from a runtime dependency value. Defaults to
    /// the static declarations.
    fn child_builders_with_dependency(&self, _dependency: &Self::ChildDependency) -> ChildBuilders {
        self.child_builders()
    }

    /// Constructs a unit without a listener.
    fn build(&self) -> Rc<Self::Router>
    where
        Self::Listener: Default,
    {
        self.build_with_listener(Self::Listener::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    use crate::interactor::{Interactor, InteractorLogic};
    use crate::mock::{LifecycleProbe, ProbeLogic};
    use crate::router::Router;

    const LEAF: Capability = Capability::named("leaf");

    fn leaf_router() -> Rc<dyn Routing> {
        let probe = LifecycleProbe::default();
        Rc::new(Router::new(Rc::new(Interactor::new(ProbeLogic::new(
            "leaf", &probe,
        )))))
    }

    /// Listener a parent hands to the panel unit; counts activation reports.
    #[derive(Clone, Default)]
    struct ActivationListener {
        notified: Rc<Cell<usize>>,
    }

    struct PanelLogic {
        listener: ActivationListener,
    }

    impl InteractorLogic for PanelLogic {
        fn did_become_active(&mut self, _scope: &Interactor<Self>) {
            let count = &self.listener.notified;
            count.set(count.get() + 1);
        }
    }

    struct PanelBuilder;

    impl Buildable for PanelBuilder {
        type Router = Router<Interactor<PanelLogic>>;
        type Listener = ActivationListener;
        type ChildDependency = ();

        fn build_with_listener(&self, listener: ActivationListener) -> Rc<Self::Router> {
            Rc::new(
                Router::new(Rc::new(Interactor::new(PanelLogic { listener })))
                    .with_child_builders(self.child_builders()),
            )
        }

        fn child_builders(&self) -> ChildBuilders {
            ChildBuilders::new().declare_fn(LEAF, leaf_router)
        }
    }

    /// A builder whose child declarations come from a runtime value instead
    /// of a static table.
    struct RuntimePanelBuilder;

    impl Buildable for RuntimePanelBuilder {
        type Router = Router<Interactor<PanelLogic>>;
        type Listener = ActivationListener;
        type ChildDependency = Vec<Capability>;

        fn build_with_listener(&self, listener: ActivationListener) -> Rc<Self::Router> {
            Rc::new(Router::new(Rc::new(Interactor::new(PanelLogic {
                listener,
            }))))
        }

        fn child_builders_with_dependency(&self, dependency: &Vec<Capability>) -> ChildBuilders {
            dependency
                .iter()
                .fold(ChildBuilders::new(), |table, capability| {
                    table.declare_fn(*capability, leaf_router)
                })
        }
    }

    #[test]
    fn declared_capabilities_resolve() {
        let builders = ChildBuilders::new().declare_fn(LEAF, leaf_router);
        assert!(builders.get(LEAF).is_some());
        assert_eq!(builders.len(), 1);
    }

    #[test]
    fn undeclared_capability_is_absence_not_a_fault() {
        let builders = ChildBuilders::new();
        assert!(builders.get(Capability::named("missing")).is_none());
    }

    #[test]
    fn closure_entries_default_to_fresh_instances() {
        let builders = ChildBuilders::new().declare_fn(LEAF, leaf_router);
        let entry = builders.get(LEAF).unwrap();
        assert!(entry.need_create_new_instance());

        let a = entry.build_child();
        let b = entry.build_child();
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn built_units_report_to_the_supplied_listener() {
        let listener = ActivationListener::default();
        let router = PanelBuilder.build_with_listener(listener.clone());
        assert_eq!(listener.notified.get(), 0);

        router.launch();

        assert_eq!(listener.notified.get(), 1);
        assert!(router.get_child_builder(LEAF).is_some());
    }

    #[test]
    fn build_falls_back_to_the_default_listener() {
        let a = PanelBuilder.build();
        let b = PanelBuilder.build();

        assert!(PanelBuilder.need_create_new_instance());
        assert!(!Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn dynamic_child_declarations_default_to_the_static_table() {
        let builders = PanelBuilder.child_builders_with_dependency(&());

        assert!(builders.get(LEAF).is_some());
        assert!(builders.get(Capability::named("missing")).is_none());
    }

    #[test]
    fn dynamic_child_declarations_follow_the_runtime_dependency() {
        let wanted = vec![Capability::named("feed"), Capability::named("profile")];
        let builders = RuntimePanelBuilder.child_builders_with_dependency(&wanted);

        assert_eq!(builders.len(), 2);
        assert!(builders.get(Capability::named("feed")).is_some());
        assert!(builders.get(LEAF).is_none());

        // The static default stays empty for this builder.
        assert!(RuntimePanelBuilder.child_builders().is_empty());
    }
}
