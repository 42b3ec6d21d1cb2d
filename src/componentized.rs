//! # Componentized Builders
//!
//! A componentized builder pairs every build with a brand-new DI component:
//! 1:1, component to router. The builder never retains the component it made,
//! since that would stretch the component's lifetime past the unit it belongs
//! to. Instead, each build call runs the component factory again and asserts
//! the factory really produced a fresh instance.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use async_trait::async_trait;
use tracing::debug;

use crate::router::Routing;

/// The per-unit build step of a componentized builder.
///
/// Implementations receive the freshly made component plus the caller's
/// dynamic build dependency and assemble the unit's router. Use `()` for
/// either dependency type when the unit does not need it.
pub trait ComponentBuildable: 'static {
    /// The DI component type paired 1:1 with each built router.
    type Component: 'static;

    /// The router type of the constructed unit.
    type Router: Routing;

    /// Caller-supplied dependency consumed while building the unit.
    type BuildDep;

    /// Caller-supplied dependency consumed while instantiating the component.
    type ComponentDep;

    /// Assembles the unit's router from the given component.
    fn build_with_component(
        &self,
        component: &Rc<Self::Component>,
        dependency: Self::BuildDep,
    ) -> Rc<Self::Router>;
}

/// Builder that instantiates a fresh component per build and delegates unit
/// assembly to a [`ComponentBuildable`].
pub struct ComponentizedBuilder<T: ComponentBuildable> {
    delegate: T,
    component_factory: Box<dyn Fn(T::ComponentDep) -> Rc<T::Component>>,
    last_component: RefCell<Weak<T::Component>>,
}

impl<T: ComponentBuildable> ComponentizedBuilder<T> {
    /// Creates a builder around `delegate`, with the closure that
    /// instantiates a new component for every build.
    pub fn new(
        delegate: T,
        component_factory: impl Fn(T::ComponentDep) -> Rc<T::Component> + 'static,
    ) -> Self {
        Self {
            delegate,
            component_factory: Box::new(component_factory),
            last_component: RefCell::new(Weak::new()),
        }
    }

    /// Builds a new unit, returning its router.
    pub fn build(
        &self,
        build_dependency: T::BuildDep,
        component_dependency: T::ComponentDep,
    ) -> Rc<T::Router> {
        self.build_pair(build_dependency, component_dependency).1
    }

    /// Builds a new unit, returning both the component and the router so the
    /// caller can keep the pairing visible.
    pub fn build_pair(
        &self,
        build_dependency: T::BuildDep,
        component_dependency: T::ComponentDep,
    ) -> (Rc<T::Component>, Rc<T::Router>) {
        let component = (self.component_factory)(component_dependency);

        // Each factory invocation must produce a new component instance.
        if let Some(last) = self.last_component.borrow().upgrade() {
            assert!(
                !Rc::ptr_eq(&last, &component),
                "component factory must produce a new component for every build"
            );
        }
        *self.last_component.borrow_mut() = Rc::downgrade(&component);

        let router = self.delegate.build_with_component(&component, build_dependency);
        debug!(router = %router.type_label(), "built unit with fresh component");
        (component, router)
    }

    /// The asynchronous variant of [`ComponentizedBuilder::build_pair`], for
    /// call sites whose component construction must hand control to a
    /// cooperative scheduler. The component is fully constructed before the
    /// continuation observes the pair, and a build request, once issued,
    /// always runs to completion: there is no cancellation protocol for
    /// in-flight construction.
    pub async fn build_pair_async(
        &self,
        build_dependency: T::BuildDep,
        component_dependency: T::ComponentDep,
    ) -> (Rc<T::Component>, Rc<T::Router>) {
        self.build_pair(build_dependency, component_dependency)
    }
}

impl<T> ComponentizedBuilder<T>
where
    T: ComponentBuildable<BuildDep = (), ComponentDep = ()>,
{
    /// Builds a new unit without dynamic dependencies.
    pub fn build_simple(&self) -> Rc<T::Router> {
        self.build((), ())
    }
}

/// An object-level asynchronous build surface.
///
/// Implemented for every componentized builder whose dynamic dependencies
/// have defaults, so call sites can hold `&dyn`-free generic builders and
/// await construction on a cooperative scheduler.
#[async_trait(?Send)]
pub trait AsyncBuildable {
    /// The router type of the constructed unit.
    type Router: Routing;

    /// Builds a new unit asynchronously.
    async fn build_async(&self) -> Rc<Self::Router>;
}

#[async_trait(?Send)]
impl<T> AsyncBuildable for ComponentizedBuilder<T>
where
    T: ComponentBuildable,
    T::BuildDep: Default,
    T::ComponentDep: Default,
{
    type Router = T::Router;

    async fn build_async(&self) -> Rc<T::Router> {
        self.build_pair_async(Default::default(), Default::default())
            .await
            .1
    }
}
