//! # Multi-Stage Componentized Builders
//!
//! Some units are assembled in several configuration steps that all need to
//! share one DI component before the unit exists. A multi-stage builder
//! scopes its component to a *pass*: every access within the pass returns the
//! same instance, and the terminal build call consumes it, so the next access
//! begins a new pass with a new component.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::debug;

use crate::router::Routing;

/// The terminal build step of a multi-stage builder.
pub trait MultiStageBuildable: 'static {
    /// The DI component shared across one pass.
    type Component: 'static;

    /// The router type of the constructed unit.
    type Router: Routing;

    /// Caller-supplied dependency consumed by the terminal build step.
    type BuildDep;

    /// Assembles the unit's router from the pass's component, exactly once
    /// per pass.
    fn final_stage_build_with_component(
        &self,
        component: &Rc<Self::Component>,
        dependency: Self::BuildDep,
    ) -> Rc<Self::Router>;
}

/// Builder whose component lives for one multi-stage build pass.
pub struct MultiStageComponentizedBuilder<T: MultiStageBuildable> {
    delegate: T,
    component_factory: Box<dyn Fn() -> Rc<T::Component>>,
    current_pass: RefCell<Option<Rc<T::Component>>>,
    last_component: RefCell<Weak<T::Component>>,
}

impl<T: MultiStageBuildable> MultiStageComponentizedBuilder<T> {
    /// Creates a builder around `delegate`, with the closure that
    /// instantiates a new component for every pass.
    pub fn new(delegate: T, component_factory: impl Fn() -> Rc<T::Component> + 'static) -> Self {
        Self {
            delegate,
            component_factory: Box::new(component_factory),
            current_pass: RefCell::new(None),
            last_component: RefCell::new(Weak::new()),
        }
    }

    /// The component for the current build pass, created lazily on first
    /// access. Every call within the same pass returns the same instance;
    /// once [`MultiStageComponentizedBuilder::final_stage_build`] fires, the
    /// next call begins a new pass with a new instance.
    pub fn component_for_current_build_pass(&self) -> Rc<T::Component> {
        if let Some(current) = self.current_pass.borrow().as_ref() {
            return current.clone();
        }

        let component = (self.component_factory)();

        // Each factory invocation must produce a new component instance.
        if let Some(last) = self.last_component.borrow().upgrade() {
            assert!(
                !Rc::ptr_eq(&last, &component),
                "component factory must produce a new component for every pass"
            );
        }
        *self.last_component.borrow_mut() = Rc::downgrade(&component);

        debug!("started new build pass");
        *self.current_pass.borrow_mut() = Some(component.clone());
        component
    }

    /// The terminal build step: consumes the current pass's component,
    /// assembles the router, and resets so the next component access begins
    /// a new pass.
    pub fn final_stage_build(&self, dependency: T::BuildDep) -> Rc<T::Router> {
        let component = self.component_for_current_build_pass();
        let router = self
            .delegate
            .final_stage_build_with_component(&component, dependency);
        *self.current_pass.borrow_mut() = None;
        debug!(router = %router.type_label(), "finished build pass");
        router
    }
}

impl<T> MultiStageComponentizedBuilder<T>
where
    T: MultiStageBuildable<BuildDep = ()>,
{
    /// The terminal build step without a dynamic dependency.
    pub fn final_stage_build_simple(&self) -> Rc<T::Router> {
        self.final_stage_build(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, EmptyDependency};
    use crate::interactor::Interactor;
    use crate::mock::{LifecycleProbe, ProbeLogic};
    use crate::router::Router;

    struct StagedUnit {
        probe: LifecycleProbe,
    }

    impl MultiStageBuildable for StagedUnit {
        type Component = Component<EmptyDependency>;
        type Router = Router<Interactor<ProbeLogic>>;
        type BuildDep = ();

        fn final_stage_build_with_component(
            &self,
            _component: &Rc<Self::Component>,
            _dependency: (),
        ) -> Rc<Self::Router> {
            Rc::new(Router::new(Rc::new(Interactor::new(ProbeLogic::new(
                "staged",
                &self.probe,
            )))))
        }
    }

    fn staged_builder() -> MultiStageComponentizedBuilder<StagedUnit> {
        MultiStageComponentizedBuilder::new(
            StagedUnit {
                probe: LifecycleProbe::default(),
            },
            || Rc::new(Component::empty()),
        )
    }

    #[test]
    fn component_is_stable_within_a_pass() {
        let builder = staged_builder();

        let first = builder.component_for_current_build_pass();
        let second = builder.component_for_current_build_pass();

        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn final_stage_build_begins_a_new_pass() {
        let builder = staged_builder();

        let before = builder.component_for_current_build_pass();
        builder.final_stage_build_simple();
        let after = builder.component_for_current_build_pass();

        assert!(!Rc::ptr_eq(&before, &after));
    }

    #[test]
    fn pre_final_configuration_shares_the_pass_component() {
        let builder = staged_builder();

        // Two configuration stages seed the shared cache, then the terminal
        // build consumes the same component.
        builder
            .component_for_current_build_pass()
            .shared("stage-one", || 1_u32);
        let seen = builder
            .component_for_current_build_pass()
            .shared("stage-one", || 99_u32);

        assert_eq!(*seen, 1);
        builder.final_stage_build_simple();
    }

    #[test]
    #[should_panic(expected = "new component for every pass")]
    fn a_caching_component_factory_is_a_contract_violation() {
        let cached = Rc::new(Component::empty());
        let builder = MultiStageComponentizedBuilder::new(
            StagedUnit {
                probe: LifecycleProbe::default(),
            },
            move || cached.clone(),
        );

        builder.final_stage_build_simple();
        builder.component_for_current_build_pass();
    }
}
