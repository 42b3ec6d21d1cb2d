//! # Test Doubles
//!
//! In-memory doubles for exercising tree mechanics without real business
//! logic: a [`LifecycleProbe`] records every activation and deactivation
//! (with ordering), and [`ProbeLogic`] is the interactor logic that reports
//! into one. The module is compiled unconditionally, not under `#[cfg(test)]`,
//! so integration tests can use it too.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::builder::Capability;
use crate::interactor::{Interactor, InteractorLogic};
use crate::router::Router;
use crate::viewable::{ViewControllable, ViewableRouter};

/// Shared recorder of lifecycle transitions across a tree of probe units.
///
/// Clones share the same recording, so one probe can observe a whole tree.
#[derive(Clone, Default)]
pub struct LifecycleProbe {
    state: Rc<ProbeState>,
}

#[derive(Default)]
struct ProbeState {
    activations: Cell<usize>,
    deactivations: Cell<usize>,
    activation_order: RefCell<Vec<&'static str>>,
    deactivation_order: RefCell<Vec<&'static str>>,
}

impl LifecycleProbe {
    /// Total activations observed.
    pub fn activations(&self) -> usize {
        self.state.activations.get()
    }

    /// Total deactivations observed.
    pub fn deactivations(&self) -> usize {
        self.state.deactivations.get()
    }

    /// Labels in the order their units activated.
    pub fn activation_order(&self) -> Vec<&'static str> {
        self.state.activation_order.borrow().clone()
    }

    /// Labels in the order their units deactivated.
    pub fn deactivation_order(&self) -> Vec<&'static str> {
        self.state.deactivation_order.borrow().clone()
    }

    fn record_activation(&self, label: &'static str) {
        self.state.activations.set(self.state.activations.get() + 1);
        self.state.activation_order.borrow_mut().push(label);
    }

    fn record_deactivation(&self, label: &'static str) {
        self.state.deactivations.set(self.state.deactivations.get() + 1);
        self.state.deactivation_order.borrow_mut().push(label);
    }
}

/// Interactor logic that reports its transitions to a [`LifecycleProbe`].
pub struct ProbeLogic {
    label: &'static str,
    probe: LifecycleProbe,
}

impl ProbeLogic {
    pub fn new(label: &'static str, probe: &LifecycleProbe) -> Self {
        Self {
            label,
            probe: probe.clone(),
        }
    }
}

impl InteractorLogic for ProbeLogic {
    fn did_become_active(&mut self, _scope: &Interactor<Self>) {
        self.probe.record_activation(self.label);
    }

    fn will_resign_active(&mut self, _scope: &Interactor<Self>) {
        self.probe.record_deactivation(self.label);
    }
}

/// A bare probe unit: router plus probe-reporting interactor.
pub fn probe_unit(label: &'static str, probe: &LifecycleProbe) -> Rc<Router<Interactor<ProbeLogic>>> {
    Rc::new(Router::new(Rc::new(Interactor::new(ProbeLogic::new(
        label, probe,
    )))))
}

/// A probe unit that carries a placeholder surface and provides `capability`.
pub fn probe_viewable_unit(
    label: &'static str,
    probe: &LifecycleProbe,
    capability: Capability,
) -> Rc<ViewableRouter<Interactor<ProbeLogic>>> {
    let router = Router::new(Rc::new(Interactor::new(ProbeLogic::new(label, probe))));
    Rc::new(ViewableRouter::new(
        router,
        ViewControllable::new(label),
        capability,
    ))
}
