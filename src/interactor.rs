//! # Interactors
//!
//! An `Interactor` is the business-logic half of a unit. It is a two-state
//! activation machine driven purely by tree attachment: when the owning router
//! is attached to a parent the interactor becomes active, and when the router
//! is detached it resigns active. An interactor should only perform its
//! business logic while active.
//!
//! # Architecture Note
//! Business logic plugs in through the [`InteractorLogic`] trait rather than
//! inheritance: the framework owns the state machine once, in
//! [`Interactor<L>`], and your type supplies the `did_become_active` /
//! `will_resign_active` hooks. This is the same split the tree uses
//! everywhere: a generic runtime type wrapping a user-supplied contract.
//!
//! # Lifecycle stream
//! Activeness is published through a `tokio::sync::watch` channel. A new
//! subscriber always observes the current state immediately, and the stream
//! terminates permanently only when the interactor is dropped. Nothing richer
//! than replay-latest plus eventual completion is promised.

use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

use tokio::sync::watch;
use tracing::debug;

use crate::helpers::scrub_type_name;

/// The activeness of an interactor's scope.
pub trait InteractorScope {
    /// Indicates if the interactor is currently active.
    fn is_active(&self) -> bool;

    /// A replay-latest stream of this interactor's activeness. Subscribing
    /// always immediately observes the current state. The stream terminates
    /// after the interactor is dropped.
    fn is_active_stream(&self) -> watch::Receiver<bool>;
}

/// The contract routers drive: activation and deactivation.
///
/// These methods are invoked by the owning router as part of attach and
/// detach. Application code should never call them explicitly.
pub trait Interactable: InteractorScope {
    /// Activate this interactor. Idempotent.
    fn activate(&self);

    /// Deactivate this interactor. Idempotent.
    fn deactivate(&self);
}

/// The hooks a unit's business logic implements.
///
/// Both hooks receive the owning [`Interactor`] as a scope handle, so setup
/// code can register deactivation-scoped cleanup via
/// [`Interactor::on_deactivate`]. The hooks already hold `&mut self`; they
/// must not call back into [`Interactor::logic`] for the same interactor.
pub trait InteractorLogic: Sized + 'static {
    /// Fired exactly once per activation, after the state flips to active.
    /// Override to set up subscriptions and initial state.
    fn did_become_active(&mut self, _scope: &Interactor<Self>) {}

    /// Fired on deactivation, before the state flips back to inactive.
    /// Override to tear down state the unit accumulated while active.
    fn will_resign_active(&mut self, _scope: &Interactor<Self>) {}
}

/// The generic interactor runtime: owns the activation state machine and the
/// lifecycle stream for a piece of business logic `L`.
pub struct Interactor<L: InteractorLogic> {
    logic: RefCell<L>,
    active: watch::Sender<bool>,
    teardowns: RefCell<Option<Vec<Box<dyn FnOnce()>>>>,
    label: String,
}

impl<L: InteractorLogic> Interactor<L> {
    /// Creates an inactive interactor around the given logic.
    pub fn new(logic: L) -> Self {
        let (active, _) = watch::channel(false);
        Self {
            logic: RefCell::new(logic),
            active,
            teardowns: RefCell::new(None),
            label: scrub_type_name(std::any::type_name::<L>()),
        }
    }

    /// Immutable access to the business logic.
    pub fn logic(&self) -> Ref<'_, L> {
        self.logic.borrow()
    }

    /// Mutable access to the business logic.
    pub fn logic_mut(&self) -> RefMut<'_, L> {
        self.logic.borrow_mut()
    }

    /// Registers cleanup scoped to the current activation. It runs no later
    /// than when `deactivate` completes. If the interactor is not active,
    /// there is no future deactivation to trigger it, so it runs immediately.
    pub fn on_deactivate(&self, cleanup: impl FnOnce() + 'static) {
        let mut slot = self.teardowns.borrow_mut();
        match slot.as_mut() {
            Some(list) => list.push(Box::new(cleanup)),
            None => {
                drop(slot);
                cleanup();
            }
        }
    }

    fn label(&self) -> &str {
        &self.label
    }
}

impl<L: InteractorLogic> InteractorScope for Interactor<L> {
    fn is_active(&self) -> bool {
        *self.active.borrow()
    }

    fn is_active_stream(&self) -> watch::Receiver<bool> {
        self.active.subscribe()
    }
}

impl<L: InteractorLogic> Interactable for Interactor<L> {
    fn activate(&self) {
        if self.is_active() {
            return;
        }

        *self.teardowns.borrow_mut() = Some(Vec::new());
        self.active.send_replace(true);
        debug!(interactor = %self.label(), "activated");

        self.logic.borrow_mut().did_become_active(self);
    }

    fn deactivate(&self) {
        if !self.is_active() {
            return;
        }

        self.logic.borrow_mut().will_resign_active(self);

        let teardowns = self.teardowns.borrow_mut().take();
        if let Some(list) = teardowns {
            for cleanup in list {
                cleanup();
            }
        }

        self.active.send_replace(false);
        debug!(interactor = %self.label(), "deactivated");
    }
}

impl<L: InteractorLogic> Drop for Interactor<L> {
    fn drop(&mut self) {
        if self.is_active() {
            self.deactivate();
        }
        // The watch sender drops with self, terminating every subscriber.
    }
}

/// An interactor that additionally strong-owns a presenter for its whole
/// lifetime. The framework never inspects the presenter; it only guarantees
/// the ownership.
pub struct PresentableInteractor<L: InteractorLogic, P> {
    interactor: Interactor<L>,
    presenter: P,
}

impl<L: InteractorLogic, P> PresentableInteractor<L, P> {
    pub fn new(logic: L, presenter: P) -> Self {
        Self {
            interactor: Interactor::new(logic),
            presenter,
        }
    }

    /// The owned presenter.
    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    /// The wrapped interactor runtime.
    pub fn interactor(&self) -> &Interactor<L> {
        &self.interactor
    }
}

impl<L: InteractorLogic, P> InteractorScope for PresentableInteractor<L, P> {
    fn is_active(&self) -> bool {
        self.interactor.is_active()
    }

    fn is_active_stream(&self) -> watch::Receiver<bool> {
        self.interactor.is_active_stream()
    }
}

impl<L: InteractorLogic, P: 'static> Interactable for PresentableInteractor<L, P> {
    fn activate(&self) {
        self.interactor.activate();
    }

    fn deactivate(&self) {
        self.interactor.deactivate();
    }
}

/// Errors surfaced by the lifecycle stream helpers.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    /// The stream terminated before the awaited transition: the interactor
    /// behind it was dropped.
    #[error("lifecycle stream terminated: the interactor was dropped")]
    Terminated,
}

/// Waits until the scope behind `stream` is active. Returns immediately when
/// it already is, per the replay-latest contract.
pub async fn wait_for_activation(stream: &mut watch::Receiver<bool>) -> Result<(), LifecycleError> {
    stream
        .wait_for(|active| *active)
        .await
        .map(|_| ())
        .map_err(|_| LifecycleError::Terminated)
}

/// Waits until the scope behind `stream` is inactive. The counterpart of
/// [`wait_for_activation`].
pub async fn wait_for_deactivation(
    stream: &mut watch::Receiver<bool>,
) -> Result<(), LifecycleError> {
    stream
        .wait_for(|active| !*active)
        .await
        .map(|_| ())
        .map_err(|_| LifecycleError::Terminated)
}

/// Convenience alias used where the tree only needs the activation contract.
pub type SharedInteractable = Rc<dyn Interactable>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct Recording {
        became_active: usize,
        resigned: usize,
    }

    impl InteractorLogic for Recording {
        fn did_become_active(&mut self, _scope: &Interactor<Self>) {
            self.became_active += 1;
        }

        fn will_resign_active(&mut self, _scope: &Interactor<Self>) {
            self.resigned += 1;
        }
    }

    #[test]
    fn activate_is_idempotent_and_fires_the_hook_once() {
        let interactor = Interactor::new(Recording::default());

        interactor.activate();
        interactor.activate();

        assert!(interactor.is_active());
        assert_eq!(interactor.logic().became_active, 1);
    }

    #[test]
    fn deactivate_is_idempotent_and_fires_before_the_state_flips() {
        let interactor = Interactor::new(Recording::default());
        interactor.activate();

        interactor.deactivate();
        interactor.deactivate();

        assert!(!interactor.is_active());
        assert_eq!(interactor.logic().resigned, 1);
    }

    #[test]
    fn deactivate_without_activation_is_a_no_op() {
        let interactor = Interactor::new(Recording::default());
        interactor.deactivate();
        assert_eq!(interactor.logic().resigned, 0);
    }

    #[test]
    fn cleanup_registered_while_active_runs_on_deactivate() {
        let interactor = Rc::new(Interactor::new(Recording::default()));
        let ran = Rc::new(Cell::new(false));

        interactor.activate();
        let flag = ran.clone();
        interactor.on_deactivate(move || flag.set(true));
        assert!(!ran.get());

        interactor.deactivate();
        assert!(ran.get());
    }

    #[test]
    fn cleanup_registered_while_inactive_runs_immediately() {
        let interactor = Interactor::new(Recording::default());
        let ran = Rc::new(Cell::new(false));

        let flag = ran.clone();
        interactor.on_deactivate(move || flag.set(true));

        assert!(ran.get());
    }

    #[test]
    fn stream_replays_the_current_state_to_new_subscribers() {
        let interactor = Interactor::new(Recording::default());
        assert!(!*interactor.is_active_stream().borrow());

        interactor.activate();
        assert!(*interactor.is_active_stream().borrow());
    }

    #[tokio::test]
    async fn stream_terminates_when_the_interactor_is_dropped() {
        let interactor = Interactor::new(Recording::default());
        let mut stream = interactor.is_active_stream();
        drop(interactor);

        assert!(matches!(
            wait_for_activation(&mut stream).await,
            Err(LifecycleError::Terminated)
        ));
    }

    #[tokio::test]
    async fn wait_for_activation_returns_immediately_when_already_active() {
        let interactor = Interactor::new(Recording::default());
        interactor.activate();

        let mut stream = interactor.is_active_stream();
        wait_for_activation(&mut stream).await.unwrap();
    }

    #[test]
    fn presentable_interactor_owns_its_presenter_for_life() {
        struct Presenter {
            title: &'static str,
        }

        let interactor = PresentableInteractor::new(Recording::default(), Presenter { title: "t" });
        interactor.activate();
        assert!(interactor.is_active());
        assert_eq!(interactor.presenter().title, "t");
    }
}
