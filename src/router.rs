//! # Routers
//!
//! A `Router` is the tree node of a unit. It exclusively owns one interactor,
//! an ordered set of currently attached child routers, and a capability-keyed
//! table of child builders. Attaching and detaching children is the only way
//! the live tree mutates, and it is what drives interactor activation.
//!
//! # Architecture Note
//! Ownership flows strictly downward. A router stores no parent reference;
//! the caller performing an attach is the only party that knows the
//! relationship, and any upward-reaching collaborator is handed to the child
//! explicitly at build time (as a listener) rather than stored as a back
//! pointer. This is what keeps the tree free of reference cycles.
//!
//! # Concurrency
//! Attach, detach, load, activate and deactivate are expected to be
//! serialized on one logical owner. There is no internal locking; concurrent
//! mutation from multiple execution contexts is a precondition violation.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tokio::sync::watch;
use tracing::debug;

use crate::builder::{BuildChild, Capability, ChildBuilders};
use crate::helpers::scrub_type_name;
use crate::interactor::Interactable;
use crate::viewable::ViewControllable;

/// The lifecycle stages of a router scope.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RouterLifecycle {
    /// The router has been constructed but not yet loaded.
    Unloaded,
    /// The router finished loading. Fired at most once.
    DidLoad,
}

/// The answer a router gives when offered an externally dispatched event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PluginDisposition {
    /// Let the event propagate to descendants. The default for routers that
    /// install no interceptor, so an interceptor-free tree is a pure
    /// pass-through.
    Allow,
    /// The event was consumed here.
    Handled,
}

/// The object-safe contract every tree node satisfies.
///
/// Mutation methods carry the attach/detach contract: violating it (double
/// attach, detach of a non-attached child) is a wiring bug and panics rather
/// than returning a recoverable error.
pub trait Routing: 'static {
    /// The activation contract of the owned interactor.
    fn interactable(&self) -> &dyn Interactable;

    /// Loads the router. First call fires the did-load hook; later calls are
    /// no-ops. Invoked by the framework as part of attach.
    fn load(&self);

    /// Whether `load` has completed.
    fn is_loaded(&self) -> bool;

    /// A replay-latest stream of this router's lifecycle stage.
    fn lifecycle(&self) -> watch::Receiver<RouterLifecycle>;

    /// Attaches `child`, activating its interactor and then loading it.
    ///
    /// # Panics
    /// Panics if `child` is already attached here.
    fn attach_child(&self, child: Rc<dyn Routing>);

    /// Detaches `child`: removes it from the attached set, recursively
    /// detaches the child's own descendants (post-order, so no node is ever
    /// active while an ancestor has already deactivated), then deactivates
    /// the child's interactor.
    ///
    /// # Panics
    /// Panics if `child` is not currently attached here.
    fn detach_child(&self, child: &Rc<dyn Routing>);

    /// Detaches every attached child, last first.
    fn detach_all_children(&self);

    /// A snapshot of the currently attached children. The live set is
    /// exclusively owned and only ever mutated through attach/detach.
    fn children(&self) -> Vec<Rc<dyn Routing>>;

    /// The declared child builder matching `capability`, or `None` when that
    /// subtree is unavailable.
    fn get_child_builder(&self, capability: Capability) -> Option<Rc<dyn BuildChild>>;

    /// The capability this router itself provides, if any. Used by
    /// capability-based subtree lookup.
    fn provided_capability(&self) -> Option<Capability> {
        None
    }

    /// The opaque renderable handle this router carries, if any. Routers
    /// store and forward the handle but never inspect it.
    fn view_controllable(&self) -> Option<ViewControllable> {
        None
    }

    /// Offers an externally dispatched event to this router before its
    /// children see it. The default is [`PluginDisposition::Allow`].
    fn handle_plugin_point(&self, _data: &dyn Any) -> PluginDisposition {
        PluginDisposition::Allow
    }

    /// A short human-readable label for logging and diagnostics.
    fn type_label(&self) -> &str;
}

type DidLoadHook<I> = Box<dyn FnOnce(&Router<I>)>;
type PluginInterceptor = Box<dyn Fn(&dyn Any) -> PluginDisposition>;

/// The generic router runtime.
///
/// A router exclusively owns its interactor; the interactor holds no
/// reference back. Concrete units configure the router at construction time:
///
/// ```
/// use std::rc::Rc;
/// use unit_tree::{Interactor, InteractorLogic, Router, Routing};
///
/// struct HomeLogic;
/// impl InteractorLogic for HomeLogic {}
///
/// let router = Rc::new(
///     Router::new(Rc::new(Interactor::new(HomeLogic)))
///         .on_did_load(|_router| {
///             // attach immutable children here
///         }),
/// );
/// router.launch();
/// assert!(router.is_loaded());
/// ```
pub struct Router<I: Interactable + 'static> {
    interactor: Rc<I>,
    children: RefCell<Vec<Rc<dyn Routing>>>,
    child_builders: ChildBuilders,
    loaded: Cell<bool>,
    lifecycle: watch::Sender<RouterLifecycle>,
    did_load: RefCell<Option<DidLoadHook<I>>>,
    plugin_interceptor: Option<PluginInterceptor>,
    label: String,
}

impl<I: Interactable + 'static> Router<I> {
    /// Creates an unloaded router owning `interactor`, with no children
    /// declared.
    pub fn new(interactor: Rc<I>) -> Self {
        let (lifecycle, _) = watch::channel(RouterLifecycle::Unloaded);
        Self {
            interactor,
            children: RefCell::new(Vec::new()),
            child_builders: ChildBuilders::new(),
            loaded: Cell::new(false),
            lifecycle,
            did_load: RefCell::new(None),
            plugin_interceptor: None,
            label: scrub_type_name(std::any::type_name::<I>()),
        }
    }

    /// Hands this router the child builders its own builder declared.
    pub fn with_child_builders(mut self, child_builders: ChildBuilders) -> Self {
        self.child_builders = child_builders;
        self
    }

    /// Installs the one-shot hook fired when the router finishes loading.
    /// Typical use is attaching immutable children.
    pub fn on_did_load(self, hook: impl FnOnce(&Router<I>) + 'static) -> Self {
        *self.did_load.borrow_mut() = Some(Box::new(hook));
        self
    }

    /// Installs an interceptor for externally dispatched plugin-point events.
    pub fn with_plugin_interceptor(
        mut self,
        interceptor: impl Fn(&dyn Any) -> PluginDisposition + 'static,
    ) -> Self {
        self.plugin_interceptor = Some(Box::new(interceptor));
        self
    }

    /// The owned interactor, with its concrete type intact.
    pub fn interactor(&self) -> &Rc<I> {
        &self.interactor
    }

    /// Bootstraps this router as the root of a tree: activates its own
    /// interactor, then loads. Every other router in the tree is activated
    /// and loaded through [`Routing::attach_child`] instead.
    pub fn launch(&self) {
        debug!(router = %self.label, "launching root");
        self.interactor.activate();
        self.load_impl();
    }

    fn load_impl(&self) {
        if self.loaded.get() {
            return;
        }

        self.loaded.set(true);
        self.lifecycle.send_replace(RouterLifecycle::DidLoad);
        debug!(router = %self.label, "loaded");

        if let Some(hook) = self.did_load.borrow_mut().take() {
            hook(self);
        }
    }

    fn attach_child_impl(&self, child: Rc<dyn Routing>) {
        let already_attached = self
            .children
            .borrow()
            .iter()
            .any(|existing| Rc::ptr_eq(existing, &child));
        assert!(
            !already_attached,
            "attempt to attach child `{}` which is already attached to `{}`",
            child.type_label(),
            self.label,
        );

        self.children.borrow_mut().push(child.clone());
        debug!(parent = %self.label, child = %child.type_label(), "attached child");

        // Activate before loading: routers usually attach immutable children
        // in did-load, and those need an already-active parent scope.
        child.interactable().activate();
        child.load();
    }

    fn detach_child_impl(&self, child: &Rc<dyn Routing>) {
        let position = self
            .children
            .borrow()
            .iter()
            .position(|existing| Rc::ptr_eq(existing, child));
        let position = position.unwrap_or_else(|| {
            panic!(
                "attempt to detach child `{}` which is not attached to `{}`",
                child.type_label(),
                self.label,
            )
        });

        self.children.borrow_mut().remove(position);

        // Post-order teardown: the child's descendants deactivate strictly
        // before the child itself.
        child.detach_all_children();
        child.interactable().deactivate();
        debug!(parent = %self.label, child = %child.type_label(), "detached child");
    }

    fn detach_all_children_impl(&self) {
        loop {
            let next = self.children.borrow().last().cloned();
            match next {
                Some(child) => self.detach_child_impl(&child),
                None => break,
            }
        }
    }
}

impl<I: Interactable + 'static> Routing for Router<I> {
    fn interactable(&self) -> &dyn Interactable {
        &*self.interactor
    }

    fn load(&self) {
        self.load_impl();
    }

    fn is_loaded(&self) -> bool {
        self.loaded.get()
    }

    fn lifecycle(&self) -> watch::Receiver<RouterLifecycle> {
        self.lifecycle.subscribe()
    }

    fn attach_child(&self, child: Rc<dyn Routing>) {
        self.attach_child_impl(child);
    }

    fn detach_child(&self, child: &Rc<dyn Routing>) {
        self.detach_child_impl(child);
    }

    fn detach_all_children(&self) {
        self.detach_all_children_impl();
    }

    fn children(&self) -> Vec<Rc<dyn Routing>> {
        self.children.borrow().clone()
    }

    fn get_child_builder(&self, capability: Capability) -> Option<Rc<dyn BuildChild>> {
        self.child_builders.get(capability)
    }

    fn handle_plugin_point(&self, data: &dyn Any) -> PluginDisposition {
        match &self.plugin_interceptor {
            Some(interceptor) => interceptor(data),
            None => PluginDisposition::Allow,
        }
    }

    fn type_label(&self) -> &str {
        &self.label
    }
}

impl<I: Interactable + 'static> Drop for Router<I> {
    fn drop(&mut self) {
        self.detach_all_children_impl();
        self.interactor.deactivate();
        // The lifecycle sender drops with self, terminating subscribers.
    }
}
