//! # Viewable Routers
//!
//! A `ViewableRouter` is a router that carries an opaque renderable handle
//! and advertises a [`Capability`] the rest of the tree can look up. It can
//! search its attached subtree for a descendant providing a requested
//! capability, or build-and-attach one through the matching child builder.
//!
//! The renderable handle is a boundary collaborator: the tree stores and
//! forwards it, but never inspects it. Concrete rendering belongs to the
//! host, not to this runtime.

use std::any::Any;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use tokio::sync::watch;
use tracing::debug;

use crate::builder::{BuildChild, Capability};
use crate::interactor::Interactable;
use crate::router::{PluginDisposition, Router, RouterLifecycle, Routing};

/// An opaque renderable handle.
///
/// Cloning is cheap and every clone refers to the same underlying surface.
#[derive(Clone)]
pub struct ViewControllable {
    surface: Rc<dyn Any>,
}

impl ViewControllable {
    /// Wraps a host-owned surface.
    pub fn new<V: 'static>(surface: V) -> Self {
        Self {
            surface: Rc::new(surface),
        }
    }

    /// The raw handle, forwarded to host code that knows the concrete type.
    pub fn raw(&self) -> &Rc<dyn Any> {
        &self.surface
    }

    /// Whether two handles refer to the same surface.
    pub fn same_surface(&self, other: &ViewControllable) -> bool {
        Rc::ptr_eq(&self.surface, &other.surface)
    }
}

impl fmt::Debug for ViewControllable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ViewControllable")
    }
}

/// A router that owns a renderable handle and provides a capability.
///
/// Dereferences to the wrapped [`Router`] for construction-time
/// configuration; all tree behavior goes through [`Routing`].
pub struct ViewableRouter<I: Interactable + 'static> {
    router: Router<I>,
    view: ViewControllable,
    capability: Capability,
}

impl<I: Interactable + 'static> ViewableRouter<I> {
    /// Wraps `router`, binding the renderable handle and the capability this
    /// unit provides.
    pub fn new(router: Router<I>, view: ViewControllable, capability: Capability) -> Self {
        Self {
            router,
            view,
            capability,
        }
    }

    /// The renderable handle this router carries.
    pub fn view(&self) -> &ViewControllable {
        &self.view
    }

    /// Returns an attached descendant providing `capability`, if the subtree
    /// already contains one. First match in an unordered traversal; does not
    /// construct anything.
    pub fn find_viewable_router(&self, capability: Capability) -> Option<Rc<dyn Routing>> {
        find_viewable_descendant(&self.router, capability)
    }

    /// Returns an attached descendant providing `capability`, building one
    /// through the matching child builder (and attaching it) when the
    /// subtree has none. Returns `None` only when no child builder declares
    /// the capability either: that subtree is unavailable.
    pub fn find_or_create_viewable_router(
        &self,
        capability: Capability,
    ) -> Option<Rc<dyn Routing>> {
        if let Some(existing) = self.find_viewable_router(capability) {
            return Some(existing);
        }

        let builder = self.router.get_child_builder(capability)?;
        let child = builder.build_child();
        debug!(parent = %self.router.type_label(), %capability, "built viewable descendant");
        self.router.attach_child(child.clone());
        Some(child)
    }
}

/// Depth-first search of the attached subtree below `node` for a viewable
/// router providing `capability`.
pub(crate) fn find_viewable_descendant(
    node: &dyn Routing,
    capability: Capability,
) -> Option<Rc<dyn Routing>> {
    for child in node.children() {
        if child.provided_capability() == Some(capability) && child.view_controllable().is_some() {
            return Some(child);
        }
        if let Some(found) = find_viewable_descendant(child.as_ref(), capability) {
            return Some(found);
        }
    }
    None
}

impl<I: Interactable + 'static> Deref for ViewableRouter<I> {
    type Target = Router<I>;

    fn deref(&self) -> &Router<I> {
        &self.router
    }
}

impl<I: Interactable + 'static> Routing for ViewableRouter<I> {
    fn interactable(&self) -> &dyn Interactable {
        self.router.interactable()
    }

    fn load(&self) {
        self.router.load();
    }

    fn is_loaded(&self) -> bool {
        self.router.is_loaded()
    }

    fn lifecycle(&self) -> watch::Receiver<RouterLifecycle> {
        self.router.lifecycle()
    }

    fn attach_child(&self, child: Rc<dyn Routing>) {
        self.router.attach_child(child);
    }

    fn detach_child(&self, child: &Rc<dyn Routing>) {
        self.router.detach_child(child);
    }

    fn detach_all_children(&self) {
        self.router.detach_all_children();
    }

    fn children(&self) -> Vec<Rc<dyn Routing>> {
        self.router.children()
    }

    fn get_child_builder(&self, capability: Capability) -> Option<Rc<dyn BuildChild>> {
        self.router.get_child_builder(capability)
    }

    fn provided_capability(&self) -> Option<Capability> {
        Some(self.capability)
    }

    fn view_controllable(&self) -> Option<ViewControllable> {
        Some(self.view.clone())
    }

    fn handle_plugin_point(&self, data: &dyn Any) -> PluginDisposition {
        self.router.handle_plugin_point(data)
    }

    fn type_label(&self) -> &str {
        self.router.type_label()
    }
}
