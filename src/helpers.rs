//! # Child Resolution & Tree Helpers
//!
//! Stateless conveniences layered over routers and builders: resolve a child
//! builder by capability, build-and-attach in one step, dispatch an external
//! plugin-point event through a subtree, and format a subtree for
//! diagnostics. None of these carry state of their own.

use std::any::Any;
use std::rc::Rc;

use tracing::debug;

use crate::builder::{BuildChild, Capability};
use crate::interactor::InteractorScope;
use crate::router::{PluginDisposition, Routing};

/// The declared child builder of `router` matching `capability`, or `None`
/// when that subtree is unavailable.
pub fn resolve_child_builder(
    router: &dyn Routing,
    capability: Capability,
) -> Option<Rc<dyn BuildChild>> {
    router.get_child_builder(capability)
}

/// Builds the child of `router` matching `capability` without attaching it.
pub fn build_child(router: &dyn Routing, capability: Capability) -> Option<Rc<dyn Routing>> {
    Some(resolve_child_builder(router, capability)?.build_child())
}

/// Builds the child of `router` matching `capability`, attaches it, and
/// returns it.
pub fn build_and_attach_child(
    router: &dyn Routing,
    capability: Capability,
) -> Option<Rc<dyn Routing>> {
    let child = build_child(router, capability)?;
    router.attach_child(child.clone());
    Some(child)
}

/// How plugin-point interceptors across a subtree compose.
///
/// The source contract only fixes that an ancestor sees an event before its
/// descendants and that the interceptor-free default is pass-through;
/// composition across multiple interceptors is left to the dispatcher, so
/// callers pick a policy explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PluginPolicy {
    /// Stop at the first router that handles the event.
    FirstWins,
    /// Offer the event to every router; report `Handled` if any did.
    AllRun,
}

/// Offers `data` to `root` and its attached descendants, pre-order, under
/// the given composition policy.
pub fn dispatch_plugin_event(
    root: &dyn Routing,
    data: &dyn Any,
    policy: PluginPolicy,
) -> PluginDisposition {
    let mut handled = false;
    dispatch_inner(root, data, policy, &mut handled);
    if handled {
        PluginDisposition::Handled
    } else {
        PluginDisposition::Allow
    }
}

fn dispatch_inner(node: &dyn Routing, data: &dyn Any, policy: PluginPolicy, handled: &mut bool) {
    if node.handle_plugin_point(data) == PluginDisposition::Handled {
        debug!(router = %node.type_label(), "plugin point handled event");
        *handled = true;
        if policy == PluginPolicy::FirstWins {
            return;
        }
    }

    for child in node.children() {
        if *handled && policy == PluginPolicy::FirstWins {
            return;
        }
        dispatch_inner(child.as_ref(), data, policy, handled);
    }
}

/// Formats the attached subtree below (and including) `root`, one node per
/// line, children indented under their parent. Activation state is marked so
/// a dump doubles as a propagation check.
pub fn format_subtree(root: &dyn Routing) -> String {
    let mut out = String::new();
    format_node(root, 0, &mut out);
    out
}

fn format_node(node: &dyn Routing, depth: usize, out: &mut String) {
    for _ in 0..depth {
        out.push_str("  ");
    }
    out.push_str(node.type_label());
    out.push_str(if node.interactable().is_active() {
        " [active]"
    } else {
        " [inactive]"
    });
    out.push('\n');

    for child in node.children() {
        format_node(child.as_ref(), depth + 1, out);
    }
}

/// Strips module paths (including inside generic parameters) from a type
/// name, for log labels: `a::b::Router<a::c::Interactor<d::Home>>` becomes
/// `Router<Interactor<Home>>`.
pub(crate) fn scrub_type_name(full: &str) -> String {
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        match ch {
            ':' => segment.clear(),
            '<' | '>' | ',' | ' ' | '(' | ')' | '&' => {
                out.push_str(&segment);
                segment.clear();
                out.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    out.push_str(&segment);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::ChildBuilders;
    use crate::interactor::Interactor;
    use crate::mock::{LifecycleProbe, ProbeLogic};
    use crate::router::Router;

    const PANEL: Capability = Capability::named("panel");

    fn root_with_panel_child(probe: &LifecycleProbe) -> Rc<Router<Interactor<ProbeLogic>>> {
        let child_probe = probe.clone();
        let builders = ChildBuilders::new().declare_fn(PANEL, move || {
            Rc::new(Router::new(Rc::new(Interactor::new(ProbeLogic::new(
                "panel",
                &child_probe,
            )))))
        });
        Rc::new(
            Router::new(Rc::new(Interactor::new(ProbeLogic::new("root", probe))))
                .with_child_builders(builders),
        )
    }

    #[test]
    fn scrub_type_name_drops_module_paths_everywhere() {
        assert_eq!(
            scrub_type_name("a::b::Router<a::c::Interactor<d::Home>>"),
            "Router<Interactor<Home>>"
        );
        assert_eq!(scrub_type_name("Plain"), "Plain");
    }

    #[test]
    fn build_and_attach_resolves_declared_capabilities() {
        let probe = LifecycleProbe::default();
        let root = root_with_panel_child(&probe);
        root.launch();

        let child = build_and_attach_child(root.as_ref(), PANEL).unwrap();
        assert!(child.interactable().is_active());
        assert_eq!(root.children().len(), 1);
    }

    #[test]
    fn unavailable_capability_resolves_to_none() {
        let probe = LifecycleProbe::default();
        let root = root_with_panel_child(&probe);
        root.launch();

        assert!(build_child(root.as_ref(), Capability::named("missing")).is_none());
        assert!(root.children().is_empty());
    }

    #[test]
    fn subtree_dump_reflects_activation() {
        let probe = LifecycleProbe::default();
        let root = root_with_panel_child(&probe);
        root.launch();
        build_and_attach_child(root.as_ref(), PANEL).unwrap();

        let dump = format_subtree(root.as_ref());
        let mut lines = dump.lines();
        assert!(lines.next().unwrap().ends_with("[active]"));
        let child_line = lines.next().unwrap();
        assert!(child_line.starts_with("  "));
        assert!(child_line.ends_with("[active]"));
    }
}
