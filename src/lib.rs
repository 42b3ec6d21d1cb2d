//! # Unit Tree: a hierarchical component-lifecycle runtime
//!
//! This crate provides the scaffolding for applications organized as a tree
//! of *units*. Each unit couples a [`Router`] (its position in the tree), an
//! [`Interactor`] (its behavior and activation state), an optional
//! renderable handle, and a dependency-injection [`Component`]. Builders
//! assemble units; attaching a built unit's router under a parent is what
//! switches its interactor on, and detaching is what switches it off.
//!
//! # Design Philosophy
//!
//! - **Lifecycle is driven by structure.** No unit manages its own
//!   activation. A unit is active exactly when its router is reachable from
//!   a launched root, and the framework flips activation as part of
//!   attach/detach. Business logic only reacts, through the
//!   [`InteractorLogic`] hooks.
//! - **Ownership flows downward.** Routers own interactors and children;
//!   nothing in the tree holds a parent reference. Upward communication is a
//!   listener handed to the child at build time.
//! - **Generics: The Power of `T`.** The runtime types are generic over the
//!   user's logic ([`Router<I>`], [`Interactor<L>`],
//!   [`ComponentizedBuilder<T>`]), so concrete units get full static typing
//!   while the tree itself works through the object-safe [`Routing`] trait.
//!
//! # Module Tour
//!
//! | Module | Provides |
//! |--------|----------|
//! | [`router`] | [`Router`], [`Routing`], attach/detach mechanics |
//! | [`interactor`] | [`Interactor`], activation hooks and streams |
//! | [`builder`] | [`Buildable`], [`Capability`], child builder tables |
//! | [`component`] | [`Component`], keyed shared-instance DI cache |
//! | [`componentized`] | Builders pairing each build with a fresh component |
//! | [`multistage`] | Builders whose component spans one build pass |
//! | [`viewable`] | [`ViewableRouter`], capability-based subtree lookup |
//! | [`helpers`] | Build-and-attach shortcuts, plugin dispatch, tree dumps |
//! | [`mock`] | Lifecycle probes for tests |
//!
//! # Concurrency Model
//!
//! The tree is single-threaded and cooperative: all mutation happens on one
//! logical owner, so the runtime uses `Rc`/`RefCell` and no locks.
//! Activation and lifecycle streams are `tokio::sync::watch` channels: a
//! fresh subscriber immediately observes the latest state, and the stream
//! terminates when its unit is dropped.
//!
//! # Quick Start
//!
//! ```
//! use std::rc::Rc;
//! use unit_tree::{Interactor, InteractorLogic, InteractorScope, Router, Routing};
//!
//! struct RootLogic;
//! impl InteractorLogic for RootLogic {}
//!
//! struct PanelLogic;
//! impl InteractorLogic for PanelLogic {}
//!
//! let root = Rc::new(Router::new(Rc::new(Interactor::new(RootLogic))));
//! root.launch();
//!
//! let panel = Rc::new(Router::new(Rc::new(Interactor::new(PanelLogic))));
//! let as_dyn: Rc<dyn Routing> = panel.clone();
//! root.attach_child(as_dyn.clone());
//! assert!(panel.interactor().is_active());
//!
//! root.detach_child(&as_dyn);
//! assert!(!panel.interactor().is_active());
//! ```

pub mod builder;
pub mod component;
pub mod componentized;
pub mod helpers;
pub mod interactor;
pub mod mock;
pub mod multistage;
pub mod router;
pub mod telemetry;
pub mod viewable;

pub use builder::{BuildChild, Buildable, Capability, ChildBuilders};
pub use component::{Component, EmptyComponent, EmptyDependency};
pub use componentized::{AsyncBuildable, ComponentBuildable, ComponentizedBuilder};
pub use helpers::{
    build_and_attach_child, build_child, dispatch_plugin_event, format_subtree, PluginPolicy,
    resolve_child_builder,
};
pub use interactor::{
    wait_for_activation, wait_for_deactivation, Interactable, Interactor, InteractorLogic,
    InteractorScope, LifecycleError, PresentableInteractor,
};
pub use multistage::{MultiStageBuildable, MultiStageComponentizedBuilder};
pub use router::{PluginDisposition, Router, RouterLifecycle, Routing};
pub use viewable::{ViewControllable, ViewableRouter};
