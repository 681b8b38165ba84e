//! Component definitions and per-instance records.
//!
//! A component is an upgraded custom element with a shadow root, a refresh
//! function and optional mutations, option handlers and slot handlers. The
//! engine keeps one record per instance, keyed by the host element's
//! [`NodeId`].

pub mod define;
pub mod definition;
pub mod mutations;
mod wiring;

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub use define::{define, is_supported, ComponentType, Scheduler, ShadowRoot};
pub use definition::{Definition, MutationFn, OptionHandler, SlotHandler};
pub use mutations::{mutations, Mutations};

use crate::dom::NodeId;
use crate::engine::{RenderToken, StateReader};
use crate::error::Result;

pub(crate) type RefreshFn = Box<dyn FnMut(&StateReader) -> Result<Rc<dyn Any>>>;

/// Last refresh result. `Empty` until a refresh completes while attached.
pub(crate) enum StoredState {
    Empty,
    Ready(Rc<dyn Any>),
}

impl StoredState {
    pub(crate) fn value(&self) -> Option<Rc<dyn Any>> {
        match self {
            StoredState::Empty => None,
            StoredState::Ready(value) => Some(value.clone()),
        }
    }
}

pub(crate) struct Component {
    pub(crate) name: Rc<str>,
    pub(crate) shadow_root: NodeId,
    pub(crate) attached: bool,
    pub(crate) render_id: Option<RenderToken>,
    /// Taken out while the refresh runs
    pub(crate) refresh: Option<RefreshFn>,
    /// `None` until construction completes
    pub(crate) mutations: Option<Rc<Mutations>>,
    pub(crate) state: StoredState,
}

impl Component {
    pub(crate) fn new(name: Rc<str>, shadow_root: NodeId) -> Self {
        Self {
            name,
            shadow_root,
            attached: false,
            render_id: None,
            refresh: None,
            mutations: None,
            state: StoredState::Empty,
        }
    }
}

pub(crate) type Instances = HashMap<NodeId, Component>;

thread_local! {
    static INSTANCES: RefCell<Instances> = RefCell::new(HashMap::new());
}

pub(crate) fn with_instances<R>(f: impl FnOnce(&Instances) -> R) -> R {
    INSTANCES.with(|instances| f(&instances.borrow()))
}

pub(crate) fn with_instances_mut<R>(f: impl FnOnce(&mut Instances) -> R) -> R {
    INSTANCES.with(|instances| f(&mut instances.borrow_mut()))
}

pub(crate) fn with_instance<R>(id: NodeId, f: impl FnOnce(&Component) -> R) -> Option<R> {
    with_instances(|instances| instances.get(&id).map(f))
}

pub(crate) fn with_instance_mut<R>(id: NodeId, f: impl FnOnce(&mut Component) -> R) -> Option<R> {
    with_instances_mut(|instances| instances.get_mut(&id).map(f))
}

/// Whether `node` is a component instance of this engine.
pub fn is_component(node: NodeId) -> bool {
    with_instances(|instances| instances.contains_key(&node))
}

/// Whether `node` is a component that is live in the tree and eligible to render.
pub fn is_attached(node: NodeId) -> bool {
    with_instance(node, |c| c.attached).unwrap_or(false)
}

/// Whether `node` has completed a refresh since it was last attached.
pub fn has_rendered(node: NodeId) -> bool {
    with_instance(node, |c| matches!(c.state, StoredState::Ready(_))).unwrap_or(false)
}

pub fn component_name(node: NodeId) -> Option<String> {
    with_instance(node, |c| c.name.to_string())
}
