use std::cell::Cell;
use std::rc::Rc;

use super::definition::Definition;
use super::{with_instance, with_instances_mut, wiring, Component};
use crate::dom::registry::{self, ElementDefinition};
use crate::dom::{self, NodeId};
use crate::engine::{lifecycle, queue};
use crate::error::{Error, Result};

thread_local! {
    static WARNED_UNSUPPORTED: Cell<bool> = const { Cell::new(false) };
}

/// Whether the host offers everything components need.
pub fn is_supported() -> bool {
    dom::capabilities().is_all()
}

/// Handle to the shadow root a component renders into.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadowRoot {
    id: NodeId,
    host: NodeId,
}

impl ShadowRoot {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn append(&self, child: NodeId) -> Result<()> {
        dom::append_child(self.id, child)
    }
}

/// Requests a refresh of one component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scheduler {
    host: NodeId,
}

impl Scheduler {
    /// Queue the component for the next frame. Does nothing while it is detached.
    pub fn schedule(&self) {
        lifecycle::request_refresh(self.host);
    }

    pub fn host(&self) -> NodeId {
        self.host
    }
}

/// A defined component, used to create instances.
#[derive(Clone, Debug)]
pub struct ComponentType {
    name: Rc<str>,
    inert: bool,
}

impl ComponentType {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when the host lacked required capabilities and instances are plain elements.
    pub fn is_inert(&self) -> bool {
        self.inert
    }

    pub fn create(&self) -> Result<NodeId> {
        dom::create_element(&self.name)
    }
}

/// Define a component type under `name`.
///
/// `initializer` runs once per instance with the instance's shadow root and a
/// [`Scheduler`], and returns the instance's [`Definition`]. Each instance's
/// state is whatever its refresh function last returned.
pub fn define<S, F>(name: &str, initializer: F) -> Result<ComponentType>
where
    S: 'static,
    F: Fn(ShadowRoot, Scheduler) -> Result<Definition<S>> + 'static,
{
    if !registry::is_valid_name(name) {
        return Err(Error::InvalidName(name.to_string()));
    }
    let name: Rc<str> = Rc::from(name);

    if !is_supported() {
        warn_unsupported();
        registry::define_element(&name, inert_definition())?;
        return Ok(ComponentType { name, inert: true });
    }

    let constructed = name.clone();
    registry::define_element(
        &name,
        ElementDefinition {
            constructor: Box::new(move |host| construct(&constructed, &initializer, host)),
            connected: Box::new(lifecycle::connected),
            disconnected: Box::new(lifecycle::disconnected),
            destroyed: Box::new(forget),
        },
    )?;
    log::debug!("defined component <{}>", name);
    Ok(ComponentType { name, inert: false })
}

fn construct<S, F>(name: &Rc<str>, initializer: &F, host: NodeId) -> Result<()>
where
    S: 'static,
    F: Fn(ShadowRoot, Scheduler) -> Result<Definition<S>>,
{
    let shadow = dom::attach_shadow(host)?;
    // The record exists while the initializer runs; mutations stay unset until wiring.
    with_instances_mut(|instances| instances.insert(host, Component::new(name.clone(), shadow)));

    let result = initializer(ShadowRoot { id: shadow, host }, Scheduler { host })
        .and_then(|definition| wiring::install(name, host, definition));
    if let Err(err) = result {
        with_instances_mut(|instances| instances.remove(&host));
        log::error!("failed to construct <{}>: {}", name, err);
        return Err(err);
    }
    Ok(())
}

fn forget(host: NodeId) {
    if let Some(name) = with_instance(host, |c| c.name.clone()) {
        log::trace!("dropping <{}> {:?}", name, host);
    }
    queue::dequeue(host);
    with_instances_mut(|instances| instances.remove(&host));
}

fn inert_definition() -> ElementDefinition {
    ElementDefinition {
        constructor: Box::new(|_| Ok(())),
        connected: Box::new(|_| {}),
        disconnected: Box::new(|_| {}),
        destroyed: Box::new(|_| {}),
    }
}

fn warn_unsupported() {
    if !WARNED_UNSUPPORTED.with(|warned| warned.replace(true)) {
        log::warn!(
            "host lacks {:?}; components will be plain elements",
            !dom::capabilities()
        );
    }
}
