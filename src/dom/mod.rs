//! In-process host platform.
//!
//! The render engine is built on top of a shadow-DOM style component model.
//! This module provides that model: a thread-local [`Document`], tree
//! mutation that fires custom element reactions, attribute and slot
//! observation, and event dispatch.
//!
//! All functions here release the document borrow before running any
//! callback, so callbacks are free to mutate the tree again.

pub mod document;
pub mod events;
pub mod registry;

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

pub use document::{Document, HostCapabilities, NodeId, NodeKind, SlotAssignments};
pub use events::{Event, EventKind, Listener, REFRESH};

use crate::error::{Error, Result};

/// Called with the element and the attribute name after a filtered attribute changes.
pub type AttributeCallback = Rc<dyn Fn(NodeId, &str)>;

/// Called with the host and the slot name after that slot's assignment changes.
pub type SlotCallback = Rc<dyn Fn(NodeId, &str)>;

thread_local! {
    static DOCUMENT: RefCell<Document> = RefCell::new(Document::default());
}

/// Access the document via a closure.
pub fn with_document<R>(f: impl FnOnce(&Document) -> R) -> R {
    DOCUMENT.with(|doc| f(&doc.borrow()))
}

/// Mutate the document via a closure. No reactions fire.
pub fn with_document_mut<R>(f: impl FnOnce(&mut Document) -> R) -> R {
    DOCUMENT.with(|doc| f(&mut doc.borrow_mut()))
}

/// Replace this thread's document, e.g. with one lacking some capabilities.
pub fn install(document: Document) {
    DOCUMENT.with(|doc| *doc.borrow_mut() = document);
}

pub fn root() -> NodeId {
    with_document(|doc| doc.root())
}

pub fn capabilities() -> HostCapabilities {
    with_document(|doc| doc.capabilities())
}

/// Create an element, running its custom element constructor if the tag is defined.
pub fn create_element(tag: &str) -> Result<NodeId> {
    let node = with_document_mut(|doc| doc.create_element(tag));
    registry::upgrade(node)?;
    Ok(node)
}

pub fn create_text(text: &str) -> NodeId {
    with_document_mut(|doc| doc.create_text(text))
}

pub fn attach_shadow(host: NodeId) -> Result<NodeId> {
    with_document_mut(|doc| doc.attach_shadow(host))
}

pub fn append_child(parent: NodeId, child: NodeId) -> Result<()> {
    insert_before(parent, child, None)
}

/// Insert `child` under `parent`. A child that already has a parent is
/// removed first, so a move is a disconnect followed by a connect.
pub fn insert_before(parent: NodeId, child: NodeId, reference: Option<NodeId>) -> Result<()> {
    if with_document(|doc| doc.parent(child)).is_some() {
        remove(child)?;
    }

    let watched = SlotWatch::begin(parent);
    let connected = with_document_mut(|doc| {
        doc.link(parent, child, reference)?;
        Ok::<_, Error>(if doc.is_connected(child) {
            doc.upgraded_elements_in(child)
        } else {
            Vec::new()
        })
    })?;
    watched.finish();

    registry::connected(&connected);
    Ok(())
}

pub fn remove(node: NodeId) -> Result<()> {
    let parent = with_document(|doc| doc.parent(node)).ok_or(Error::Hierarchy("node has no parent"))?;
    let disconnected = with_document(|doc| {
        if doc.is_connected(node) {
            doc.upgraded_elements_in(node)
        } else {
            Vec::new()
        }
    });

    let watched = SlotWatch::begin(parent);
    with_document_mut(|doc| doc.unlink(node))?;
    watched.finish();

    registry::disconnected(&disconnected);
    Ok(())
}

/// Free a parentless subtree and run `destroyed` reactions for its custom elements.
pub fn dispose(node: NodeId) -> Result<()> {
    let destroyed = with_document_mut(|doc| {
        let tags: Vec<(NodeId, String)> = doc
            .upgraded_elements_in(node)
            .into_iter()
            .filter_map(|id| doc.tag(id).map(|tag| (id, tag.to_string())))
            .collect();
        doc.free_subtree(node)?;
        Ok::<_, Error>(tags)
    })?;
    registry::destroyed(&destroyed);
    Ok(())
}

pub fn set_attribute(node: NodeId, name: &str, value: &str) -> Result<()> {
    change_attribute(node, name, Some(value))
}

pub fn remove_attribute(node: NodeId, name: &str) -> Result<()> {
    change_attribute(node, name, None)
}

fn change_attribute(node: NodeId, name: &str, value: Option<&str>) -> Result<()> {
    let name = name.to_ascii_lowercase();
    let name = name.as_str();
    let watched = match name {
        "slot" => with_document(|doc| doc.parent(node)).map(SlotWatch::begin),
        "name" if with_document(|doc| doc.is_slot(node)) => Some(SlotWatch::begin(node)),
        _ => None,
    };
    with_document_mut(|doc| doc.set_attribute(node, name, value))?;
    if let Some(watched) = watched {
        watched.finish();
    }

    let observers = with_document(|doc| {
        if doc.capabilities().contains(HostCapabilities::ATTRIBUTE_OBSERVER) {
            doc.attribute_observers(node, name)
        } else {
            Vec::new()
        }
    });
    for observer in observers {
        observer(node, name);
    }
    Ok(())
}

pub fn attribute(node: NodeId, name: &str) -> Option<String> {
    with_document(|doc| doc.attribute(node, name).map(str::to_string))
}

pub fn set_text(node: NodeId, text: &str) -> Result<()> {
    with_document_mut(|doc| doc.set_text(node, text))
}

pub fn text_content(node: NodeId) -> String {
    with_document(|doc| doc.text_content(node))
}

pub fn is_connected(node: NodeId) -> bool {
    with_document(|doc| doc.is_connected(node))
}

pub fn parent(node: NodeId) -> Option<NodeId> {
    with_document(|doc| doc.parent(node))
}

pub fn children(node: NodeId) -> Vec<NodeId> {
    with_document(|doc| doc.children(node).to_vec())
}

pub fn shadow_root(node: NodeId) -> Option<NodeId> {
    with_document(|doc| doc.shadow_root(node))
}

pub fn assigned_slot(node: NodeId) -> Option<NodeId> {
    with_document(|doc| doc.assigned_slot(node))
}

pub fn assigned_nodes(slot: NodeId) -> Vec<NodeId> {
    with_document(|doc| doc.assigned_nodes(slot))
}

/// Observe changes to the named attributes of `node`.
pub fn observe_attributes(node: NodeId, names: Vec<String>, callback: AttributeCallback) {
    with_document_mut(|doc| doc.add_attribute_observer(node, names, callback));
}

/// Observe slot assignment changes of a shadow host.
pub fn observe_slots(host: NodeId, callback: SlotCallback) {
    with_document_mut(|doc| doc.add_slot_observer(host, callback));
}

pub fn listen(node: NodeId, event: &str, listener: impl Fn(&Event) + 'static) {
    with_document_mut(|doc| doc.add_listener(node, event, Rc::new(listener)));
}

/// Dispatch an event at `target` along its propagation path.
pub fn dispatch(target: NodeId, kind: EventKind) {
    let deliveries: Vec<(NodeId, Listener)> = with_document(|doc| {
        let path = if kind.bubbles {
            doc.event_path(target, kind.composed)
        } else {
            vec![target]
        };
        path.into_iter()
            .flat_map(|node| {
                doc.listeners(node, kind.name)
                    .into_iter()
                    .map(move |listener| (node, listener))
            })
            .collect()
    });
    for (current_target, listener) in deliveries {
        listener(&Event {
            kind,
            target,
            current_target,
        });
    }
}

/// Snapshot of the slot assignments a mutation may change, compared after
/// the mutation to notify slot observers.
struct SlotWatch {
    snapshots: Vec<(NodeId, SlotAssignments)>,
}

impl SlotWatch {
    /// Watch `node` as a host, and the host whose shadow tree contains `node`.
    fn begin(node: NodeId) -> Self {
        let snapshots = with_document(|doc| {
            let mut hosts = Vec::new();
            if doc.shadow_root(node).is_some() {
                hosts.push(node);
            }
            if let Some(host) = doc.host(doc.tree_root(node)) {
                hosts.push(host);
            }
            hosts
                .into_iter()
                .map(|host| (host, doc.slot_assignments(host)))
                .collect()
        });
        Self { snapshots }
    }

    fn finish(self) {
        for (host, before) in self.snapshots {
            let (after, observers) =
                with_document(|doc| (doc.slot_assignments(host), doc.slot_observers(host)));
            if observers.is_empty() {
                continue;
            }
            let changed: BTreeSet<&String> = before
                .keys()
                .chain(after.keys())
                .filter(|name| before.get(*name) != after.get(*name))
                .collect();
            for name in changed {
                for observer in &observers {
                    observer(host, name);
                }
            }
        }
    }
}
