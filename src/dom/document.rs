//! Arena-based host document.
//!
//! The Document stores every node of the host tree in a single arena indexed
//! by generational [`NodeId`]s. It models the parts of a shadow-DOM host the
//! render engine relies on:
//!
//! - **Shadow roots**: an element may own one shadow root. The shadow root has
//!   no parent; it only knows its host.
//!
//! - **Slots**: elements tagged `slot` are insertion points. A light child of a
//!   shadow host is assigned to the first slot in the host's shadow tree whose
//!   `name` attribute matches the child's `slot` attribute.
//!
//! - **Connectivity**: a node is connected when walking parents (and shadow
//!   hosts) reaches the document root.
//!
//! The Document itself never runs user callbacks. Observers and listeners are
//! stored here but invoked by the free functions in [`crate::dom`] after the
//! document borrow has been released.

use std::collections::{BTreeMap, HashMap};

use bitflags::bitflags;

use super::events::Listener;
use super::{AttributeCallback, SlotCallback};
use crate::error::{Error, Result};

bitflags! {
    /// Host features the render engine depends on.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct HostCapabilities: u8 {
        /// Elements can own an encapsulated shadow root
        const SHADOW_DOM        = 0b00001;
        /// `<slot>` elements project light children into shadow trees
        const SLOTS             = 0b00010;
        /// Attribute changes can be observed
        const ATTRIBUTE_OBSERVER = 0b00100;
        /// The host can drive a per-frame callback
        const ANIMATION_FRAME   = 0b01000;
        /// Tag names can be bound to element constructors
        const CUSTOM_ELEMENTS   = 0b10000;
    }
}

/// Unique identifier for a node in the document.
///
/// Uses a generational index design:
/// - `index`: Position in the arena (reusable after disposal)
/// - `generation`: Version counter that increments when a slot is reused
///
/// A stale ID never resolves to the node that later reuses its slot.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

/// The public classification of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Element,
    ShadowRoot,
    Text,
}

enum NodeData {
    Document,
    Element {
        tag: String,
        attributes: BTreeMap<String, String>,
        shadow_root: Option<NodeId>,
        upgraded: bool,
    },
    ShadowRoot {
        host: NodeId,
    },
    Text(String),
}

struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Node {
    fn new(data: NodeData) -> Self {
        Self {
            data,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// Arena slot. The generation survives disposal so reused slots get a new one.
struct Entry {
    generation: u32,
    node: Option<Node>,
}

/// Slot name → nodes assigned to it, for one shadow host.
pub type SlotAssignments = BTreeMap<String, Vec<NodeId>>;

pub struct Document {
    entries: Vec<Entry>,
    free_indices: Vec<u32>,
    root: NodeId,
    capabilities: HostCapabilities,
    attribute_observers: HashMap<NodeId, Vec<(Vec<String>, AttributeCallback)>>,
    slot_observers: HashMap<NodeId, Vec<SlotCallback>>,
    listeners: HashMap<NodeId, Vec<(String, Listener)>>,
}

impl Document {
    /// Create an empty document with the given host capabilities.
    pub fn new(capabilities: HostCapabilities) -> Self {
        let mut document = Self {
            entries: Vec::new(),
            free_indices: Vec::new(),
            root: NodeId::new(0, 0),
            capabilities,
            attribute_observers: HashMap::new(),
            slot_observers: HashMap::new(),
            listeners: HashMap::new(),
        };
        document.root = document.allocate(NodeData::Document);
        document
    }

    fn allocate(&mut self, data: NodeData) -> NodeId {
        if let Some(index) = self.free_indices.pop() {
            let entry = &mut self.entries[index as usize];
            entry.generation = entry.generation.wrapping_add(1);
            entry.node = Some(Node::new(data));
            NodeId::new(index, entry.generation)
        } else {
            let index = self.entries.len() as u32;
            self.entries.push(Entry {
                generation: 0,
                node: Some(Node::new(data)),
            });
            NodeId::new(index, 0)
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node> {
        self.entries
            .get(id.index as usize)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.node.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.entries
            .get_mut(id.index as usize)
            .filter(|e| e.generation == id.generation)
            .and_then(|e| e.node.as_mut())
    }

    fn existing(&self, id: NodeId) -> Result<&Node> {
        self.node(id).ok_or(Error::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn capabilities(&self) -> HostCapabilities {
        self.capabilities
    }

    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.allocate(NodeData::Element {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            shadow_root: None,
            upgraded: false,
        })
    }

    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.allocate(NodeData::Text(text.to_string()))
    }

    /// Give `host` an encapsulated shadow root.
    pub fn attach_shadow(&mut self, host: NodeId) -> Result<NodeId> {
        match self.existing(host)?.data {
            NodeData::Element {
                shadow_root: None, ..
            } => {}
            NodeData::Element { .. } => {
                return Err(Error::Hierarchy("element already has a shadow root"));
            }
            _ => return Err(Error::Hierarchy("only elements can host a shadow root")),
        }
        let shadow = self.allocate(NodeData::ShadowRoot { host });
        if let Some(Node {
            data: NodeData::Element { shadow_root, .. },
            ..
        }) = self.node_mut(host)
        {
            *shadow_root = Some(shadow);
        }
        Ok(shadow)
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.node(id).map(|n| match n.data {
            NodeData::Document => NodeKind::Document,
            NodeData::Element { .. } => NodeKind::Element,
            NodeData::ShadowRoot { .. } => NodeKind::ShadowRoot,
            NodeData::Text(_) => NodeKind::Text,
        })
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        self.kind(id) == Some(NodeKind::Element)
    }

    pub fn is_slot(&self, id: NodeId) -> bool {
        self.tag(id) == Some("slot")
    }

    pub fn shadow_root(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id)?.data {
            NodeData::Element { shadow_root, .. } => shadow_root,
            _ => None,
        }
    }

    /// The host of a shadow root.
    pub fn host(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id)?.data {
            NodeData::ShadowRoot { host } => Some(host),
            _ => None,
        }
    }

    pub fn is_upgraded(&self, id: NodeId) -> bool {
        matches!(
            self.node(id).map(|n| &n.data),
            Some(NodeData::Element { upgraded: true, .. })
        )
    }

    pub(crate) fn set_upgraded(&mut self, id: NodeId) {
        if let Some(Node {
            data: NodeData::Element { upgraded, .. },
            ..
        }) = self.node_mut(id)
        {
            *upgraded = true;
        }
    }

    /// The plain parent pointer. Shadow roots have none.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id)?.parent
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn element_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Element { attributes, .. } => attributes
                .get(name.to_ascii_lowercase().as_str())
                .map(String::as_str),
            _ => None,
        }
    }

    /// Set or clear an attribute. Names are ASCII case-insensitive and stored
    /// lowercase. Returns the previous value.
    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: Option<&str>,
    ) -> Result<Option<String>> {
        match self.node_mut(id).map(|n| &mut n.data) {
            Some(NodeData::Element { attributes, .. }) => {
                let name = name.to_ascii_lowercase();
                Ok(match value {
                    Some(value) => attributes.insert(name, value.to_string()),
                    None => attributes.remove(&name),
                })
            }
            Some(_) => Err(Error::Hierarchy("only elements carry attributes")),
            None => Err(Error::NodeNotFound(id)),
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.data {
            NodeData::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn set_text(&mut self, id: NodeId, value: &str) -> Result<()> {
        match self.node_mut(id).map(|n| &mut n.data) {
            Some(NodeData::Text(text)) => {
                value.clone_into(text);
                Ok(())
            }
            Some(_) => Err(Error::Hierarchy("only text nodes carry text")),
            None => Err(Error::NodeNotFound(id)),
        }
    }

    /// Concatenated text of the light subtree rooted at `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        if let Some(text) = self.text(id) {
            out.push_str(text);
        }
        for &child in self.children(id) {
            self.collect_text(child, out);
        }
    }

    /// Name a light child uses to pick its slot. Text always uses the default slot.
    pub fn slot_name(&self, id: NodeId) -> &str {
        self.attribute(id, "slot").unwrap_or("")
    }

    /// Name of a `<slot>` element itself.
    pub fn slot_element_name(&self, slot: NodeId) -> &str {
        self.attribute(slot, "name").unwrap_or("")
    }

    /// Slots of a shadow root in tree order, not descending into nested shadow roots.
    pub fn slots(&self, shadow_root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(shadow_root).iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            if self.is_slot(id) {
                out.push(id);
            }
            stack.extend(self.children(id).iter().rev().copied());
        }
        out
    }

    /// First slot in `host`'s shadow tree carrying `name`.
    pub fn find_slot(&self, host: NodeId, name: &str) -> Option<NodeId> {
        if !self.capabilities.contains(HostCapabilities::SLOTS) {
            return None;
        }
        let shadow = self.shadow_root(host)?;
        self.slots(shadow)
            .into_iter()
            .find(|&slot| self.slot_element_name(slot) == name)
    }

    /// Content-projection primitive: the slot that currently receives `id`.
    pub fn assigned_slot(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        self.find_slot(parent, self.slot_name(id))
    }

    /// Light children of the slot's host that are projected into `slot`.
    pub fn assigned_nodes(&self, slot: NodeId) -> Vec<NodeId> {
        let Some(host) = self.host(self.tree_root(slot)) else {
            return Vec::new();
        };
        self.children(host)
            .iter()
            .copied()
            .filter(|&c| self.assigned_slot(c) == Some(slot))
            .collect()
    }

    pub fn assigned_elements(&self, slot: NodeId) -> Vec<NodeId> {
        self.assigned_nodes(slot)
            .into_iter()
            .filter(|&c| self.is_element(c))
            .collect()
    }

    /// Current slot assignment of every light child of `host`, keyed by slot name.
    pub fn slot_assignments(&self, host: NodeId) -> SlotAssignments {
        let mut assignments = SlotAssignments::new();
        if self.shadow_root(host).is_none() {
            return assignments;
        }
        for &child in self.children(host) {
            if let Some(slot) = self.assigned_slot(child) {
                assignments
                    .entry(self.slot_element_name(slot).to_string())
                    .or_default()
                    .push(child);
            }
        }
        assignments
    }

    /// Topmost node reachable through plain parent pointers.
    pub fn tree_root(&self, id: NodeId) -> NodeId {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        current
    }

    pub fn is_connected(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            let root = self.tree_root(current);
            match self.kind(root) {
                Some(NodeKind::Document) => return true,
                Some(NodeKind::ShadowRoot) => match self.host(root) {
                    Some(host) => current = host,
                    None => return false,
                },
                _ => return false,
            }
        }
    }

    /// Host-including inclusive ancestor test, used to reject cycles.
    fn is_host_including_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node).or_else(|| self.host(node));
        }
        false
    }

    /// Link a parentless `child` under `parent`, before `reference` when given.
    pub(crate) fn link(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<()> {
        match self.kind(parent) {
            Some(NodeKind::Text) => return Err(Error::Hierarchy("text nodes cannot have children")),
            None => return Err(Error::NodeNotFound(parent)),
            _ => {}
        }
        match self.kind(child) {
            Some(NodeKind::Element) | Some(NodeKind::Text) => {}
            Some(_) => return Err(Error::Hierarchy("only elements and text can be inserted")),
            None => return Err(Error::NodeNotFound(child)),
        }
        if self.parent(child).is_some() {
            return Err(Error::Hierarchy("node already has a parent"));
        }
        if self.is_host_including_ancestor(child, parent) {
            return Err(Error::Hierarchy("node cannot be inserted into itself"));
        }
        let position = match reference {
            Some(reference) => Some(
                self.children(parent)
                    .iter()
                    .position(|&c| c == reference)
                    .ok_or(Error::Hierarchy("reference node is not a child of the parent"))?,
            ),
            None => None,
        };

        if let Some(node) = self.node_mut(parent) {
            match position {
                Some(index) => node.children.insert(index, child),
                None => node.children.push(child),
            }
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = Some(parent);
        }
        Ok(())
    }

    /// Detach `child` from its parent, returning the former parent.
    pub(crate) fn unlink(&mut self, child: NodeId) -> Result<NodeId> {
        let parent = self
            .existing(child)?
            .parent
            .ok_or(Error::Hierarchy("node has no parent"))?;
        if let Some(node) = self.node_mut(parent) {
            node.children.retain(|&c| c != child);
        }
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
        Ok(parent)
    }

    /// Shadow-including preorder: an element, then its shadow tree, then its children.
    pub fn shadow_including_descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if !self.contains(current) {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
            if let Some(shadow) = self.shadow_root(current) {
                stack.push(shadow);
            }
        }
        out
    }

    /// Upgraded custom elements in `id`'s subtree, shadow-including tree order.
    pub fn upgraded_elements_in(&self, id: NodeId) -> Vec<NodeId> {
        self.shadow_including_descendants(id)
            .into_iter()
            .filter(|&n| self.is_upgraded(n))
            .collect()
    }

    /// Free a parentless subtree. Returns the upgraded elements that were freed.
    pub(crate) fn free_subtree(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        match self.kind(id) {
            Some(NodeKind::Element) | Some(NodeKind::Text) => {}
            Some(_) => return Err(Error::Hierarchy("only elements and text can be disposed")),
            None => return Err(Error::NodeNotFound(id)),
        }
        if self.parent(id).is_some() {
            return Err(Error::Hierarchy("node must be removed before it is disposed"));
        }
        let doomed = self.shadow_including_descendants(id);
        let upgraded: Vec<NodeId> = doomed
            .iter()
            .copied()
            .filter(|&n| self.is_upgraded(n))
            .collect();
        for node in doomed {
            self.attribute_observers.remove(&node);
            self.slot_observers.remove(&node);
            self.listeners.remove(&node);
            if let Some(entry) = self.entries.get_mut(node.index as usize) {
                entry.node = None;
            }
            self.free_indices.push(node.index);
        }
        Ok(upgraded)
    }

    pub(crate) fn add_attribute_observer(
        &mut self,
        id: NodeId,
        filter: Vec<String>,
        callback: AttributeCallback,
    ) {
        let filter = filter.iter().map(|f| f.to_ascii_lowercase()).collect();
        self.attribute_observers
            .entry(id)
            .or_default()
            .push((filter, callback));
    }

    pub(crate) fn attribute_observers(&self, id: NodeId, name: &str) -> Vec<AttributeCallback> {
        self.attribute_observers
            .get(&id)
            .map(|observers| {
                observers
                    .iter()
                    .filter(|(filter, _)| filter.iter().any(|f| f.eq_ignore_ascii_case(name)))
                    .map(|(_, callback)| callback.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub(crate) fn add_slot_observer(&mut self, host: NodeId, callback: SlotCallback) {
        self.slot_observers.entry(host).or_default().push(callback);
    }

    pub(crate) fn slot_observers(&self, host: NodeId) -> Vec<SlotCallback> {
        self.slot_observers.get(&host).cloned().unwrap_or_default()
    }

    pub(crate) fn add_listener(&mut self, id: NodeId, event: &str, listener: Listener) {
        self.listeners
            .entry(id)
            .or_default()
            .push((event.to_string(), listener));
    }

    pub(crate) fn listeners(&self, id: NodeId, event: &str) -> Vec<Listener> {
        self.listeners
            .get(&id)
            .map(|listeners| {
                listeners
                    .iter()
                    .filter(|(name, _)| name == event)
                    .map(|(_, listener)| listener.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Propagation path of an event. The shadow root is included; its host only
    /// when the event is composed.
    pub fn event_path(&self, target: NodeId, composed: bool) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(target);
        while let Some(node) = current {
            path.push(node);
            current = match self.parent(node) {
                Some(parent) => Some(parent),
                None if composed => self.host(node),
                None => None,
            };
        }
        path
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(HostCapabilities::all())
    }
}
