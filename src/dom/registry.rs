//! Custom element registry.
//!
//! Binds tag names to a constructor and three reactions. The constructor runs
//! when an element with a defined tag is created; `connected` and
//! `disconnected` run after tree mutations that connect or disconnect an
//! upgraded element; `destroyed` runs when the element is disposed.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::{with_document, with_document_mut, NodeId};
use crate::error::{Error, Result};

type Reaction = Box<dyn Fn(NodeId)>;

pub struct ElementDefinition {
    pub constructor: Box<dyn Fn(NodeId) -> Result<()>>,
    pub connected: Reaction,
    pub disconnected: Reaction,
    pub destroyed: Reaction,
}

thread_local! {
    static DEFINITIONS: RefCell<HashMap<String, Rc<ElementDefinition>>> = RefCell::new(HashMap::new());
}

/// Custom element names start with a lowercase letter, contain a hyphen and
/// carry no uppercase letters or whitespace.
pub fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && name.contains('-')
        && !name
            .chars()
            .any(|c| c.is_ascii_uppercase() || c.is_whitespace() || c == '/' || c == '>')
}

pub fn is_defined(name: &str) -> bool {
    DEFINITIONS.with(|defs| defs.borrow().contains_key(name))
}

/// Register `name`, then upgrade any connected elements already carrying that tag.
pub fn define_element(name: &str, definition: ElementDefinition) -> Result<()> {
    if !is_valid_name(name) {
        return Err(Error::InvalidName(name.to_string()));
    }
    DEFINITIONS.with(|defs| {
        let mut defs = defs.borrow_mut();
        if defs.contains_key(name) {
            return Err(Error::AlreadyDefined(name.to_string()));
        }
        defs.insert(name.to_string(), Rc::new(definition));
        Ok(())
    })?;
    upgrade_candidates(name);
    Ok(())
}

fn upgrade_candidates(name: &str) {
    let candidates: Vec<NodeId> = with_document(|doc| {
        doc.shadow_including_descendants(doc.root())
            .into_iter()
            .filter(|&id| doc.tag(id) == Some(name) && !doc.is_upgraded(id))
            .collect()
    });
    for node in candidates {
        if let Err(err) = upgrade(node) {
            log::error!("failed to upgrade <{}> {:?}: {}", name, node, err);
            continue;
        }
        if with_document(|doc| doc.is_connected(node)) {
            connected(&[node]);
        }
    }
}

fn lookup(node: NodeId) -> Option<Rc<ElementDefinition>> {
    let tag = with_document(|doc| doc.tag(node).map(str::to_string))?;
    DEFINITIONS.with(|defs| defs.borrow().get(&tag).cloned())
}

/// Run the constructor for a freshly created element, if its tag is defined.
/// The element only counts as upgraded when the constructor succeeds.
pub(crate) fn upgrade(node: NodeId) -> Result<()> {
    let Some(definition) = lookup(node) else {
        return Ok(());
    };
    (definition.constructor)(node)?;
    with_document_mut(|doc| doc.set_upgraded(node));
    Ok(())
}

pub(crate) fn connected(nodes: &[NodeId]) {
    for &node in nodes {
        if let Some(definition) = lookup(node) {
            (definition.connected)(node);
        }
    }
}

pub(crate) fn disconnected(nodes: &[NodeId]) {
    for &node in nodes {
        if let Some(definition) = lookup(node) {
            (definition.disconnected)(node);
        }
    }
}

/// Tags are resolved before the nodes are freed, so the caller passes them along.
pub(crate) fn destroyed(nodes: &[(NodeId, String)]) {
    for (node, tag) in nodes {
        let definition = DEFINITIONS.with(|defs| defs.borrow().get(tag).cloned());
        if let Some(definition) = definition {
            (definition.destroyed)(*node);
        }
    }
}
