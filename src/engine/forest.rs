//! Dependency forest of queued components.
//!
//! Each queued component is attached to its nearest queued structural
//! ancestor. The walk upwards follows content projection: from a light child
//! of a component it continues at the `<slot>` the child is assigned to, and
//! from a shadow root it continues at the host.

use std::collections::{HashMap, HashSet};

use crate::dom::{Document, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForestNode {
    pub component: NodeId,
    /// Indices into the forest
    pub children: Vec<usize>,
}

#[derive(Debug, Default)]
pub struct Forest {
    nodes: Vec<ForestNode>,
    roots: Vec<usize>,
}

impl Forest {
    /// Arrange `queued` into a forest. `is_component` tells which nodes are
    /// component instances.
    pub fn build(doc: &Document, queued: &[NodeId], is_component: &dyn Fn(NodeId) -> bool) -> Self {
        let members: HashSet<NodeId> = queued.iter().copied().collect();
        let mut builder = Builder {
            doc,
            is_component,
            members: &members,
            memo: HashMap::new(),
            forest: Forest::default(),
        };
        for &id in queued {
            builder.node_for(id);
        }
        builder.forest
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> impl Iterator<Item = &ForestNode> {
        self.roots.iter().map(|&i| &self.nodes[i])
    }

    /// Every component once, children before parents, roots in order of first
    /// appearance.
    pub fn bottom_up(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        for &root in &self.roots {
            self.visit(root, &mut out);
        }
        out
    }

    fn visit(&self, index: usize, out: &mut Vec<NodeId>) {
        let node = &self.nodes[index];
        for &child in &node.children {
            self.visit(child, out);
        }
        out.push(node.component);
    }
}

struct Builder<'a> {
    doc: &'a Document,
    is_component: &'a dyn Fn(NodeId) -> bool,
    members: &'a HashSet<NodeId>,
    memo: HashMap<NodeId, usize>,
    forest: Forest,
}

impl Builder<'_> {
    fn node_for(&mut self, id: NodeId) -> usize {
        if let Some(&index) = self.memo.get(&id) {
            return index;
        }
        let index = self.forest.nodes.len();
        self.forest.nodes.push(ForestNode {
            component: id,
            children: Vec::new(),
        });
        self.memo.insert(id, index);

        let members = self.members;
        match find_ancestor(self.doc, id, self.is_component, &|c| members.contains(&c)) {
            Some(parent) => {
                let parent = self.node_for(parent);
                self.forest.nodes[parent].children.push(index);
            }
            None => self.forest.roots.push(index),
        }
        index
    }
}

/// Nearest structural ancestor of `node` that is a component accepted by `is_match`.
pub fn find_ancestor(
    doc: &Document,
    node: NodeId,
    is_component: &dyn Fn(NodeId) -> bool,
    is_match: &dyn Fn(NodeId) -> bool,
) -> Option<NodeId> {
    let mut previous = node;
    let mut cursor = doc.parent(node);
    while let Some(ancestor) = cursor {
        let mut reached = ancestor;
        if is_component(ancestor) {
            // `previous` is a light child; projected content belongs to the slot
            if let Some(slot) = doc.find_slot(ancestor, doc.slot_name(previous)) {
                previous = slot;
                cursor = doc.parent(slot);
                continue;
            }
            if is_match(ancestor) {
                return Some(ancestor);
            }
        } else if let Some(host) = doc.host(ancestor) {
            if is_match(host) {
                return Some(host);
            }
            reached = host;
        }
        previous = reached;
        cursor = doc.parent(reached);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        doc: Document,
        components: HashSet<NodeId>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                doc: Document::default(),
                components: HashSet::new(),
            }
        }

        /// A component with a default slot, appended to `parent`.
        fn component(&mut self, parent: NodeId) -> NodeId {
            let id = self.doc.create_element("x-node");
            let shadow = self.doc.attach_shadow(id).unwrap();
            let slot = self.doc.create_element("slot");
            self.doc.link(shadow, slot, None).unwrap();
            self.doc.link(parent, id, None).unwrap();
            self.components.insert(id);
            id
        }

        fn shadow(&self, id: NodeId) -> NodeId {
            self.doc.shadow_root(id).unwrap()
        }

        fn build(&self, queued: &[NodeId]) -> Forest {
            let components = &self.components;
            Forest::build(&self.doc, queued, &|id| components.contains(&id))
        }
    }

    #[test]
    fn test_bottom_up_through_light_and_shadow_nesting() {
        let mut f = Fixture::new();
        let root = f.doc.root();
        let a = f.component(root);
        let b = f.component(a);
        let a_shadow = f.shadow(a);
        let c = f.component(a_shadow);
        let d = f.component(b);

        let forest = f.build(&[a, b, c, d]);
        assert_eq!(forest.roots().count(), 1);
        assert_eq!(forest.bottom_up(), vec![d, b, c, a]);
    }

    #[test]
    fn test_unqueued_intermediate_is_skipped() {
        let mut f = Fixture::new();
        let root = f.doc.root();
        let a = f.component(root);
        let b = f.component(a);
        let c = f.component(b);

        let forest = f.build(&[c, a]);
        assert_eq!(forest.bottom_up(), vec![c, a]);
        assert_eq!(forest.len(), 2);
    }

    #[test]
    fn test_unprojected_child_has_no_ancestor_through_slot() {
        let mut f = Fixture::new();
        let root = f.doc.root();
        let host = f.doc.create_element("x-plain");
        let shadow = f.doc.attach_shadow(host).unwrap();
        let named = f.doc.create_element("slot");
        f.doc.set_attribute(named, "name", Some("title")).unwrap();
        f.doc.link(shadow, named, None).unwrap();
        f.doc.link(root, host, None).unwrap();
        f.components.insert(host);

        let child = f.component(host);
        // Not assigned to any slot: the walk reaches the host directly.
        assert_eq!(
            find_ancestor(&f.doc, child, &|id| f.components.contains(&id), &|_| true),
            Some(host)
        );

        f.doc.set_attribute(child, "slot", Some("title")).unwrap();
        assert_eq!(
            find_ancestor(&f.doc, child, &|id| f.components.contains(&id), &|_| true),
            Some(host)
        );
    }

    #[test]
    fn test_separate_trees_are_separate_roots() {
        let mut f = Fixture::new();
        let root = f.doc.root();
        let a = f.component(root);
        let b = f.component(root);
        let a_child = f.component(a);

        let forest = f.build(&[b, a_child, a]);
        let roots: Vec<NodeId> = forest.roots().map(|n| n.component).collect();
        assert_eq!(roots, vec![b, a]);
        assert_eq!(forest.bottom_up(), vec![b, a_child, a]);
    }
}
