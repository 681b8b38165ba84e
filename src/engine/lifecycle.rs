//! Attach and detach.
//!
//! A component becomes attached when it is connected to the document. Outside
//! a render pass it is simply queued for the next frame. During a render pass
//! the whole not-yet-attached component subtree under it is attached and
//! rendered on the spot, innermost first, so the refresh that inserted it can
//! read its state right away.

use super::{queue, render_loop, sweep, RenderToken};
use crate::component::{with_instance, with_instances_mut, Component, Instances, StoredState};
use crate::dom::{self, with_document, Document, NodeId};

/// Queue `id` for the next frame if it is attached.
pub(crate) fn request_refresh(id: NodeId) {
    if with_instance(id, |c| c.attached).unwrap_or(false) {
        queue::enqueue(id);
    }
}

pub(crate) fn connected(id: NodeId) {
    let Some(attached) = with_instance(id, |c| c.attached) else {
        return;
    };
    if attached || !dom::is_connected(id) {
        return;
    }

    if !render_loop::is_rendering() {
        with_instances_mut(|instances| {
            if let Some(component) = instances.get_mut(&id) {
                component.attached = true;
            }
        });
        queue::enqueue(id);
        return;
    }

    let token = RenderToken::new();
    let claimed = with_document(|doc| {
        with_instances_mut(|instances| {
            let mut order = Vec::new();
            let mut claim = |c: &mut Component| {
                if c.attached {
                    return false;
                }
                c.attached = true;
                c.render_id = Some(token.clone());
                true
            };
            walk_components(doc, instances, id, &mut claim, &mut order);
            order
        })
    });
    log::debug!("attached {} component(s) during a render pass", claimed.len());
    for component in claimed {
        sweep::render_component(component, &token);
    }
}

pub(crate) fn disconnected(id: NodeId) {
    if !with_instance(id, |c| c.attached).unwrap_or(false) {
        return;
    }
    let released = with_document(|doc| {
        with_instances_mut(|instances| {
            let mut order = Vec::new();
            let mut release = |c: &mut Component| {
                if !c.attached {
                    return false;
                }
                c.attached = false;
                c.render_id = None;
                c.state = StoredState::Empty;
                true
            };
            walk_components(doc, instances, id, &mut release, &mut order);
            order
        })
    });
    queue::with_queue_mut(|queue| {
        for id in &released {
            queue.delete(*id);
        }
    });
    log::trace!("detached {} component(s)", released.len());
}

/// Post-order walk over the components structurally under `node`, following
/// shadow roots and slot assignments. Light children of a component that no
/// slot receives still belong to that component, matching `find_ancestor`.
/// `visit` decides per component whether to record it and descend.
fn walk_components(
    doc: &Document,
    instances: &mut Instances,
    node: NodeId,
    visit: &mut dyn FnMut(&mut Component) -> bool,
    order: &mut Vec<NodeId>,
) {
    if let Some(component) = instances.get_mut(&node) {
        if !visit(component) {
            return;
        }
        let shadow = component.shadow_root;
        for child in doc.element_children(shadow) {
            walk_components(doc, instances, child, visit, order);
        }
        for child in doc.element_children(node) {
            if doc.assigned_slot(child).is_none() {
                walk_components(doc, instances, child, visit, order);
            }
        }
        order.push(node);
        return;
    }
    if doc.is_slot(node) {
        for assigned in doc.assigned_elements(node) {
            walk_components(doc, instances, assigned, visit, order);
        }
    }
    for child in doc.element_children(node) {
        walk_components(doc, instances, child, visit, order);
    }
}
