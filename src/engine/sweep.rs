use super::access::{RefreshScope, StateReader};
use super::forest::Forest;
use super::{queue, RenderToken};
use crate::component::{
    with_instance, with_instance_mut, with_instances, with_instances_mut, RefreshFn, StoredState,
};
use crate::dom::{self, with_document, NodeId};

/// Render everything queued right now, nested components first.
///
/// Work queued while the sweep runs waits for the next sweep.
pub(crate) fn render_sweep() {
    let token = RenderToken::new();
    let queued = queue::queued();
    with_instances_mut(|instances| {
        for id in &queued {
            if let Some(component) = instances.get_mut(id) {
                component.render_id = Some(token.clone());
            }
        }
    });

    if let [only] = queued.as_slice() {
        render_component(*only, &token);
        return;
    }

    let forest = with_document(|doc| {
        with_instances(|instances| Forest::build(doc, &queued, &|id| instances.contains_key(&id)))
    });
    queue::with_queue_mut(|queue| queue.clear());
    log::trace!("sweep over {} component(s)", forest.len());

    for id in forest.bottom_up() {
        render_component(id, &token);
    }
}

/// Refresh `id` if it still belongs to the pass identified by `token`.
///
/// On success the new state is stored and a `refresh` event is dispatched at
/// the host. Returns whether that happened.
pub(crate) fn render_component(id: NodeId, token: &RenderToken) -> bool {
    let claimed = with_instance(id, |c| c.render_id.as_ref() == Some(token)).unwrap_or(false);
    if !claimed {
        return false;
    }
    queue::dequeue(id);

    let Some(refresh) = with_instance_mut(id, |c| c.refresh.take()).flatten() else {
        return false;
    };
    let mut lease = RefreshLease {
        id,
        refresh: Some(refresh),
    };
    let outcome = match lease.refresh.as_mut() {
        Some(refresh) => {
            let _scope = RefreshScope::enter(id);
            refresh(&StateReader::new(id))
        }
        None => return false,
    };
    drop(lease);

    match outcome {
        Ok(state) => {
            let stored = with_instance_mut(id, |c| {
                if c.attached {
                    c.state = StoredState::Ready(state);
                }
                c.attached
            })
            .unwrap_or(false);
            if stored {
                dom::dispatch(id, dom::REFRESH);
            }
            stored
        }
        Err(err) => {
            let name = with_instance(id, |c| c.name.clone());
            log::error!(
                "refresh of <{}> {:?} failed: {}",
                name.as_deref().unwrap_or("?"),
                id,
                err
            );
            false
        }
    }
}

/// Owns a refresh function while it runs and puts it back afterwards, also
/// when the refresh unwinds.
struct RefreshLease {
    id: NodeId,
    refresh: Option<RefreshFn>,
}

impl Drop for RefreshLease {
    fn drop(&mut self) {
        if let Some(refresh) = self.refresh.take() {
            with_instance_mut(self.id, |c| c.refresh = Some(refresh));
        }
    }
}
