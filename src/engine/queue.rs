use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use crate::dom::NodeId;

/// Insertion-ordered set of components awaiting a refresh.
///
/// Re-adding a queued component keeps its original position.
#[derive(Debug, Default)]
pub struct UpdateQueue {
    order: BTreeMap<u64, NodeId>,
    positions: HashMap<NodeId, u64>,
    next: u64,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `id` was already queued.
    pub fn add(&mut self, id: NodeId) -> bool {
        if self.positions.contains_key(&id) {
            return false;
        }
        let position = self.next;
        self.next += 1;
        self.order.insert(position, id);
        self.positions.insert(id, position);
        true
    }

    pub fn delete(&mut self, id: NodeId) -> bool {
        match self.positions.remove(&id) {
            Some(position) => {
                self.order.remove(&position);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.order.clear();
        self.positions.clear();
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.positions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Queued components in insertion order.
    pub fn snapshot(&self) -> Vec<NodeId> {
        self.order.values().copied().collect()
    }
}

thread_local! {
    static UPDATE_QUEUE: RefCell<UpdateQueue> = RefCell::new(UpdateQueue::new());
}

pub(crate) fn with_queue_mut<R>(f: impl FnOnce(&mut UpdateQueue) -> R) -> R {
    UPDATE_QUEUE.with(|queue| f(&mut queue.borrow_mut()))
}

pub fn with_queue<R>(f: impl FnOnce(&UpdateQueue) -> R) -> R {
    UPDATE_QUEUE.with(|queue| f(&queue.borrow()))
}

pub(crate) fn enqueue(id: NodeId) -> bool {
    with_queue_mut(|queue| queue.add(id))
}

pub(crate) fn dequeue(id: NodeId) -> bool {
    with_queue_mut(|queue| queue.delete(id))
}

pub fn is_queued(id: NodeId) -> bool {
    with_queue(|queue| queue.contains(id))
}

pub fn queued() -> Vec<NodeId> {
    with_queue(UpdateQueue::snapshot)
}

pub fn queued_len() -> usize {
    with_queue(UpdateQueue::len)
}
