//! Guarded reads of another component's state.
//!
//! A component may read the state of an attached, rendered descendant, and
//! only from inside its own refresh. The stack of running refreshes lives
//! here; nested refreshes (in-pass attach) push on top of the outer one.

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use super::forest::find_ancestor;
use crate::component::{with_instance, with_instances};
use crate::dom::{with_document, NodeId};
use crate::error::AccessError;

thread_local! {
    static REFRESH_STACK: RefCell<Vec<NodeId>> = const { RefCell::new(Vec::new()) };
}

/// The component whose refresh is running innermost, if any.
pub fn current_refresher() -> Option<NodeId> {
    REFRESH_STACK.with(|stack| stack.borrow().last().copied())
}

/// Marks `owner`'s refresh as running for as long as it lives.
pub(crate) struct RefreshScope {
    owner: NodeId,
}

impl RefreshScope {
    pub(crate) fn enter(owner: NodeId) -> Self {
        REFRESH_STACK.with(|stack| stack.borrow_mut().push(owner));
        Self { owner }
    }
}

impl Drop for RefreshScope {
    fn drop(&mut self) {
        let popped = REFRESH_STACK.with(|stack| stack.borrow_mut().pop());
        if popped != Some(self.owner) {
            log::error!(
                "refresh stack out of order: expected {:?}, popped {:?}",
                self.owner,
                popped
            );
        }
    }
}

/// Passed to refresh functions; reads descendant state on behalf of its owner.
///
/// Reads only succeed while the owner's refresh is the innermost one running,
/// so a reader kept past its refresh is useless.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateReader {
    owner: NodeId,
}

impl StateReader {
    pub(crate) fn new(owner: NodeId) -> Self {
        Self { owner }
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    /// State of `target`, which must be an attached descendant with state of type `T`.
    pub fn get<T: 'static>(&self, target: NodeId) -> Result<Rc<T>, AccessError> {
        let state = checked_state(self.owner, target)?;
        state.downcast::<T>().map_err(|_| AccessError::WrongType)
    }

    pub fn get_cloned<T: Clone + 'static>(&self, target: NodeId) -> Result<T, AccessError> {
        self.get::<T>(target).map(|state| T::clone(&state))
    }
}

/// Read `target`'s state on behalf of whichever component is refreshing.
pub fn read_state<T: 'static>(target: NodeId) -> Result<Rc<T>, AccessError> {
    let owner = current_refresher().ok_or(AccessError::OutsideRefresh)?;
    StateReader::new(owner).get(target)
}

fn checked_state(owner: NodeId, target: NodeId) -> Result<Rc<dyn Any>, AccessError> {
    if current_refresher() != Some(owner) {
        return Err(AccessError::OutsideRefresh);
    }
    let (attached, state) =
        with_instance(target, |c| (c.attached, c.state.value())).ok_or(AccessError::NotAComponent)?;
    let state = state.ok_or(AccessError::NotReady)?;
    if !attached || !is_descendant(owner, target) {
        return Err(AccessError::NotDescendant);
    }
    Ok(state)
}

/// Whether `target` is nested inside `owner`, following content projection.
pub fn is_descendant(owner: NodeId, target: NodeId) -> bool {
    with_document(|doc| {
        with_instances(|instances| {
            find_ancestor(doc, target, &|id| instances.contains_key(&id), &|id| id == owner).is_some()
        })
    })
}
