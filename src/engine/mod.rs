//! Frame-driven rendering.
//!
//! Components that request a refresh land in the update queue. Every frame,
//! [`tick`] drains the queue in sweeps: each sweep arranges the queued
//! components into a dependency forest and refreshes it bottom-up, so a
//! component always renders after the components nested inside it. Refreshes
//! may queue more work; sweeps repeat until the queue is empty or the
//! recursion limit is reached.

pub mod access;
pub mod forest;
pub mod lifecycle;
pub mod queue;
pub mod render_loop;
pub mod sweep;

use std::fmt;
use std::rc::Rc;

pub use access::{current_refresher, read_state, StateReader};
pub use forest::Forest;
pub use queue::UpdateQueue;
pub use render_loop::{is_rendering, tick, TickReport, FRAME_INTERVAL, RECURSION_LIMIT};

/// Identity of one render sweep or one in-pass attach.
///
/// Tokens compare by identity: every [`RenderToken::new`] is distinct from
/// every other token alive at the same time.
#[derive(Clone)]
pub struct RenderToken(Rc<()>);

impl RenderToken {
    pub fn new() -> Self {
        Self(Rc::new(()))
    }
}

impl Default for RenderToken {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for RenderToken {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RenderToken {}

impl fmt::Debug for RenderToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RenderToken({:p})", Rc::as_ptr(&self.0))
    }
}
