use std::rc::Rc;

use super::NodeId;

/// What gets dispatched and how it travels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EventKind {
    pub name: &'static str,
    /// Visit ancestors after the target
    pub bubbles: bool,
    /// Cross from a shadow root to its host
    pub composed: bool,
}

/// Emitted on a component after each successful refresh.
pub const REFRESH: EventKind = EventKind {
    name: "refresh",
    bubbles: true,
    composed: false,
};

/// An event as seen by one listener.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Event {
    pub kind: EventKind,
    pub target: NodeId,
    pub current_target: NodeId,
}

pub type Listener = Rc<dyn Fn(&Event)>;
