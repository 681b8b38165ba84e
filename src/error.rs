use thiserror::Error;

use crate::dom::NodeId;

/// Reasons a state read is refused.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    #[error("state was read outside the reader's own refresh")]
    OutsideRefresh,
    #[error("state was read from a node that is not a component")]
    NotAComponent,
    #[error("state was read from a component that has not finished a refresh while attached")]
    NotReady,
    #[error("state was read from a component that is not an attached descendant")]
    NotDescendant,
    #[error("state was read with the wrong type")]
    WrongType,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("\"{0}\" is not a valid component name")]
    InvalidName(String),
    #[error("component \"{0}\" is already defined")]
    AlreadyDefined(String),
    #[error("component \"{component}\" mutation \"{mutation}\" is invalid")]
    InvalidMutation { component: String, mutation: String },
    #[error("component \"{component}\" option handler \"{option}\" is invalid")]
    InvalidOption { component: String, option: String },
    #[error("component \"{component}\" has a handler for slot \"{slot}\" but no such <slot>")]
    MissingSlot { component: String, slot: String },
    #[error("component \"{0}\" mutations are not available during initialization")]
    MutationsUnavailable(String),
    #[error("component \"{component}\" has no mutation \"{mutation}\"")]
    UnknownMutation { component: String, mutation: String },
    #[error("node {0:?} is not a component")]
    NotAComponent(NodeId),
    #[error(transparent)]
    Access(#[from] AccessError),
    #[error("node {0:?} does not exist")]
    NodeNotFound(NodeId),
    #[error("hierarchy request error: {0}")]
    Hierarchy(&'static str),
    #[error("frame source could not be registered: {0}")]
    FrameSource(String),
    #[error("{0}")]
    Refresh(String),
}

impl Error {
    /// Build a failure for a refresh function to return.
    pub fn refresh(message: impl Into<String>) -> Self {
        Error::Refresh(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
