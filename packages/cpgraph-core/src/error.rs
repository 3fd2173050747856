//! Error types for cpgraph-core.
//!
//! These cover graph and scope invariant violations; the translation layer
//! wraps them as internal errors.

use crate::node::NodeId;
use crate::scope::ScopeId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, Error)]
pub enum CoreError {
    /// Scope left out of stack order.
    #[error("scope mismatch: tried to leave {left:?} but {top:?} is on top")]
    ScopeMismatch { left: ScopeId, top: Option<ScopeId> },

    /// Edge endpoint does not exist in the arena.
    #[error("unknown node: {0:?}")]
    UnknownNode(NodeId),

    /// Scope id does not exist in the scope tree.
    #[error("unknown scope: {0:?}")]
    UnknownScope(ScopeId),

    /// Edge label not allowed for the source node's kind, or a second AST
    /// parent for the target.
    #[error("invalid edge: {0}")]
    InvalidEdge(String),

    /// Duplicate node identity in the arena.
    #[error("duplicate node id: {0:?}")]
    DuplicateNode(NodeId),
}

impl CoreError {
    pub fn invalid_edge(msg: impl Into<String>) -> Self {
        CoreError::InvalidEdge(msg.into())
    }
}
