//! Error types for node graph operations.
//!
//! Every variant is a local contract violation: nothing is retried or
//! recovered internally, the error propagates to the caller of the failing
//! construction or mutation.

use thiserror::Error;

use super::NodeHandle;

/// Errors raised by the node graph.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The node's descriptor category does not support the operation
    #[error("Operation '{operation}' is not supported by '{type_name}'")]
    UnsupportedShape {
        operation: &'static str,
        type_name: String,
    },

    /// An empty index was passed where an item index is required, or the
    /// index has the wrong shape for the node
    #[error("Invalid index: {reason}")]
    InvalidIndex { reason: String },

    /// A reference-only operation was invoked on a node without item references
    #[error("Node {node:?} does not contain enumerable references")]
    NotAReferenceNode { node: NodeHandle },

    /// The property graph definition classified a slot as a reference but the
    /// slot cannot hold one
    #[error("Reference shape mismatch on '{type_name}' at {slot}: {reason}")]
    ReferenceShapeMismatch {
        type_name: String,
        slot: String,
        reason: String,
    },

    /// A mutation was attempted while a mutation of the same node is in flight
    #[error("Re-entrant mutation of node {node:?} during a change notification")]
    ReentrantMutation { node: NodeHandle },

    /// No member with this name exists on the node
    #[error("Member not found: {name}")]
    KeyNotFound { name: String },

    /// The handle does not address a live node
    #[error("Stale node handle {node:?}")]
    StaleHandle { node: NodeHandle },

    /// The host object wrapped by the node was released
    #[error("Host object of node {node:?} has been released")]
    HostReleased { node: NodeHandle },

    /// The handle addresses a member node where an object node was expected
    #[error("Node {node:?} is not an object node")]
    NotAnObjectNode { node: NodeHandle },

    /// The handle addresses an object node where a member node was expected
    #[error("Node {node:?} is not a member node")]
    NotAMemberNode { node: NodeHandle },

    /// Members cannot be added to a node after it has been sealed
    #[error("Node {node:?} is sealed")]
    SealedNode { node: NodeHandle },
}

impl GraphError {
    pub(crate) fn invalid_index(reason: impl Into<String>) -> Self {
        GraphError::InvalidIndex {
            reason: reason.into(),
        }
    }

    /// Check if this error reports a missing member
    pub fn is_not_found(&self) -> bool {
        matches!(self, GraphError::KeyNotFound { .. })
    }

    /// Check if this error reports an invalid index
    pub fn is_invalid_index(&self) -> bool {
        matches!(self, GraphError::InvalidIndex { .. })
    }

    /// Check if this error reports an unsupported shape
    pub fn is_unsupported_shape(&self) -> bool {
        matches!(self, GraphError::UnsupportedShape { .. })
    }

    /// Check if this error reports a re-entrant mutation
    pub fn is_reentrant(&self) -> bool {
        matches!(self, GraphError::ReentrantMutation { .. })
    }

    /// Check if this error reports a handle or host that is no longer alive
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            GraphError::StaleHandle { .. } | GraphError::HostReleased { .. }
        )
    }
}

impl From<GraphError> for crate::Error {
    fn from(err: GraphError) -> Self {
        crate::Error::Graph(err)
    }
}
