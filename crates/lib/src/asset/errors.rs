//! Error types for asset graphs and part hierarchies.

use thiserror::Error;

use crate::graph::NodeHandle;

/// Errors raised by [`AssetPropertyGraph`](super::AssetPropertyGraph) and
/// [`PartHierarchy`](super::PartHierarchy).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AssetError {
    /// A custom base link was already registered for the node
    #[error("Node {node:?} already has a custom base link")]
    DuplicateBaseLink { node: NodeHandle },

    /// A part lacks a member the hierarchy conventions require, or the
    /// member holds no object
    #[error("Type '{type_name}' has no usable member '{member}'")]
    MissingMember { type_name: String, member: String },

    /// Setting the parent back-link of a child part failed; the child was
    /// removed from its parent again
    #[error("Failed to link child part to its parent: {source}")]
    HierarchyLinkFailed {
        #[source]
        source: Box<crate::Error>,
    },
}

impl AssetError {
    /// Check if this error reports a duplicate base link
    pub fn is_duplicate(&self) -> bool {
        matches!(self, AssetError::DuplicateBaseLink { .. })
    }

    /// Check if this error reports a missing member
    pub fn is_not_found(&self) -> bool {
        matches!(self, AssetError::MissingMember { .. })
    }
}

impl From<AssetError> for crate::Error {
    fn from(err: AssetError) -> Self {
        crate::Error::Asset(err)
    }
}
