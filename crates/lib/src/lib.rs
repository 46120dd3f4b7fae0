//!
//! Quantum: a reflection-driven node graph over host object models.
//!
//! A [`NodeContainer`] wraps a tree of host objects in nodes, one per object
//! and one per member, and keeps them in step with the objects as they are
//! edited through the node API.
//!
//! ## Core Concepts
//!
//! * **Type descriptors (`descriptor::TypeDescriptor`)**: Runtime shape of a host type. Descriptors list the members of object types and the operations collections and dictionaries support.
//! * **Host objects (`value::HostRef`)**: Shared handles to the objects being edited. The graph only holds them weakly.
//! * **Nodes (`graph::ObjectNode`, `graph::MemberNode`)**: Stable handles onto objects and their members, addressed by `NodeHandle`.
//! * **References (`graph::ObjectReference`, `graph::ReferenceEnumerable`)**: Links from members and collection items to the nodes of the objects they hold.
//! * **Property graph definitions (`definition::PropertyGraphDefinition`)**: Policies deciding whether an object held somewhere is owned or merely referenced.
//! * **Change notifications (`graph::ChangeListener`)**: Changing/changed callbacks around every mutation, used by the undo history (`history::UndoRecorder`).
//! * **Visitors (`visitor::GraphVisitor`)**: Depth-first walks of the graph with path tracking.
//! * **Assets (`asset::AssetPropertyGraph`, `asset::PartHierarchy`)**: Asset graphs linked to their bases, and parent/child part hierarchies.

pub mod asset;
pub mod config;
pub mod constants;
pub mod definition;
pub mod descriptor;
pub mod graph;
pub mod history;
pub mod value;
pub mod visitor;

pub use asset::{AssetPropertyGraph, PartHierarchy, PartHierarchyDefinition};
pub use config::ContainerConfig;
pub use definition::{
    DefaultPropertyGraphDefinition, DefinitionRegistry, ItemContext, MemberContext,
    PropertyGraphDefinition,
};
pub use descriptor::{
    DescriptorCategory, MemberDefault, MemberDescriptor, TypeDescriptor, TypeDescriptorFactory,
    ValueKind, convert_value,
};
pub use graph::{
    ChangeListener, ChangeType, GraphNode, GraphNodePath, ListenerId, MemberNode, NodeChangeEvent,
    NodeContainer, NodeHandle, NodeIndex, ObjectNode, ObjectReference, PathElement, Reference,
    ReferenceEnumerable,
};
pub use history::{Operation, UndoRecorder};
pub use value::{HostData, HostRef, IndexKey, Value, WeakHost};
pub use visitor::{AssetGraphVisitor, CollectingVisitor, GraphVisitor};

/// Result type used throughout the Quantum library.
pub type Result<T> = std::result::Result<T, Error>;

/// Common error type for the Quantum library.
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Structured errors from the descriptor module
    #[error(transparent)]
    Descriptor(descriptor::DescriptorError),

    /// Structured errors from the graph module
    #[error(transparent)]
    Graph(graph::GraphError),

    /// Structured errors from the asset module
    #[error(transparent)]
    Asset(asset::AssetError),

    /// Structured errors from the history module
    #[error(transparent)]
    History(history::HistoryError),
}

impl Error {
    /// Get the originating module for this error.
    pub fn module(&self) -> &'static str {
        match self {
            Error::Serialize(_) => "serialize",
            Error::Descriptor(_) => "descriptor",
            Error::Graph(_) => "graph",
            Error::Asset(_) => "asset",
            Error::History(_) => "history",
        }
    }

    /// Check if this error indicates a type, member, key or node was not found.
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Descriptor(err) => err.is_not_found(),
            Error::Graph(err) => err.is_not_found(),
            Error::Asset(err) => err.is_not_found(),
            _ => false,
        }
    }

    /// Check if this error reports an empty or out of range index.
    pub fn is_invalid_index(&self) -> bool {
        match self {
            Error::Graph(err) => err.is_invalid_index(),
            Error::Descriptor(err) => err.is_out_of_range(),
            _ => false,
        }
    }

    /// Check if this error reports an operation the node or type does not support.
    pub fn is_unsupported(&self) -> bool {
        match self {
            Error::Graph(err) => err.is_unsupported_shape(),
            Error::Descriptor(err) => err.is_unsupported(),
            _ => false,
        }
    }

    /// Check if this error reports a value of the wrong type.
    pub fn is_type_error(&self) -> bool {
        match self {
            Error::Descriptor(err) => err.is_type_error(),
            _ => false,
        }
    }

    /// Check if this error reports a mutation started from inside a change
    /// notification of the same node.
    pub fn is_reentrant(&self) -> bool {
        match self {
            Error::Graph(err) => err.is_reentrant(),
            _ => false,
        }
    }

    /// Check if this error reports a stale handle or a released host object.
    pub fn is_stale(&self) -> bool {
        match self {
            Error::Graph(err) => err.is_stale(),
            _ => false,
        }
    }

    /// Check if this error is graph-related.
    pub fn is_graph_error(&self) -> bool {
        matches!(self, Error::Graph(_))
    }

    /// Check if this error is history-related.
    pub fn is_history_error(&self) -> bool {
        matches!(self, Error::History(_))
    }
}
