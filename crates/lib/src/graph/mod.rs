//! The node graph: a uniform, observable view over host object graphs.
//!
//! A [`NodeContainer`] wraps host objects into [`ObjectNode`]s, one per live
//! host object, and every declared member slot into a [`MemberNode`]. Nodes
//! live in an arena and are addressed by generation-checked [`NodeHandle`]s,
//! so handles to evicted nodes fail cleanly with
//! [`GraphError::StaleHandle`].
//!
//! # Core Types
//!
//! - [`NodeContainer`] - arena, identity registry and mutation entry points
//! - [`ObjectNode`] / [`MemberNode`] - the two node kinds
//! - [`NodeIndex`] - whole-value or item addressing
//! - [`ObjectReference`] / [`ReferenceEnumerable`] - resolved edges to other nodes
//! - [`ChangeListener`] - synchronous observer of every mutation
//! - [`GraphNodePath`] - a structural path from a root node
//!
//! # Mutation
//!
//! `add`, `add_at`, `remove` and `update` mutate the host value through its
//! descriptor, resynchronize references, then notify listeners. Listeners
//! may read the graph during a notification but must not mutate the node
//! being changed; doing so fails with [`GraphError::ReentrantMutation`].

pub mod container;
pub mod errors;
pub mod events;
pub mod index;
mod mutation;
pub mod node;
pub mod path;
pub mod reference;
mod registry;

slotmap::new_key_type! {
    /// Generation-checked handle of a node in a [`NodeContainer`].
    pub struct NodeHandle;
}

pub use container::NodeContainer;
pub use errors::GraphError;
pub use events::{ChangeListener, ChangeType, ListenerId, NodeChangeEvent};
pub use index::NodeIndex;
pub use node::{GraphNode, MemberNode, ObjectNode};
pub use path::{GraphNodePath, PathElement};
pub use reference::{ObjectReference, Reference, ReferenceEnumerable};
