//! Asset-level views of the node graph.
//!
//! - [`AssetPropertyGraph`] - the graph of one asset, with custom base links
//! - [`PartHierarchy`] - parent/child part conventions
//! - [`PartHierarchyDefinition`] - reference policy of part hierarchies

pub mod errors;
pub mod graph;
pub mod hierarchy;

pub use errors::AssetError;
pub use graph::AssetPropertyGraph;
pub use hierarchy::{PartHierarchy, PartHierarchyDefinition};
