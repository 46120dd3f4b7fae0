//! Structural paths from a root node.

use std::fmt;

use super::{NodeContainer, NodeHandle, NodeIndex};

/// One step of a [`GraphNodePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathElement {
    /// From an object node to its member node
    Member(String),
    /// From a member node to the node of the object it holds
    Target,
    /// From a collection node to the node of one of its items
    Index(NodeIndex),
}

/// A path from a root node, made of member, target and index steps.
///
/// Paths are structural: they ignore whether targets are references, so the
/// same path can be resolved against another graph of the same shape.
///
/// ```
/// # use quantum::{GraphNodePath, NodeHandle};
/// let path = GraphNodePath::new(NodeHandle::default())
///     .with_member("Children")
///     .with_target()
///     .with_index(0);
/// assert_eq!(path.to_string(), ".Children->[0]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GraphNodePath {
    root: NodeHandle,
    elements: Vec<PathElement>,
}

impl GraphNodePath {
    /// Empty path at `root`
    pub fn new(root: NodeHandle) -> Self {
        Self {
            root,
            elements: Vec::new(),
        }
    }

    /// The root node
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// The steps of the path
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Returns true if the path addresses the root itself
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Appends a member step
    pub fn with_member(mut self, name: impl Into<String>) -> Self {
        self.elements.push(PathElement::Member(name.into()));
        self
    }

    /// Appends a target step
    pub fn with_target(mut self) -> Self {
        self.elements.push(PathElement::Target);
        self
    }

    /// Appends an index step
    pub fn with_index(mut self, index: impl Into<NodeIndex>) -> Self {
        self.elements.push(PathElement::Index(index.into()));
        self
    }

    /// Appends a step
    pub fn push(&mut self, element: PathElement) {
        self.elements.push(element);
    }

    /// The same steps from another root
    pub fn rebased(&self, root: NodeHandle) -> Self {
        Self {
            root,
            elements: self.elements.clone(),
        }
    }

    /// Walks the path in `graph`.
    ///
    /// Returns `None` as soon as a step cannot be taken: a missing member, a
    /// null target, an index without item, or a stale node.
    pub fn resolve(&self, graph: &NodeContainer) -> Option<NodeHandle> {
        let mut current = self.root;
        for element in &self.elements {
            current = match element {
                PathElement::Member(name) => graph.try_member(current, name).ok().flatten()?,
                PathElement::Target => graph.target_node(current).ok().flatten()?,
                PathElement::Index(index) => graph.indexed_target(current, index.clone()).ok().flatten()?,
            };
        }
        graph.contains(current).then_some(current)
    }
}

impl fmt::Display for GraphNodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            match element {
                PathElement::Member(name) => write!(f, ".{name}")?,
                PathElement::Target => f.write_str("->")?,
                PathElement::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}
