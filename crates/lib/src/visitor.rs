//! Depth-first traversal of a node graph.
//!
//! [`visit`] walks from a root node in pre-order: an object node, then each
//! of its members followed by the node the member holds, then the nodes of
//! its collection items. A visitor prunes the walk through
//! [`GraphVisitor::should_visit_member_target`] and
//! [`GraphVisitor::should_visit_target_item`]. [`AssetGraphVisitor`] prunes
//! every edge its property graph definition classifies as a reference, so a
//! walk never leaves the objects owned by its root.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::trace;

use crate::Result;
use crate::definition::{ItemContext, MemberContext, PropertyGraphDefinition};
use crate::graph::{GraphNodePath, NodeContainer, NodeHandle, NodeIndex};

/// Callbacks of a graph traversal. Every method has a default.
pub trait GraphVisitor {
    /// Called once for every object node reached
    fn visit_object(&mut self, _graph: &NodeContainer, _node: NodeHandle, _path: &GraphNodePath) {}

    /// Called for every member node of a visited object node
    fn visit_member(&mut self, _graph: &NodeContainer, _member: NodeHandle, _path: &GraphNodePath) {}

    /// Whether to descend into the node a member holds
    fn should_visit_member_target(&mut self, _graph: &NodeContainer, _member: NodeHandle) -> bool {
        true
    }

    /// Whether to descend into the node of the item at `index`
    fn should_visit_target_item(
        &mut self,
        _graph: &NodeContainer,
        _collection: NodeHandle,
        _index: &NodeIndex,
    ) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Done,
}

/// Walks the graph from `root`, depth-first and pre-order.
///
/// Every object node is visited at most once: nodes currently on the stack
/// or already finished are skipped, so cycles through references or
/// back-links terminate. Nodes never reached are implicitly unvisited.
pub fn visit<V>(graph: &NodeContainer, root: NodeHandle, visitor: &mut V) -> Result<()>
where
    V: GraphVisitor + ?Sized,
{
    let mut states = HashMap::new();
    visit_object(graph, root, GraphNodePath::new(root), visitor, &mut states)
}

fn visit_object<V>(
    graph: &NodeContainer,
    node: NodeHandle,
    path: GraphNodePath,
    visitor: &mut V,
    states: &mut HashMap<NodeHandle, VisitState>,
) -> Result<()>
where
    V: GraphVisitor + ?Sized,
{
    match states.get(&node) {
        Some(VisitState::Visiting) => {
            trace!(node = ?node, path = %path, "Cycle reached, not descending");
            return Ok(());
        }
        Some(VisitState::Done) => return Ok(()),
        None => {}
    }
    states.insert(node, VisitState::Visiting);
    trace!(node = ?node, path = %path, "Visiting object node");
    visitor.visit_object(graph, node, &path);

    let members: Vec<(String, NodeHandle)> = graph
        .object(node)?
        .members()
        .map(|(name, member)| (name.to_string(), member))
        .collect();
    for (name, member) in members {
        let member_path = path.clone().with_member(name);
        visitor.visit_member(graph, member, &member_path);
        let Some(target) = graph.target_node(member)? else {
            continue;
        };
        if !visitor.should_visit_member_target(graph, member) {
            trace!(member = ?member, "Pruned member target");
            continue;
        }
        visit_object(graph, target, member_path.with_target(), visitor, states)?;
    }

    let items: Vec<(NodeIndex, NodeHandle)> = match graph.object(node)?.item_references() {
        Some(references) => references
            .iter()
            .filter_map(|r| r.target_node().map(|target| (r.index().clone(), target)))
            .collect(),
        None => Vec::new(),
    };
    for (index, target) in items {
        if !visitor.should_visit_target_item(graph, node, &index) {
            trace!(node = ?node, index = %index, "Pruned collection item");
            continue;
        }
        visit_object(graph, target, path.clone().with_index(index), visitor, states)?;
    }

    states.insert(node, VisitState::Done);
    Ok(())
}

/// Wraps a visitor and prunes every edge classified as a reference.
///
/// Member targets and collection items are only descended into when both
/// the wrapped visitor agrees and the property graph definition says the
/// held object is owned.
pub struct AssetGraphVisitor<V> {
    definition: Rc<dyn PropertyGraphDefinition>,
    inner: V,
}

impl<V: GraphVisitor> AssetGraphVisitor<V> {
    /// Wraps `inner`, classifying edges with `definition`
    pub fn new(definition: Rc<dyn PropertyGraphDefinition>, inner: V) -> Self {
        Self { definition, inner }
    }

    /// The wrapped visitor
    pub fn inner(&self) -> &V {
        &self.inner
    }

    /// Unwraps the visitor
    pub fn into_inner(self) -> V {
        self.inner
    }

    fn is_member_reference(&self, graph: &NodeContainer, member: NodeHandle) -> bool {
        let Ok(node) = graph.member_node(member) else {
            return false;
        };
        let (owner, descriptor) = (node.owner_descriptor().clone(), node.descriptor().clone());
        drop(node);
        let value = graph.retrieve(member, NodeIndex::Empty).unwrap_or_default();
        let context = MemberContext {
            owner: &owner,
            member: &descriptor,
        };
        self.definition.is_member_reference(&context, &value)
    }

    fn is_item_reference(&self, graph: &NodeContainer, collection: NodeHandle, index: &NodeIndex) -> bool {
        let Ok(object) = graph.object(collection) else {
            return false;
        };
        let (descriptor, non_identifiable_items) =
            (object.descriptor().clone(), object.has_non_identifiable_items());
        drop(object);
        let value = graph.retrieve(collection, index.clone()).unwrap_or_default();
        let context = ItemContext {
            collection: &descriptor,
            index,
            non_identifiable_items,
        };
        self.definition.is_item_reference(&context, &value)
    }
}

impl<V: GraphVisitor> GraphVisitor for AssetGraphVisitor<V> {
    fn visit_object(&mut self, graph: &NodeContainer, node: NodeHandle, path: &GraphNodePath) {
        self.inner.visit_object(graph, node, path);
    }

    fn visit_member(&mut self, graph: &NodeContainer, member: NodeHandle, path: &GraphNodePath) {
        self.inner.visit_member(graph, member, path);
    }

    fn should_visit_member_target(&mut self, graph: &NodeContainer, member: NodeHandle) -> bool {
        self.inner.should_visit_member_target(graph, member)
            && !self.is_member_reference(graph, member)
    }

    fn should_visit_target_item(
        &mut self,
        graph: &NodeContainer,
        collection: NodeHandle,
        index: &NodeIndex,
    ) -> bool {
        self.inner.should_visit_target_item(graph, collection, index)
            && !self.is_item_reference(graph, collection, index)
    }
}

/// Records every object node reached, with its path, in visit order.
#[derive(Debug, Default, Clone)]
pub struct CollectingVisitor {
    visited: Vec<(NodeHandle, GraphNodePath)>,
}

impl CollectingVisitor {
    /// Creates an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Visited nodes and their paths, in visit order
    pub fn visited(&self) -> &[(NodeHandle, GraphNodePath)] {
        &self.visited
    }

    /// Visited nodes, in visit order
    pub fn nodes(&self) -> Vec<NodeHandle> {
        self.visited.iter().map(|(node, _)| *node).collect()
    }

    /// Returns true if `node` was visited
    pub fn contains(&self, node: NodeHandle) -> bool {
        self.visited.iter().any(|(visited, _)| *visited == node)
    }
}

impl GraphVisitor for CollectingVisitor {
    fn visit_object(&mut self, _graph: &NodeContainer, node: NodeHandle, path: &GraphNodePath) {
        self.visited.push((node, path.clone()));
    }
}
