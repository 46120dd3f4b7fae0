//! Property graph of one asset, and its links to a base asset.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::Result;
use crate::definition::{DefinitionRegistry, PropertyGraphDefinition};
use crate::graph::{NodeContainer, NodeHandle};
use crate::value::HostRef;
use crate::visitor::{self, AssetGraphVisitor, CollectingVisitor, GraphVisitor};

use super::AssetError;

/// The node graph of one asset, built with the definition registered for
/// the asset's type.
///
/// Derived assets can be linked to the asset they derive from with
/// [`link_to_base`](Self::link_to_base). Links follow the structure of both
/// graphs unless a custom base link overrides them for a node.
pub struct AssetPropertyGraph {
    root: NodeHandle,
    definition: Rc<dyn PropertyGraphDefinition>,
    custom_bases: HashMap<NodeHandle, NodeHandle>,
}

impl AssetPropertyGraph {
    /// Wraps `asset` in `graph`, using the definition registered for its type.
    ///
    /// If the asset was already wrapped, its nodes keep the definition they
    /// were built with.
    pub fn new(
        graph: &NodeContainer,
        asset: &HostRef,
        definitions: &DefinitionRegistry,
    ) -> Result<Self> {
        let root = graph.get_or_create_node_with(asset, definitions.find(&asset.type_name()))?;
        let definition = Rc::clone(graph.object(root)?.definition());
        debug!(node = ?root, type_name = %asset.type_name(), "Created asset property graph");
        Ok(Self {
            root,
            definition,
            custom_bases: HashMap::new(),
        })
    }

    /// Root node of the asset
    pub fn root(&self) -> NodeHandle {
        self.root
    }

    /// The definition classifying references in this asset
    pub fn definition(&self) -> &Rc<dyn PropertyGraphDefinition> {
        &self.definition
    }

    /// Overrides the base of `node`.
    ///
    /// Fails with [`AssetError::DuplicateBaseLink`] if `node` already has one.
    pub fn register_custom_base_link(&mut self, node: NodeHandle, base: NodeHandle) -> Result<()> {
        match self.custom_bases.entry(node) {
            Entry::Occupied(_) => Err(AssetError::DuplicateBaseLink { node }.into()),
            Entry::Vacant(slot) => {
                slot.insert(base);
                Ok(())
            }
        }
    }

    /// The custom base registered for `node`
    pub fn custom_base(&self, node: NodeHandle) -> Option<NodeHandle> {
        self.custom_bases.get(&node).copied()
    }

    /// Base of `source`: its custom base if registered, `default_target` otherwise
    pub fn find_target(
        &self,
        source: NodeHandle,
        default_target: Option<NodeHandle>,
    ) -> Option<NodeHandle> {
        self.custom_base(source).or(default_target)
    }

    /// Walks the nodes owned by the asset, pruning references.
    ///
    /// Returns the visitor once the walk is complete.
    pub fn visit<V: GraphVisitor>(&self, graph: &NodeContainer, visitor: V) -> Result<V> {
        let mut asset_visitor = AssetGraphVisitor::new(Rc::clone(&self.definition), visitor);
        visitor::visit(graph, self.root, &mut asset_visitor)?;
        Ok(asset_visitor.into_inner())
    }

    /// Pairs every node owned by this asset with its node in `base`.
    ///
    /// Each visited object node is looked up in `base` at the same path,
    /// then [`find_target`](Self::find_target) applies custom links. Member
    /// nodes are paired by name with the members of their owner's base.
    /// Nodes without a base are left out.
    pub fn link_to_base(
        &self,
        graph: &NodeContainer,
        base: &AssetPropertyGraph,
    ) -> Result<Vec<(NodeHandle, NodeHandle)>> {
        let collected = self.visit(graph, CollectingVisitor::new())?;
        let mut links = Vec::new();
        for (node, path) in collected.visited() {
            let default_target = path.rebased(base.root).resolve(graph);
            let Some(base_node) = self.find_target(*node, default_target) else {
                trace!(node = ?node, path = %path, "No base node");
                continue;
            };
            links.push((*node, base_node));

            let members: Vec<(String, NodeHandle)> = graph
                .object(*node)?
                .members()
                .map(|(name, member)| (name.to_string(), member))
                .collect();
            for (name, member) in members {
                let base_member = graph.try_member(base_node, &name).ok().flatten();
                if let Some(base_member) = self.find_target(member, base_member) {
                    links.push((member, base_member));
                }
            }
        }
        debug!(count = links.len(), "Linked asset to its base");
        Ok(links)
    }
}

impl fmt::Debug for AssetPropertyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssetPropertyGraph")
            .field("root", &self.root)
            .field("custom_bases", &self.custom_bases)
            .finish()
    }
}
