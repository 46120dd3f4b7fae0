//! Parent/child hierarchies of asset parts.
//!
//! A part owns its children through a collection member marked as holding
//! non-identifiable items, and points back at its parent through a member
//! classified as a reference. [`PartHierarchy`] keeps both links in step.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::Result;
use crate::constants::{CHILDREN_MEMBER, PARENT_MEMBER};
use crate::definition::{
    ItemContext, MemberContext, PropertyGraphDefinition, default_is_item_reference,
    default_is_member_reference,
};
use crate::graph::{GraphError, NodeContainer, NodeHandle, NodeIndex};
use crate::value::{HostRef, Value};

use super::AssetError;

/// Classifies every part held by a member as a reference.
///
/// Parts are owned by exactly one children collection; any other member
/// holding a part (the parent back-link, cross references) links to it.
#[derive(Debug, Clone)]
pub struct PartHierarchyDefinition {
    part_type: String,
}

impl PartHierarchyDefinition {
    /// Definition for parts of type `part_type`
    pub fn new(part_type: impl Into<String>) -> Self {
        Self {
            part_type: part_type.into(),
        }
    }

    fn is_part(&self, value: &Value) -> bool {
        value
            .as_object()
            .is_some_and(|host| host.descriptor().is_assignable_to(&self.part_type))
    }
}

impl PropertyGraphDefinition for PartHierarchyDefinition {
    fn is_member_reference(&self, member: &MemberContext<'_>, value: &Value) -> bool {
        self.is_part(value) || default_is_member_reference(member, value)
    }

    fn is_item_reference(&self, item: &ItemContext<'_>, value: &Value) -> bool {
        default_is_item_reference(item, value)
    }
}

/// Adds and removes child parts, keeping the parent back-link in step.
#[derive(Debug, Clone)]
pub struct PartHierarchy {
    part_type: String,
    parent_member: String,
    children_member: String,
    definition: Rc<PartHierarchyDefinition>,
}

impl PartHierarchy {
    /// Hierarchy of `part_type` parts using the default member names
    pub fn new(part_type: impl Into<String>) -> Self {
        let part_type = part_type.into();
        Self {
            definition: Rc::new(PartHierarchyDefinition::new(part_type.clone())),
            part_type,
            parent_member: PARENT_MEMBER.to_string(),
            children_member: CHILDREN_MEMBER.to_string(),
        }
    }

    /// Uses `name` as the parent back-link member
    pub fn with_parent_member(mut self, name: impl Into<String>) -> Self {
        self.parent_member = name.into();
        self
    }

    /// Uses `name` as the children collection member
    pub fn with_children_member(mut self, name: impl Into<String>) -> Self {
        self.children_member = name.into();
        self
    }

    /// Type name of the parts
    pub fn part_type(&self) -> &str {
        &self.part_type
    }

    /// The definition parts are wrapped with
    pub fn definition(&self) -> Rc<dyn PropertyGraphDefinition> {
        Rc::clone(&self.definition) as Rc<dyn PropertyGraphDefinition>
    }

    /// Node of `part`, wrapping it with the hierarchy definition if needed
    pub fn node(&self, graph: &NodeContainer, part: &HostRef) -> Result<NodeHandle> {
        graph.get_or_create_node_with(part, self.definition())
    }

    fn member_of(&self, graph: &NodeContainer, node: NodeHandle, name: &str) -> Result<NodeHandle> {
        graph.member(node, name).map_err(|err| match err {
            crate::Error::Graph(GraphError::KeyNotFound { .. }) => AssetError::MissingMember {
                type_name: self.part_type.clone(),
                member: name.to_string(),
            }
            .into(),
            other => other,
        })
    }

    fn children_node(&self, graph: &NodeContainer, parent: &HostRef) -> Result<NodeHandle> {
        let parent_node = self.node(graph, parent)?;
        let member = self.member_of(graph, parent_node, &self.children_member)?;
        graph.target_node(member)?.ok_or_else(|| {
            AssetError::MissingMember {
                type_name: self.part_type.clone(),
                member: self.children_member.clone(),
            }
            .into()
        })
    }

    fn position_of(&self, graph: &NodeContainer, children: NodeHandle, part: &HostRef) -> Result<Option<usize>> {
        let list = graph.host(children)?;
        Ok(list
            .items()
            .iter()
            .position(|item| item.as_object().is_some_and(|item| item.ptr_eq(part))))
    }

    /// Inserts `child` in the children of `parent`, then points the child's
    /// parent member at `parent`.
    ///
    /// `index` defaults to appending. If the back-link cannot be set the
    /// child is removed again and [`AssetError::HierarchyLinkFailed`] is
    /// returned.
    pub fn add_child_part(
        &self,
        graph: &NodeContainer,
        parent: &HostRef,
        child: &HostRef,
        index: Option<usize>,
    ) -> Result<()> {
        let children = self.children_node(graph, parent)?;
        let index = match index {
            Some(index) => index,
            None => graph.item_count(children)?,
        };
        graph.add_at(children, child, index)?;

        let linked = self
            .node(graph, child)
            .and_then(|child_node| self.member_of(graph, child_node, &self.parent_member))
            .and_then(|parent_link| graph.update(parent_link, parent, NodeIndex::Empty));
        let Err(err) = linked else {
            debug!(children = ?children, index, "Added child part");
            return Ok(());
        };

        warn!(error = %err, "Linking child part failed, removing it from its parent");
        if let Some(position) = self.position_of(graph, children, child)? {
            graph.remove(children, child, position)?;
        }
        Err(AssetError::HierarchyLinkFailed {
            source: Box::new(err),
        }
        .into())
    }

    /// Removes `child` from the children of `parent` and clears its parent member.
    ///
    /// Returns false if `child` is not a child of `parent`.
    pub fn remove_child_part(
        &self,
        graph: &NodeContainer,
        parent: &HostRef,
        child: &HostRef,
    ) -> Result<bool> {
        let children = self.children_node(graph, parent)?;
        let Some(position) = self.position_of(graph, children, child)? else {
            return Ok(false);
        };
        graph.remove(children, child, position)?;
        let child_node = self.node(graph, child)?;
        let parent_link = self.member_of(graph, child_node, &self.parent_member)?;
        graph.update(parent_link, Value::Null, NodeIndex::Empty)?;
        debug!(children = ?children, position, "Removed child part");
        Ok(true)
    }

    /// Parent of `part`, as recorded by its parent member
    pub fn parent_of(&self, graph: &NodeContainer, part: &HostRef) -> Result<Option<HostRef>> {
        let node = self.node(graph, part)?;
        let parent_link = self.member_of(graph, node, &self.parent_member)?;
        Ok(graph
            .retrieve(parent_link, NodeIndex::Empty)?
            .as_object()
            .cloned())
    }

    /// Children of `part`, in order
    pub fn children_of(&self, graph: &NodeContainer, part: &HostRef) -> Result<Vec<HostRef>> {
        let children = self.children_node(graph, part)?;
        Ok(graph
            .host(children)?
            .items()
            .into_iter()
            .filter_map(|item| item.as_object().cloned())
            .collect())
    }
}
