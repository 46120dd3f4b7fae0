//! Object and member nodes.

use std::fmt;
use std::rc::Rc;

use uuid::Uuid;

use crate::definition::PropertyGraphDefinition;
use crate::descriptor::{MemberDescriptor, TypeDescriptor};
use crate::value::{HostRef, WeakHost};

use super::reference::{ObjectReference, Reference, ReferenceEnumerable};
use super::{GraphError, NodeHandle};

/// A node wrapping one host object.
///
/// Object-shaped hosts expose their declared members as [`MemberNode`]s.
/// Enumerable hosts (lists, sets, dictionaries, arrays) whose items may be
/// objects also carry a [`ReferenceEnumerable`] of their items.
pub struct ObjectNode {
    id: Uuid,
    descriptor: Rc<TypeDescriptor>,
    host: WeakHost,
    members: Vec<(String, NodeHandle)>,
    item_references: Option<ReferenceEnumerable>,
    non_identifiable_items: bool,
    definition: Rc<dyn PropertyGraphDefinition>,
    sealed: bool,
    pub(crate) mutating: bool,
}

impl ObjectNode {
    /// Creates an unsealed node without members or item references.
    pub(crate) fn new(
        host: &HostRef,
        non_identifiable_items: bool,
        definition: Rc<dyn PropertyGraphDefinition>,
    ) -> Self {
        let descriptor = host.descriptor();
        Self {
            id: Uuid::new_v4(),
            non_identifiable_items: non_identifiable_items
                || descriptor.has_non_identifiable_items(),
            descriptor,
            host: host.downgrade(),
            members: Vec::new(),
            item_references: None,
            definition,
            sealed: false,
            mutating: false,
        }
    }

    /// Stable identifier of the node
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Descriptor of the wrapped host object
    pub fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    /// The wrapped host object
    pub fn host(&self, node: NodeHandle) -> Result<HostRef, GraphError> {
        self.host
            .upgrade()
            .ok_or(GraphError::HostReleased { node })
    }

    /// Member nodes in declaration order
    pub fn members(&self) -> impl Iterator<Item = (&str, NodeHandle)> {
        self.members.iter().map(|(name, node)| (name.as_str(), *node))
    }

    /// Number of member nodes
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Member node called `name`
    pub fn try_member(&self, name: &str) -> Option<NodeHandle> {
        self.members
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, node)| *node)
    }

    /// Member node called `name`, failing with [`GraphError::KeyNotFound`]
    pub fn member(&self, name: &str) -> Result<NodeHandle, GraphError> {
        self.try_member(name).ok_or_else(|| GraphError::KeyNotFound {
            name: name.to_string(),
        })
    }

    /// References of the items, present iff items may be host objects
    pub fn item_references(&self) -> Option<&ReferenceEnumerable> {
        self.item_references.as_ref()
    }

    /// Returns true if the wrapped value holds items
    pub fn is_enumerable(&self) -> bool {
        self.descriptor.is_enumerable()
    }

    /// Returns true if the node carries item references
    pub fn is_reference(&self) -> bool {
        self.item_references.is_some()
    }

    /// Whether items of this collection are owned values regardless of identity
    pub fn has_non_identifiable_items(&self) -> bool {
        self.non_identifiable_items
    }

    /// The property graph definition this node was built with
    pub fn definition(&self) -> &Rc<dyn PropertyGraphDefinition> {
        &self.definition
    }

    /// Returns true once construction has finished
    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn add_member(
        &mut self,
        this: NodeHandle,
        name: &str,
        member: NodeHandle,
    ) -> Result<(), GraphError> {
        if self.sealed {
            return Err(GraphError::SealedNode { node: this });
        }
        self.members.push((name.to_string(), member));
        Ok(())
    }

    /// Installs resolved references. Object nodes only hold enumerable references.
    pub(crate) fn set_reference(
        &mut self,
        this: NodeHandle,
        reference: Reference,
    ) -> Result<(), GraphError> {
        match reference {
            Reference::Enumerable(items) => {
                self.item_references = Some(items);
                Ok(())
            }
            Reference::Object(_) => Err(GraphError::ReferenceShapeMismatch {
                type_name: self.descriptor.name().to_string(),
                slot: format!("{this:?}"),
                reason: "an object node cannot hold a single object reference".to_string(),
            }),
        }
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }
}

impl fmt::Debug for ObjectNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectNode")
            .field("id", &self.id)
            .field("type", &self.descriptor.name())
            .field("host", &self.host)
            .field("members", &self.members)
            .field("item_references", &self.item_references)
            .field("sealed", &self.sealed)
            .finish()
    }
}

/// A node for one named member slot of an object node.
#[derive(Debug)]
pub struct MemberNode {
    id: Uuid,
    owner: NodeHandle,
    owner_descriptor: Rc<TypeDescriptor>,
    descriptor: MemberDescriptor,
    reference: Option<ObjectReference>,
    pub(crate) mutating: bool,
}

impl MemberNode {
    pub(crate) fn new(
        owner: NodeHandle,
        owner_descriptor: Rc<TypeDescriptor>,
        descriptor: MemberDescriptor,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner,
            owner_descriptor,
            descriptor,
            reference: None,
            mutating: false,
        }
    }

    /// Stable identifier of the node
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Member name, unique within the owner
    pub fn name(&self) -> &str {
        self.descriptor.name()
    }

    /// The object node owning this member
    pub fn owner(&self) -> NodeHandle {
        self.owner
    }

    /// Descriptor of the owner's type
    pub fn owner_descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.owner_descriptor
    }

    /// Declaration of the member
    pub fn descriptor(&self) -> &MemberDescriptor {
        &self.descriptor
    }

    /// The resolved edge to the held object, if the member holds object values
    pub fn reference(&self) -> Option<&ObjectReference> {
        self.reference.as_ref()
    }

    /// Node of the held object, if the object is a reference
    pub fn target(&self) -> Option<NodeHandle> {
        self.reference.as_ref().and_then(ObjectReference::target)
    }

    /// Node of the held object, reference or owned
    pub fn target_node(&self) -> Option<NodeHandle> {
        self.reference
            .as_ref()
            .and_then(ObjectReference::target_node)
    }

    /// Returns true if the held object is a reference
    pub fn is_object_reference(&self) -> bool {
        self.reference
            .as_ref()
            .is_some_and(ObjectReference::is_object_reference)
    }

    pub(crate) fn set_reference(&mut self, reference: Option<ObjectReference>) {
        self.reference = reference;
    }
}

/// Either kind of node.
#[derive(Debug)]
pub enum GraphNode {
    /// A node wrapping a host object
    Object(ObjectNode),
    /// A node for one member slot
    Member(MemberNode),
}

impl GraphNode {
    /// Stable identifier of the node
    pub fn id(&self) -> Uuid {
        match self {
            GraphNode::Object(node) => node.id(),
            GraphNode::Member(node) => node.id(),
        }
    }

    /// Object nodes are references when they carry item references, member
    /// nodes when their held object is a reference
    pub fn is_reference(&self) -> bool {
        match self {
            GraphNode::Object(node) => node.is_reference(),
            GraphNode::Member(node) => node.is_object_reference(),
        }
    }

    /// The object node, if this is one
    pub fn as_object(&self) -> Option<&ObjectNode> {
        match self {
            GraphNode::Object(node) => Some(node),
            GraphNode::Member(_) => None,
        }
    }

    /// The member node, if this is one
    pub fn as_member(&self) -> Option<&MemberNode> {
        match self {
            GraphNode::Member(node) => Some(node),
            GraphNode::Object(_) => None,
        }
    }

    pub(crate) fn as_object_mut(&mut self) -> Option<&mut ObjectNode> {
        match self {
            GraphNode::Object(node) => Some(node),
            GraphNode::Member(_) => None,
        }
    }

    pub(crate) fn as_member_mut(&mut self) -> Option<&mut MemberNode> {
        match self {
            GraphNode::Member(node) => Some(node),
            GraphNode::Object(_) => None,
        }
    }

    pub(crate) fn set_mutating(&mut self, mutating: bool) {
        match self {
            GraphNode::Object(node) => node.mutating = mutating,
            GraphNode::Member(node) => node.mutating = mutating,
        }
    }

    pub(crate) fn is_mutating(&self) -> bool {
        match self {
            GraphNode::Object(node) => node.mutating,
            GraphNode::Member(node) => node.mutating,
        }
    }
}
