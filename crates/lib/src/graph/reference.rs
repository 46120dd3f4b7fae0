//! Resolved edges from a node to the object nodes of its values.

use uuid::Uuid;

use super::{NodeHandle, NodeIndex};

/// Edge from a member slot or collection item to the node of the object it holds.
///
/// The edge is structural: [`target_node`](Self::target_node) is set whenever
/// the slot holds a host object. Whether the object is an owned value or a
/// link to an object owned elsewhere is recorded by
/// [`is_object_reference`](Self::is_object_reference), as decided by the
/// active property graph definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectReference {
    index: NodeIndex,
    target: Option<NodeHandle>,
    target_id: Option<Uuid>,
    is_object_reference: bool,
}

impl ObjectReference {
    pub(crate) fn new(
        index: NodeIndex,
        target: Option<NodeHandle>,
        target_id: Option<Uuid>,
        is_object_reference: bool,
    ) -> Self {
        Self {
            index,
            target,
            target_id,
            is_object_reference,
        }
    }

    /// Index of the slot holding the object; empty for member references
    pub fn index(&self) -> &NodeIndex {
        &self.index
    }

    /// Node of the held object, `None` for null slots
    pub fn target_node(&self) -> Option<NodeHandle> {
        self.target
    }

    /// Node of the held object, but only if it is a reference
    pub fn target(&self) -> Option<NodeHandle> {
        self.target.filter(|_| self.is_object_reference)
    }

    /// Identity of the held object, when its type is identifiable
    pub fn target_id(&self) -> Option<Uuid> {
        self.target_id
    }

    /// Whether the held object is a link rather than an owned value
    pub fn is_object_reference(&self) -> bool {
        self.is_object_reference
    }
}

/// Ordered references of every item of an enumerable node.
///
/// Iteration follows the iteration order of the backing collection. The
/// container rebuilds it after every structural mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceEnumerable {
    items: Vec<ObjectReference>,
}

impl ReferenceEnumerable {
    pub(crate) fn new(items: Vec<ObjectReference>) -> Self {
        Self { items }
    }

    /// Number of item references
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterates the references in collection order
    pub fn iter(&self) -> impl Iterator<Item = &ObjectReference> {
        self.items.iter()
    }

    /// Reference of the item at `index`
    pub fn get(&self, index: &NodeIndex) -> Option<&ObjectReference> {
        self.items.iter().find(|r| r.index() == index)
    }

    /// Indices of every item, in collection order
    pub fn indices(&self) -> Vec<NodeIndex> {
        self.items.iter().map(|r| r.index().clone()).collect()
    }

    /// Returns true if some item references `node`
    pub fn references(&self, node: NodeHandle) -> bool {
        self.items.iter().any(|r| r.target == Some(node))
    }
}

impl<'a> IntoIterator for &'a ReferenceEnumerable {
    type Item = &'a ObjectReference;
    type IntoIter = std::slice::Iter<'a, ObjectReference>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A resolved reference of either shape.
///
/// Member nodes carry [`Reference::Object`]; enumerable object nodes carry
/// [`Reference::Enumerable`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reference {
    /// Single object held by a member slot
    Object(ObjectReference),
    /// References of every item of a collection
    Enumerable(ReferenceEnumerable),
}
