//! Change notifications.
//!
//! Every mutation made through the [`NodeContainer`] is bracketed by two
//! synchronous notification rounds. Item mutations on object nodes call
//! [`ChangeListener::prepare_change`] then [`ChangeListener::item_changing`]
//! before the host value changes, and [`ChangeListener::item_changed`] then
//! [`ChangeListener::finalize_change`] after references were resynchronized.
//! Member replacements use the `value_*` pair instead of the `item_*` pair.

use std::fmt;

use crate::value::Value;

use super::{NodeContainer, NodeHandle, NodeIndex};

/// Kind of a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeType {
    /// An item was added to a collection or dictionary
    Add,
    /// An item was removed from a collection or dictionary
    Remove,
    /// An item or a member slot was replaced
    Update,
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeType::Add => f.write_str("add"),
            ChangeType::Remove => f.write_str("remove"),
            ChangeType::Update => f.write_str("update"),
        }
    }
}

/// Arguments of a change notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeChangeEvent {
    /// The node being changed
    pub node: NodeHandle,
    /// Changed item; empty for member replacements
    pub index: NodeIndex,
    /// Kind of change
    pub change_type: ChangeType,
    /// Value before the change; null for additions
    pub old_value: Value,
    /// Value after the change; null for removals
    pub new_value: Value,
}

/// Observer of graph mutations.
///
/// All methods default to doing nothing. Listeners run on the mutating
/// caller's stack and receive the container, so they can read the graph.
/// Mutating the node being changed from a listener fails with
/// [`GraphError::ReentrantMutation`](super::GraphError::ReentrantMutation).
pub trait ChangeListener {
    /// First notification of any change
    fn prepare_change(&self, _graph: &NodeContainer, _event: &NodeChangeEvent) {}

    /// An item of an object node is about to change
    fn item_changing(&self, _graph: &NodeContainer, _event: &NodeChangeEvent) {}

    /// An item of an object node changed
    fn item_changed(&self, _graph: &NodeContainer, _event: &NodeChangeEvent) {}

    /// A member slot is about to be replaced
    fn value_changing(&self, _graph: &NodeContainer, _event: &NodeChangeEvent) {}

    /// A member slot was replaced
    fn value_changed(&self, _graph: &NodeContainer, _event: &NodeChangeEvent) {}

    /// Last notification of any change
    fn finalize_change(&self, _graph: &NodeContainer, _event: &NodeChangeEvent) {}
}

/// Subscription token returned by [`NodeContainer::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

/// Which notification pair a change uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChangeScope {
    Item,
    Value,
}
