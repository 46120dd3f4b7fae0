//! Mutation entry points of the node container.

use tracing::{debug, trace, warn};

use crate::Result;
use crate::descriptor::{DescriptorCategory, DescriptorError, TypeDescriptor, convert_value};
use crate::value::{HostRef, Value};

use super::events::{ChangeScope, ChangeType, NodeChangeEvent};
use super::node::GraphNode;
use super::{GraphError, NodeContainer, NodeHandle, NodeIndex};

/// Marks a node as being mutated until dropped.
struct MutationGuard<'a> {
    graph: &'a NodeContainer,
    node: NodeHandle,
}

impl Drop for MutationGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.graph.state.try_borrow_mut() {
            if let Some(node) = state.nodes.get_mut(self.node) {
                node.set_mutating(false);
            }
        }
    }
}

fn unsupported(operation: &'static str, descriptor: &TypeDescriptor) -> crate::Error {
    GraphError::UnsupportedShape {
        operation,
        type_name: descriptor.name().to_string(),
    }
    .into()
}

impl NodeContainer {
    fn begin_mutation(&self, node: NodeHandle) -> Result<MutationGuard<'_>> {
        let mut state = self.state_mut(node)?;
        let graph_node = state
            .nodes
            .get_mut(node)
            .ok_or(GraphError::StaleHandle { node })?;
        if graph_node.is_mutating() {
            return Err(GraphError::ReentrantMutation { node }.into());
        }
        graph_node.set_mutating(true);
        Ok(MutationGuard { graph: self, node })
    }

    fn resync(&self, scope: ChangeScope, node: NodeHandle) -> Result<()> {
        match scope {
            ChangeScope::Item => self.refresh_item_references(node),
            ChangeScope::Value => self.refresh_member_reference(node),
        }
    }

    /// Notifies, applies `mutate` to `host`, resynchronizes references,
    /// notifies again.
    ///
    /// The new value is classified before any listener is notified, so a
    /// value the definition cannot accept fails without side effects. If
    /// `mutate` or the resync still fails, `host` is restored and its
    /// references resynchronized again before the error is returned.
    fn commit(
        &self,
        scope: ChangeScope,
        host: &HostRef,
        event: NodeChangeEvent,
        mutate: impl FnOnce() -> Result<()>,
    ) -> Result<()> {
        self.prepare_slot(scope, event.node, &event.index, &event.new_value)?;
        self.notify_changing(scope, &event);

        let snapshot = host.snapshot();
        if let Err(err) = mutate().and_then(|()| self.resync(scope, event.node)) {
            warn!(node = ?event.node, error = %err, "Change failed, restoring host value");
            host.restore(snapshot);
            if let Err(resync) = self.resync(scope, event.node) {
                warn!(node = ?event.node, error = %resync, "Resync after restore failed");
            }
            return Err(err);
        }
        debug!(
            node = ?event.node,
            index = %event.index,
            change = %event.change_type,
            "Applied change"
        );
        self.notify_changed(scope, &event);
        Ok(())
    }

    /// Appends an item to a list, or adds it to a set.
    ///
    /// List items land at the current count; set items are indexed by their
    /// own value. Adding a value a set already holds changes nothing and
    /// notifies nobody.
    ///
    /// # Errors
    /// - [`GraphError::UnsupportedShape`] if the node is not a list or set
    /// - [`GraphError::ReentrantMutation`] if the node is already being mutated
    pub fn add(&self, node: NodeHandle, item: impl Into<Value>) -> Result<()> {
        self.insert_item(node, item.into(), None)
    }

    /// Adds an item at `index`.
    ///
    /// For lists, `index` is a position: the item is inserted there, or
    /// appended when the list does not support positional insertion or the
    /// position equals the count. For dictionaries, `index` is the key of a
    /// new entry. Sets ignore `index`.
    pub fn add_at(
        &self,
        node: NodeHandle,
        item: impl Into<Value>,
        index: impl Into<NodeIndex>,
    ) -> Result<()> {
        self.insert_item(node, item.into(), Some(index.into()))
    }

    fn insert_item(&self, node: NodeHandle, item: Value, index: Option<NodeIndex>) -> Result<()> {
        let _guard = self.begin_mutation(node)?;
        let (host, descriptor) = self.object_parts(node)?;

        match descriptor.category() {
            DescriptorCategory::Collection => {
                let item = convert_value(item, descriptor.element_kind())?;
                let count = descriptor.count(&host)?;
                let position = match index.as_ref().and_then(NodeIndex::key) {
                    Some(key) if descriptor.has_insert() => key.as_position().ok_or_else(|| {
                        GraphError::invalid_index(format!("{key} is not a list position"))
                    })?,
                    // Lists without positional insert always append
                    _ => count,
                };
                if position > count {
                    return Err(GraphError::invalid_index(format!(
                        "position {position} is past the end of {count} items"
                    ))
                    .into());
                }
                let append = position == count;
                let event = NodeChangeEvent {
                    node,
                    index: NodeIndex::from(if append { count } else { position }),
                    change_type: ChangeType::Add,
                    old_value: Value::Null,
                    new_value: item.clone(),
                };
                self.commit(ChangeScope::Item, &host, event, || {
                    if append {
                        descriptor.add(&host, item)?;
                    } else {
                        descriptor.insert(&host, position, item)?;
                    }
                    Ok(())
                })
            }
            DescriptorCategory::Set => {
                let item = convert_value(item, descriptor.element_kind())?;
                let key = item.to_index_key().ok_or_else(|| {
                    GraphError::invalid_index(format!("a {} item cannot key a set", item.type_name()))
                })?;
                if descriptor.contains(&host, &item)? {
                    trace!(node = ?node, item = %item, "Set already holds item");
                    return Ok(());
                }
                let event = NodeChangeEvent {
                    node,
                    index: NodeIndex::Key(key),
                    change_type: ChangeType::Add,
                    old_value: Value::Null,
                    new_value: item.clone(),
                };
                self.commit(ChangeScope::Item, &host, event, || Ok(descriptor.add(&host, item)?))
            }
            DescriptorCategory::Dictionary => {
                let Some(index) = index else {
                    return Err(unsupported("add", &descriptor));
                };
                let Some(key) = index.key().cloned() else {
                    return Err(GraphError::invalid_index("a dictionary key is required").into());
                };
                convert_value(key.clone().into(), descriptor.key_kind())?;
                let item = convert_value(item, descriptor.element_kind())?;
                if descriptor.get_item(&host, &key).is_ok() {
                    return Err(DescriptorError::DuplicateKey {
                        type_name: descriptor.name().to_string(),
                        key: key.to_string(),
                    }
                    .into());
                }
                let event = NodeChangeEvent {
                    node,
                    index,
                    change_type: ChangeType::Add,
                    old_value: Value::Null,
                    new_value: item.clone(),
                };
                self.commit(ChangeScope::Item, &host, event, || {
                    Ok(descriptor.add_entry(&host, key, item)?)
                })
            }
            _ => Err(unsupported("add", &descriptor)),
        }
    }

    /// Removes `item` found at `index`.
    ///
    /// Lists supporting positional removal remove at `index`; other lists and
    /// sets remove by value. Dictionaries remove the entry keyed by `index`.
    ///
    /// # Errors
    /// - [`GraphError::InvalidIndex`] if `index` is empty or addresses no item
    /// - [`GraphError::UnsupportedShape`] if the node holds no removable items
    pub fn remove(
        &self,
        node: NodeHandle,
        item: impl Into<Value>,
        index: impl Into<NodeIndex>,
    ) -> Result<()> {
        let index = index.into();
        let item = item.into();
        let Some(key) = index.key().cloned() else {
            return Err(GraphError::invalid_index("an item index is required to remove an item").into());
        };
        let _guard = self.begin_mutation(node)?;
        let (host, descriptor) = self.object_parts(node)?;
        let event = NodeChangeEvent {
            node,
            index,
            change_type: ChangeType::Remove,
            old_value: item.clone(),
            new_value: Value::Null,
        };

        match descriptor.category() {
            DescriptorCategory::Collection if descriptor.has_remove_at() => {
                let count = descriptor.count(&host)?;
                let position = key.as_position().filter(|p| *p < count).ok_or_else(|| {
                    GraphError::invalid_index(format!("no item at {key} of {count} items"))
                })?;
                self.commit(ChangeScope::Item, &host, event, || {
                    descriptor.remove_at(&host, position)?;
                    Ok(())
                })
            }
            DescriptorCategory::Collection | DescriptorCategory::Set => {
                if !descriptor.contains(&host, &item)? {
                    return Err(DescriptorError::KeyNotFound {
                        type_name: descriptor.name().to_string(),
                        key: item.to_string(),
                    }
                    .into());
                }
                self.commit(ChangeScope::Item, &host, event, || {
                    descriptor.remove(&host, &item)?;
                    Ok(())
                })
            }
            DescriptorCategory::Dictionary => {
                descriptor.get_item(&host, &key)?;
                self.commit(ChangeScope::Item, &host, event, || {
                    descriptor.remove_entry(&host, &key)?;
                    Ok(())
                })
            }
            _ => Err(unsupported("remove", &descriptor)),
        }
    }

    /// Replaces a value.
    ///
    /// On a member node, an empty index replaces the whole slot; an item
    /// index replaces an item of the object the member holds. On an object
    /// node, the index must address an item: the node's own value cannot be
    /// replaced, update the member holding it instead.
    ///
    /// Values are coerced to the declared kind of the slot. Updating a set
    /// with a value it already holds changes nothing and notifies nobody.
    ///
    /// # Errors
    /// - [`GraphError::InvalidIndex`] for an empty index on an object node
    /// - [`GraphError::UnsupportedShape`] if the node holds no items
    pub fn update(
        &self,
        node: NodeHandle,
        value: impl Into<Value>,
        index: impl Into<NodeIndex>,
    ) -> Result<()> {
        let index = index.into();
        let value = value.into();
        let is_member = matches!(&*self.node(node)?, GraphNode::Member(_));
        if !is_member {
            return self.update_item(node, value, index);
        }
        if index.is_empty() {
            return self.update_member(node, value);
        }
        let target = self.target_node(node)?.ok_or_else(|| {
            GraphError::invalid_index(format!("the member holds no object to index with {index}"))
        })?;
        self.update_item(target, value, index)
    }

    fn update_item(&self, node: NodeHandle, value: Value, index: NodeIndex) -> Result<()> {
        let Some(key) = index.key().cloned() else {
            return Err(GraphError::invalid_index(
                "an object node value cannot be replaced, update the member holding it",
            )
            .into());
        };
        let _guard = self.begin_mutation(node)?;
        let (host, descriptor) = self.object_parts(node)?;
        if !descriptor.is_enumerable() {
            return Err(unsupported("update", &descriptor));
        }
        let value = convert_value(value, descriptor.element_kind())?;
        if descriptor.category() == DescriptorCategory::Set && descriptor.contains(&host, &value)? {
            trace!(node = ?node, value = %value, "Set already holds value");
            return Ok(());
        }
        let old_value = descriptor.get_item(&host, &key)?;
        let event = NodeChangeEvent {
            node,
            index,
            change_type: ChangeType::Update,
            old_value,
            new_value: value.clone(),
        };
        self.commit(ChangeScope::Item, &host, event, || {
            Ok(descriptor.set_item(&host, &key, value)?)
        })
    }

    fn update_member(&self, member: NodeHandle, value: Value) -> Result<()> {
        let _guard = self.begin_mutation(member)?;
        let (owner, descriptor) = {
            let node = self.member_node(member)?;
            (node.owner(), node.descriptor().clone())
        };
        let (host, owner_descriptor) = self.object_parts(owner)?;
        let value = convert_value(value, descriptor.kind())?;
        let old_value = host.get(descriptor.name())?;
        let event = NodeChangeEvent {
            node: member,
            index: NodeIndex::Empty,
            change_type: ChangeType::Update,
            old_value,
            new_value: value.clone(),
        };
        self.commit(ChangeScope::Value, &host, event, || {
            Ok(owner_descriptor.set_member(&host, descriptor.name(), value)?)
        })
    }
}
