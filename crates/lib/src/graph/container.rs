//! The node container: node arena, identity registry and read access.

use std::cell::{Cell, Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use slotmap::SlotMap;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::Result;
use crate::config::ContainerConfig;
use crate::definition::{
    DefaultPropertyGraphDefinition, ItemContext, MemberContext, PropertyGraphDefinition,
};
use crate::descriptor::{DescriptorCategory, TypeDescriptor};
use crate::value::{HostRef, Value};

use super::events::{ChangeListener, ChangeScope, ListenerId, NodeChangeEvent};
use super::node::{GraphNode, MemberNode, ObjectNode};
use super::reference::{ObjectReference, Reference, ReferenceEnumerable};
use super::registry::IdentityRegistry;
use super::{GraphError, NodeHandle, NodeIndex};

/// Arena and registry, borrowed as one unit.
#[derive(Debug, Default)]
pub(crate) struct GraphState {
    pub(crate) nodes: SlotMap<NodeHandle, GraphNode>,
    pub(crate) registry: IdentityRegistry,
    registrations: usize,
}

impl GraphState {
    /// Removes an object node and its member nodes; returns false if absent
    fn remove_object(&mut self, node: NodeHandle) -> bool {
        let Some(GraphNode::Object(object)) = self.nodes.remove(node) else {
            return false;
        };
        for (_, member) in object.members() {
            self.nodes.remove(member);
        }
        true
    }
}

/// Owner of every node of a graph.
///
/// The container wraps host objects on demand, one node per live host
/// object, and is the entry point of every read and mutation. Methods take
/// `&self`: listeners receive the container during notifications and can
/// read it freely.
///
/// ```
/// # use quantum::{NodeContainer, TypeDescriptor, TypeDescriptorFactory, MemberDescriptor, ValueKind};
/// let mut factory = TypeDescriptorFactory::new();
/// factory.register(TypeDescriptor::object("Point")
///     .with_member(MemberDescriptor::new("X", ValueKind::Int))).unwrap();
/// let point = factory.instantiate("Point").unwrap();
///
/// let graph = NodeContainer::new();
/// let node = graph.get_or_create_node(&point).unwrap();
/// assert_eq!(graph.get_or_create_node(&point).unwrap(), node);
///
/// let x = graph.member(node, "X").unwrap();
/// graph.update(x, 4, quantum::NodeIndex::Empty).unwrap();
/// assert_eq!(point.get("X").unwrap().as_int(), Some(4));
/// ```
pub struct NodeContainer {
    pub(crate) state: RefCell<GraphState>,
    listeners: RefCell<Vec<(ListenerId, Rc<dyn ChangeListener>)>>,
    next_listener: Cell<u64>,
    config: ContainerConfig,
    default_definition: Rc<dyn PropertyGraphDefinition>,
}

impl Default for NodeContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NodeContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (nodes, registered) = match self.state.try_borrow() {
            Ok(state) => (state.nodes.len(), state.registry.len()),
            Err(_) => (0, 0),
        };
        f.debug_struct("NodeContainer")
            .field("nodes", &nodes)
            .field("registered", &registered)
            .field("listeners", &self.listeners.borrow().len())
            .field("config", &self.config)
            .finish()
    }
}

impl NodeContainer {
    /// Creates an empty container with the default configuration
    pub fn new() -> Self {
        Self::with_config(ContainerConfig::default())
    }

    /// Creates an empty container
    pub fn with_config(config: ContainerConfig) -> Self {
        Self {
            state: RefCell::new(GraphState::default()),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            config,
            default_definition: Rc::new(DefaultPropertyGraphDefinition),
        }
    }

    /// Replaces the definition used by [`get_or_create_node`](Self::get_or_create_node)
    pub fn with_default_definition(mut self, definition: Rc<dyn PropertyGraphDefinition>) -> Self {
        self.default_definition = definition;
        self
    }

    /// The configuration this container was created with
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    pub(crate) fn state(&self) -> Ref<'_, GraphState> {
        self.state.borrow()
    }

    /// Mutable state, or [`GraphError::ReentrantMutation`] if the graph is
    /// currently borrowed
    pub(crate) fn state_mut(&self, node: NodeHandle) -> Result<RefMut<'_, GraphState>> {
        self.state
            .try_borrow_mut()
            .map_err(|_| GraphError::ReentrantMutation { node }.into())
    }

    // === Lookup and construction ===

    /// Node wrapping `host`, if one exists
    pub fn get_node(&self, host: &HostRef) -> Option<NodeHandle> {
        self.state().registry.get(host)
    }

    /// Node wrapping `host`, built with the container's default definition
    /// if it does not exist yet
    pub fn get_or_create_node(&self, host: &HostRef) -> Result<NodeHandle> {
        let definition = Rc::clone(&self.default_definition);
        self.build_object(host, &definition, false)
    }

    /// Node wrapping `host`, built with `definition` if it does not exist yet.
    ///
    /// The definition is propagated to every node created while building the
    /// graph reachable from `host`. Nodes that already exist keep the
    /// definition they were built with. The same holds for the
    /// non-identifiable items marker of a member: a collection node only
    /// carries it when it is first wrapped through that member, so a
    /// collection wrapped earlier on its own keeps classifying its items
    /// without the marker.
    pub fn get_or_create_node_with(
        &self,
        host: &HostRef,
        definition: Rc<dyn PropertyGraphDefinition>,
    ) -> Result<NodeHandle> {
        self.build_object(host, &definition, false)
    }

    fn build_object(
        &self,
        host: &HostRef,
        definition: &Rc<dyn PropertyGraphDefinition>,
        non_identifiable_items: bool,
    ) -> Result<NodeHandle> {
        if let Some(node) = self.get_node(host) {
            return Ok(node);
        }
        let object = ObjectNode::new(host, non_identifiable_items, Rc::clone(definition));
        let descriptor = Rc::clone(object.descriptor());

        // Registered before recursing so cycles resolve to this node
        let (node, sweep_due) = {
            let mut state = self.state_mut(NodeHandle::default())?;
            let node = state.nodes.insert(GraphNode::Object(object));
            if let Some(previous) = state.registry.insert(host, node) {
                warn!(node = ?node, previous = ?previous, "Replaced stale identity registry entry");
                state.remove_object(previous);
            }
            state.registrations += 1;
            let threshold = self.config.sweep_threshold;
            (node, threshold > 0 && state.registrations % threshold == 0)
        };
        debug!(
            node = ?node,
            type_name = %descriptor.name(),
            category = %descriptor.category(),
            "Created object node"
        );
        if sweep_due {
            self.collect_garbage()?;
        }

        let built = self
            .build_members(node, &descriptor)
            .and_then(|()| self.refresh_item_references(node));
        if let Err(err) = built {
            self.discard_object(node, host);
            return Err(err);
        }

        let mut state = self.state_mut(node)?;
        if let Some(object) = state.nodes.get_mut(node).and_then(GraphNode::as_object_mut) {
            object.seal();
        }
        Ok(node)
    }

    fn build_members(&self, node: NodeHandle, descriptor: &Rc<TypeDescriptor>) -> Result<()> {
        if descriptor.category() != DescriptorCategory::Object {
            return Ok(());
        }
        for member in descriptor.members() {
            let member_node = MemberNode::new(node, Rc::clone(descriptor), member.clone());
            let handle = {
                let mut state = self.state_mut(node)?;
                let handle = state.nodes.insert(GraphNode::Member(member_node));
                state
                    .nodes
                    .get_mut(node)
                    .and_then(GraphNode::as_object_mut)
                    .ok_or(GraphError::StaleHandle { node })?
                    .add_member(node, member.name(), handle)?;
                handle
            };
            self.refresh_member_reference(handle)?;
        }
        Ok(())
    }

    fn discard_object(&self, node: NodeHandle, host: &HostRef) {
        if let Ok(mut state) = self.state.try_borrow_mut() {
            state.registry.remove(host);
            state.remove_object(node);
        }
        debug!(node = ?node, "Discarded partially built object node");
    }

    // === Reference resolution ===

    /// Re-resolves the references of `node` against the current host value.
    ///
    /// Mutations made through the container do this automatically. Call it
    /// after changing host objects directly. For an object node, every member
    /// and the item references are refreshed.
    pub fn update_references(&self, node: NodeHandle) -> Result<()> {
        let members = {
            let graph_node = self.node(node)?;
            graph_node
                .as_object()
                .map(|object| object.members().map(|(_, member)| member).collect::<Vec<_>>())
        };
        match members {
            None => self.refresh_member_reference(node),
            Some(members) => {
                for member in members {
                    self.refresh_member_reference(member)?;
                }
                self.refresh_item_references(node)
            }
        }
    }

    pub(crate) fn refresh_member_reference(&self, member: NodeHandle) -> Result<()> {
        let (host, owner_descriptor, descriptor, definition) = {
            let state = self.state();
            let node = Self::member_in(&state, member)?;
            let owner = node.owner();
            let object = state
                .nodes
                .get(owner)
                .and_then(GraphNode::as_object)
                .ok_or(GraphError::StaleHandle { node: owner })?;
            (
                object.host(owner)?,
                Rc::clone(node.owner_descriptor()),
                node.descriptor().clone(),
                Rc::clone(object.definition()),
            )
        };

        let reference = if descriptor.kind().is_object_like() {
            let value = host.get(descriptor.name())?;
            let context = MemberContext {
                owner: &owner_descriptor,
                member: &descriptor,
            };
            let is_reference = definition.is_member_reference(&context, &value);
            match &value {
                Value::Object(target) => {
                    let target_node = self.build_object(
                        target,
                        &definition,
                        descriptor.has_non_identifiable_items(),
                    )?;
                    Some(ObjectReference::new(
                        NodeIndex::Empty,
                        Some(target_node),
                        host_identity(target),
                        is_reference,
                    ))
                }
                Value::Null => Some(ObjectReference::new(NodeIndex::Empty, None, None, is_reference)),
                other if is_reference => {
                    return Err(member_shape_mismatch(&owner_descriptor, descriptor.name(), other));
                }
                _ => None,
            }
        } else {
            None
        };

        trace!(
            node = ?member,
            member = descriptor.name(),
            is_reference = reference.as_ref().is_some_and(ObjectReference::is_object_reference),
            "Resolved member reference"
        );
        let mut state = self.state_mut(member)?;
        if let Some(node) = state.nodes.get_mut(member).and_then(GraphNode::as_member_mut) {
            node.set_reference(reference);
        }
        Ok(())
    }

    pub(crate) fn refresh_item_references(&self, node: NodeHandle) -> Result<()> {
        let (host, descriptor, definition, non_identifiable_items) = {
            let object = self.object(node)?;
            (
                object.host(node)?,
                Rc::clone(object.descriptor()),
                Rc::clone(object.definition()),
                object.has_non_identifiable_items(),
            )
        };
        if !descriptor.has_object_items() {
            return Ok(());
        }

        let keys = descriptor.keys(&host)?;
        let mut items = Vec::with_capacity(keys.len());
        for key in keys {
            let value = descriptor.get_item(&host, &key)?;
            let index = NodeIndex::Key(key);
            let context = ItemContext {
                collection: &descriptor,
                index: &index,
                non_identifiable_items,
            };
            let is_reference = definition.is_item_reference(&context, &value);
            let reference = match &value {
                Value::Object(item) => {
                    let target = self.build_object(item, &definition, false)?;
                    ObjectReference::new(index, Some(target), host_identity(item), is_reference)
                }
                Value::Null => ObjectReference::new(index, None, None, is_reference),
                other if is_reference => {
                    return Err(item_shape_mismatch(&descriptor, &index, other));
                }
                _ => ObjectReference::new(index, None, None, false),
            };
            items.push(reference);
        }

        trace!(node = ?node, count = items.len(), "Resynchronized item references");
        let mut state = self.state_mut(node)?;
        if let Some(object) = state.nodes.get_mut(node).and_then(GraphNode::as_object_mut) {
            object.set_reference(node, Reference::Enumerable(ReferenceEnumerable::new(items)))?;
        }
        Ok(())
    }

    /// Classifies `value` as if it were stored in a slot of `node`, before
    /// anything changes.
    ///
    /// For a member node the slot is the member itself; for an object node
    /// it is the item at `index`. Fails with
    /// [`GraphError::ReferenceShapeMismatch`] when the definition would make
    /// a non-object value a reference, and wraps object values so that
    /// building their nodes cannot fail once the host has been changed.
    pub(crate) fn prepare_slot(
        &self,
        scope: ChangeScope,
        node: NodeHandle,
        index: &NodeIndex,
        value: &Value,
    ) -> Result<()> {
        match scope {
            ChangeScope::Value => {
                let (owner_descriptor, descriptor, definition) = {
                    let state = self.state();
                    let member = Self::member_in(&state, node)?;
                    let owner = member.owner();
                    let object = state
                        .nodes
                        .get(owner)
                        .and_then(GraphNode::as_object)
                        .ok_or(GraphError::StaleHandle { node: owner })?;
                    (
                        Rc::clone(member.owner_descriptor()),
                        member.descriptor().clone(),
                        Rc::clone(object.definition()),
                    )
                };
                if !descriptor.kind().is_object_like() {
                    return Ok(());
                }
                match value {
                    Value::Object(target) => {
                        self.build_object(
                            target,
                            &definition,
                            descriptor.has_non_identifiable_items(),
                        )?;
                    }
                    Value::Null => {}
                    other => {
                        let context = MemberContext {
                            owner: &owner_descriptor,
                            member: &descriptor,
                        };
                        if definition.is_member_reference(&context, other) {
                            return Err(member_shape_mismatch(
                                &owner_descriptor,
                                descriptor.name(),
                                other,
                            ));
                        }
                    }
                }
            }
            ChangeScope::Item => {
                let (descriptor, definition, non_identifiable_items) = {
                    let object = self.object(node)?;
                    (
                        Rc::clone(object.descriptor()),
                        Rc::clone(object.definition()),
                        object.has_non_identifiable_items(),
                    )
                };
                if !descriptor.has_object_items() {
                    return Ok(());
                }
                match value {
                    Value::Object(item) => {
                        self.build_object(item, &definition, false)?;
                    }
                    Value::Null => {}
                    other => {
                        let context = ItemContext {
                            collection: &descriptor,
                            index,
                            non_identifiable_items,
                        };
                        if definition.is_item_reference(&context, other) {
                            return Err(item_shape_mismatch(&descriptor, index, other));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    // === Garbage collection ===

    /// Evicts the nodes of every released host object.
    ///
    /// Returns the number of object nodes removed. Their member nodes are
    /// removed with them; handles to any of them become stale.
    pub fn collect_garbage(&self) -> Result<usize> {
        let mut state = self.state_mut(NodeHandle::default())?;
        let released = state.registry.sweep();
        let removed = released
            .into_iter()
            .filter(|node| state.remove_object(*node))
            .count();
        if removed > 0 {
            debug!(count = removed, remaining = state.nodes.len(), "Collected released nodes");
        }
        Ok(removed)
    }

    /// Number of live nodes, object and member nodes alike
    pub fn node_count(&self) -> usize {
        self.state().nodes.len()
    }

    /// Returns true if `node` addresses a live node
    pub fn contains(&self, node: NodeHandle) -> bool {
        self.state().nodes.contains_key(node)
    }

    // === Node access ===

    fn member_in(state: &GraphState, node: NodeHandle) -> Result<&MemberNode> {
        match state.nodes.get(node) {
            Some(GraphNode::Member(member)) => Ok(member),
            Some(GraphNode::Object(_)) => Err(GraphError::NotAMemberNode { node }.into()),
            None => Err(GraphError::StaleHandle { node }.into()),
        }
    }

    fn kind_error(state: &GraphState, node: NodeHandle, expect_object: bool) -> GraphError {
        match state.nodes.get(node) {
            None => GraphError::StaleHandle { node },
            Some(_) if expect_object => GraphError::NotAnObjectNode { node },
            Some(_) => GraphError::NotAMemberNode { node },
        }
    }

    /// Borrows a node of either kind.
    ///
    /// The borrow must be released before mutating the graph.
    pub fn node(&self, node: NodeHandle) -> Result<Ref<'_, GraphNode>> {
        Ref::filter_map(self.state(), |state| state.nodes.get(node))
            .map_err(|_| GraphError::StaleHandle { node }.into())
    }

    /// Borrows an object node
    pub fn object(&self, node: NodeHandle) -> Result<Ref<'_, ObjectNode>> {
        Ref::filter_map(self.state(), |state| {
            state.nodes.get(node).and_then(GraphNode::as_object)
        })
        .map_err(|state| Self::kind_error(&state, node, true).into())
    }

    /// Borrows a member node
    pub fn member_node(&self, node: NodeHandle) -> Result<Ref<'_, MemberNode>> {
        Ref::filter_map(self.state(), |state| {
            state.nodes.get(node).and_then(GraphNode::as_member)
        })
        .map_err(|state| Self::kind_error(&state, node, false).into())
    }

    /// Stable identifier of a node
    pub fn node_id(&self, node: NodeHandle) -> Result<Uuid> {
        Ok(self.node(node)?.id())
    }

    /// Member node called `name` of an object node.
    ///
    /// Fails with [`GraphError::KeyNotFound`] if the object has no such member.
    pub fn member(&self, node: NodeHandle, name: &str) -> Result<NodeHandle> {
        Ok(self.object(node)?.member(name)?)
    }

    /// Member node called `name`, if the object has one
    pub fn try_member(&self, node: NodeHandle, name: &str) -> Result<Option<NodeHandle>> {
        Ok(self.object(node)?.try_member(name))
    }

    /// Node of the object a member holds, if that object is a reference
    pub fn target(&self, member: NodeHandle) -> Result<Option<NodeHandle>> {
        Ok(self.member_node(member)?.target())
    }

    /// Node of the object a member holds, reference or owned
    pub fn target_node(&self, member: NodeHandle) -> Result<Option<NodeHandle>> {
        Ok(self.member_node(member)?.target_node())
    }

    /// Node of the object at `index` of a reference collection.
    ///
    /// # Errors
    /// - [`GraphError::InvalidIndex`] if `index` is empty or addresses no item
    /// - [`GraphError::NotAReferenceNode`] if the node has no item references
    pub fn indexed_target(
        &self,
        node: NodeHandle,
        index: impl Into<NodeIndex>,
    ) -> Result<Option<NodeHandle>> {
        let index = index.into();
        if index.is_empty() {
            return Err(GraphError::invalid_index("an item index is required").into());
        }
        let object = self.object(node)?;
        let references = object
            .item_references()
            .ok_or(GraphError::NotAReferenceNode { node })?;
        let reference = references
            .get(&index)
            .ok_or_else(|| GraphError::invalid_index(format!("no item at {index}")))?;
        Ok(reference.target_node())
    }

    /// The host object wrapped by an object node
    pub fn host(&self, node: NodeHandle) -> Result<HostRef> {
        Ok(self.object(node)?.host(node)?)
    }

    pub(crate) fn object_parts(&self, node: NodeHandle) -> Result<(HostRef, Rc<TypeDescriptor>)> {
        let object = self.object(node)?;
        Ok((object.host(node)?, Rc::clone(object.descriptor())))
    }

    /// Reads the value of a node, or one of its items.
    ///
    /// With an empty index, object nodes answer their host object and member
    /// nodes the value of their slot. With an item index, the item is read
    /// from that value.
    pub fn retrieve(&self, node: NodeHandle, index: impl Into<NodeIndex>) -> Result<Value> {
        let index = index.into();
        let (host, slot) = {
            let state = self.state();
            match state.nodes.get(node) {
                None => return Err(GraphError::StaleHandle { node }.into()),
                Some(GraphNode::Object(object)) => (object.host(node)?, None),
                Some(GraphNode::Member(member)) => {
                    let owner = member.owner();
                    let host = state
                        .nodes
                        .get(owner)
                        .and_then(GraphNode::as_object)
                        .ok_or(GraphError::StaleHandle { node: owner })?
                        .host(owner)?;
                    (host, Some(member.name().to_string()))
                }
            }
        };
        let value = match slot {
            None => Value::Object(host),
            Some(name) => host.get(&name)?,
        };
        let Some(key) = index.key() else {
            return Ok(value);
        };
        match &value {
            Value::Object(inner) => Ok(inner.descriptor().get_item(inner, key)?),
            other => Err(GraphError::UnsupportedShape {
                operation: "retrieve",
                type_name: other.type_name(),
            }
            .into()),
        }
    }

    /// Indices of the items of an object node.
    ///
    /// Taken from the item references when the node has them, derived from
    /// the host value otherwise. `None` if the value is not enumerable.
    pub fn indices(&self, node: NodeHandle) -> Result<Option<Vec<NodeIndex>>> {
        let (host, descriptor, cached) = {
            let object = self.object(node)?;
            (
                object.host(node)?,
                Rc::clone(object.descriptor()),
                object.item_references().map(ReferenceEnumerable::indices),
            )
        };
        if cached.is_some() {
            return Ok(cached);
        }
        if !descriptor.is_enumerable() {
            return Ok(None);
        }
        Ok(Some(
            descriptor
                .keys(&host)?
                .into_iter()
                .map(NodeIndex::Key)
                .collect(),
        ))
    }

    /// Number of items held by an enumerable object node
    pub fn item_count(&self, node: NodeHandle) -> Result<usize> {
        let (host, descriptor) = self.object_parts(node)?;
        if !descriptor.is_enumerable() {
            return Err(GraphError::UnsupportedShape {
                operation: "item_count",
                type_name: descriptor.name().to_string(),
            }
            .into());
        }
        Ok(descriptor.count(&host)?)
    }

    // === Listeners ===

    /// Registers a listener notified of every mutation
    pub fn subscribe(&self, listener: Rc<dyn ChangeListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, listener));
        id
    }

    /// Removes a listener; returns false if it was not subscribed
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener, _)| *listener != id);
        listeners.len() != before
    }

    fn listener_snapshot(&self) -> Vec<Rc<dyn ChangeListener>> {
        self.listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect()
    }

    pub(crate) fn notify_changing(&self, scope: ChangeScope, event: &NodeChangeEvent) {
        let listeners = self.listener_snapshot();
        for listener in &listeners {
            listener.prepare_change(self, event);
        }
        for listener in &listeners {
            match scope {
                ChangeScope::Item => listener.item_changing(self, event),
                ChangeScope::Value => listener.value_changing(self, event),
            }
        }
    }

    pub(crate) fn notify_changed(&self, scope: ChangeScope, event: &NodeChangeEvent) {
        let listeners = self.listener_snapshot();
        for listener in &listeners {
            match scope {
                ChangeScope::Item => listener.item_changed(self, event),
                ChangeScope::Value => listener.value_changed(self, event),
            }
        }
        for listener in &listeners {
            listener.finalize_change(self, event);
        }
    }
}

fn member_shape_mismatch(owner: &TypeDescriptor, member: &str, value: &Value) -> crate::Error {
    GraphError::ReferenceShapeMismatch {
        type_name: owner.name().to_string(),
        slot: member.to_string(),
        reason: format!("a {} value cannot be an object reference", value.type_name()),
    }
    .into()
}

fn item_shape_mismatch(collection: &TypeDescriptor, index: &NodeIndex, value: &Value) -> crate::Error {
    GraphError::ReferenceShapeMismatch {
        type_name: collection.name().to_string(),
        slot: index.to_string(),
        reason: format!("a {} item cannot be an object reference", value.type_name()),
    }
    .into()
}

/// Identity guid of an identifiable host object
pub(crate) fn host_identity(host: &HostRef) -> Option<Uuid> {
    let descriptor = host.descriptor();
    let member = descriptor.identity_member()?;
    host.get(member).ok().and_then(|id| id.as_guid())
}
