//! Fixture types and helpers shared by the integration tests.

use std::cell::RefCell;

use quantum::{
    ChangeListener, HostRef, ItemContext, MemberContext, MemberDescriptor, NodeChangeEvent,
    NodeContainer, PropertyGraphDefinition, TypeDescriptor, TypeDescriptorFactory, Value,
    ValueKind,
};

pub const REFERENCEABLE: &str = "MyReferenceable";
pub const REFERENCEABLE_LIST: &str = "List<MyReferenceable>";
pub const ASSET_WITH_REF: &str = "MyAssetWithRef";
pub const ASSET_WITH_REF2: &str = "MyAssetWithRef2";
pub const PART: &str = "MyPart";
pub const PART_LIST: &str = "List<MyPart>";
pub const ORPHAN_PART: &str = "MyOrphanPart";
pub const INT_LIST: &str = "List<int>";
pub const INT_BAG: &str = "Bag<int>";
pub const TEXT_SET: &str = "Set<text>";
pub const TEXT_INT_DICT: &str = "Dictionary<text,int>";
pub const FLOAT_ARRAY: &str = "float[]";
pub const SCORES: &str = "Scores";

/// Factory with every fixture type registered
pub fn factory() -> TypeDescriptorFactory {
    let mut factory = TypeDescriptorFactory::new();
    let types = vec![
        TypeDescriptor::object(REFERENCEABLE)
            .with_identity("Id")
            .with_member(MemberDescriptor::new("Value", ValueKind::Text)),
        TypeDescriptor::list(REFERENCEABLE_LIST, ValueKind::object(REFERENCEABLE)),
        TypeDescriptor::object(ASSET_WITH_REF)
            .with_member(MemberDescriptor::new("NonReference", ValueKind::object(REFERENCEABLE)))
            .with_member(MemberDescriptor::new("Reference", ValueKind::object(REFERENCEABLE)))
            .with_member(
                MemberDescriptor::new("References", ValueKind::object(REFERENCEABLE_LIST))
                    .instantiated(),
            )
            .with_member(
                MemberDescriptor::new("OwnedItems", ValueKind::object(REFERENCEABLE_LIST))
                    .with_non_identifiable_items()
                    .instantiated(),
            ),
        TypeDescriptor::object(ASSET_WITH_REF2)
            .with_member(MemberDescriptor::new("NonReference", ValueKind::object(REFERENCEABLE)))
            .with_member(MemberDescriptor::new("Reference", ValueKind::object(REFERENCEABLE)))
            .with_member(
                MemberDescriptor::new("References", ValueKind::object(REFERENCEABLE_LIST))
                    .with_non_identifiable_items()
                    .instantiated(),
            ),
        TypeDescriptor::object(PART)
            .with_identity("Id")
            .with_member(MemberDescriptor::new("Name", ValueKind::Text))
            .with_member(MemberDescriptor::new("Parent", ValueKind::object(PART)))
            .with_member(
                MemberDescriptor::new("Children", ValueKind::object(PART_LIST))
                    .with_non_identifiable_items()
                    .instantiated(),
            ),
        TypeDescriptor::list(PART_LIST, ValueKind::object(PART)),
        TypeDescriptor::object(ORPHAN_PART)
            .with_identity("Id")
            .implements(PART)
            .with_member(MemberDescriptor::new("Name", ValueKind::Text)),
        TypeDescriptor::list(INT_LIST, ValueKind::Int),
        TypeDescriptor::list(INT_BAG, ValueKind::Int)
            .without_insert()
            .without_remove_at(),
        TypeDescriptor::set(TEXT_SET, ValueKind::Text),
        TypeDescriptor::dictionary(TEXT_INT_DICT, ValueKind::Text, ValueKind::Int),
        TypeDescriptor::array(FLOAT_ARRAY, ValueKind::Float),
        TypeDescriptor::object(SCORES)
            .with_member(MemberDescriptor::new("Count", ValueKind::Int).with_default(1))
            .with_member(MemberDescriptor::new("Ratio", ValueKind::Float))
            .with_member(MemberDescriptor::new("Label", ValueKind::Text))
            .with_member(MemberDescriptor::new("Payload", ValueKind::Any))
            .with_member(MemberDescriptor::new("Values", ValueKind::object(INT_LIST)).instantiated())
            .with_member(MemberDescriptor::new("Tags", ValueKind::object(TEXT_SET)).instantiated())
            .with_member(
                MemberDescriptor::new("Lookup", ValueKind::object(TEXT_INT_DICT)).instantiated(),
            ),
    ];
    for descriptor in types {
        factory
            .register(descriptor)
            .expect("Failed to register fixture type");
    }
    factory
}

/// A new referenceable object holding `value`
pub fn referenceable(factory: &TypeDescriptorFactory, value: &str) -> HostRef {
    let host = factory
        .instantiate(REFERENCEABLE)
        .expect("Failed to instantiate referenceable");
    host.set("Value", value).expect("Failed to set Value");
    host
}

/// A new part called `name`
pub fn part(factory: &TypeDescriptorFactory, name: &str) -> HostRef {
    let host = factory.instantiate(PART).expect("Failed to instantiate part");
    host.set("Name", name).expect("Failed to set Name");
    host
}

/// Reads a member holding a host object
pub fn object_member(host: &HostRef, member: &str) -> HostRef {
    host.get(member)
        .expect("Failed to read member")
        .as_object()
        .cloned()
        .expect("Member holds no object")
}

/// Only the member called `Reference` holds a reference.
pub struct MyAssetWithRefDefinition;

impl PropertyGraphDefinition for MyAssetWithRefDefinition {
    fn is_member_reference(&self, member: &MemberContext<'_>, _value: &Value) -> bool {
        member.name() == "Reference"
    }
}

/// Every item of a collection of referenceables is a reference, whatever
/// the collection marker says.
pub struct MyAssetWithRef2Definition;

impl PropertyGraphDefinition for MyAssetWithRef2Definition {
    fn is_member_reference(&self, member: &MemberContext<'_>, _value: &Value) -> bool {
        member.name() == "Reference"
    }

    fn is_item_reference(&self, item: &ItemContext<'_>, _value: &Value) -> bool {
        *item.collection.element_kind() == ValueKind::object(REFERENCEABLE)
    }
}

/// Records every notification, in order, as `(callback, event)`.
#[derive(Default)]
pub struct EventLog {
    pub entries: RefCell<Vec<(&'static str, NodeChangeEvent)>>,
}

impl EventLog {
    pub fn callbacks(&self) -> Vec<&'static str> {
        self.entries.borrow().iter().map(|(name, _)| *name).collect()
    }

    pub fn changed(&self) -> Vec<NodeChangeEvent> {
        self.entries
            .borrow()
            .iter()
            .filter(|(name, _)| *name == "item_changed" || *name == "value_changed")
            .map(|(_, event)| event.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    fn push(&self, name: &'static str, event: &NodeChangeEvent) {
        self.entries.borrow_mut().push((name, event.clone()));
    }
}

impl ChangeListener for EventLog {
    fn prepare_change(&self, _graph: &NodeContainer, event: &NodeChangeEvent) {
        self.push("prepare_change", event);
    }

    fn item_changing(&self, _graph: &NodeContainer, event: &NodeChangeEvent) {
        self.push("item_changing", event);
    }

    fn item_changed(&self, _graph: &NodeContainer, event: &NodeChangeEvent) {
        self.push("item_changed", event);
    }

    fn value_changing(&self, _graph: &NodeContainer, event: &NodeChangeEvent) {
        self.push("value_changing", event);
    }

    fn value_changed(&self, _graph: &NodeContainer, event: &NodeChangeEvent) {
        self.push("value_changed", event);
    }

    fn finalize_change(&self, _graph: &NodeContainer, event: &NodeChangeEvent) {
        self.push("finalize_change", event);
    }
}

/// Integers held by a list host
pub fn ints(host: &HostRef) -> Vec<i64> {
    host.items().iter().filter_map(Value::as_int).collect()
}
