//! Type descriptor service: structural classification of host values.
//!
//! The node graph never inspects host objects directly. It asks the
//! [`TypeDescriptor`] attached to every [`HostRef`](crate::HostRef) what shape
//! the object has (a closed [`DescriptorCategory`]) and reads or mutates it
//! through the per-category operations in [`ops`].
//!
//! # Core Types
//!
//! - [`TypeDescriptor`] - shape of one type, built with a fluent builder
//! - [`MemberDescriptor`] - one declared member of an object type
//! - [`ValueKind`] - declared kind of a slot, drives value coercion
//! - [`TypeDescriptorFactory`] - registry of descriptors and host object factory

use std::fmt;

use crate::value::Value;

pub mod errors;
pub mod factory;
pub mod ops;

pub use errors::DescriptorError;
pub use factory::TypeDescriptorFactory;
pub use ops::convert_value;

/// Structural category of a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DescriptorCategory {
    /// Scalar values (bool, int, float, text, guid)
    Primitive,
    /// Object with named members
    Object,
    /// Ordered list-like collection
    Collection,
    /// Collection keyed by its own item values
    Set,
    /// Keyed collection
    Dictionary,
    /// Fixed-length positional collection
    Array,
}

impl DescriptorCategory {
    /// Returns true for categories whose values hold items
    pub fn is_enumerable(self) -> bool {
        matches!(
            self,
            DescriptorCategory::Collection
                | DescriptorCategory::Set
                | DescriptorCategory::Dictionary
                | DescriptorCategory::Array
        )
    }
}

impl fmt::Display for DescriptorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DescriptorCategory::Primitive => "primitive",
            DescriptorCategory::Object => "object",
            DescriptorCategory::Collection => "collection",
            DescriptorCategory::Set => "set",
            DescriptorCategory::Dictionary => "dictionary",
            DescriptorCategory::Array => "array",
        };
        f.write_str(name)
    }
}

/// Declared kind of a member slot, collection element, or dictionary key/value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Accepts any value
    Any,
    /// Boolean
    Bool,
    /// Integer
    Int,
    /// Float
    Float,
    /// Text (nullable)
    Text,
    /// Guid
    Guid,
    /// Host object assignable to the named type (nullable)
    Object(String),
}

impl ValueKind {
    /// Shorthand for [`ValueKind::Object`]
    pub fn object(type_name: impl Into<String>) -> Self {
        ValueKind::Object(type_name.into())
    }

    /// Returns true if values of this kind may be host objects
    pub fn is_object_like(&self) -> bool {
        matches!(self, ValueKind::Object(_) | ValueKind::Any)
    }

    /// Default value of a slot of this kind
    pub fn default_value(&self) -> Value {
        match self {
            ValueKind::Bool => Value::Bool(false),
            ValueKind::Int => Value::Int(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Guid => Value::Guid(uuid::Uuid::nil()),
            ValueKind::Any | ValueKind::Text | ValueKind::Object(_) => Value::Null,
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Any => f.write_str("any"),
            ValueKind::Bool => f.write_str("bool"),
            ValueKind::Int => f.write_str("int"),
            ValueKind::Float => f.write_str("float"),
            ValueKind::Text => f.write_str("text"),
            ValueKind::Guid => f.write_str("guid"),
            ValueKind::Object(name) => f.write_str(name),
        }
    }
}

/// How a member slot is populated when its owner is instantiated.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum MemberDefault {
    /// The default value of the member kind
    #[default]
    KindDefault,
    /// An explicit primitive value
    Value(Value),
    /// A fresh instance of the member's object type
    NewInstance,
}

/// One declared member of an object type.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    name: String,
    kind: ValueKind,
    non_identifiable_items: bool,
    default: MemberDefault,
}

impl MemberDescriptor {
    /// Declares a member of the given kind
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            non_identifiable_items: false,
            default: MemberDefault::KindDefault,
        }
    }

    /// Marks the collection held by this member as holding owned items.
    ///
    /// Identifiable items of such a collection are inlined values rather than
    /// object references.
    pub fn with_non_identifiable_items(mut self) -> Self {
        self.non_identifiable_items = true;
        self
    }

    /// Uses an explicit default value
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = MemberDefault::Value(value.into());
        self
    }

    /// Creates a fresh instance of the member type when the owner is instantiated
    pub fn instantiated(mut self) -> Self {
        self.default = MemberDefault::NewInstance;
        self
    }

    /// Member name, unique within its owner type
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared kind
    pub fn kind(&self) -> &ValueKind {
        &self.kind
    }

    /// Whether the member carries the non-identifiable items marker
    pub fn has_non_identifiable_items(&self) -> bool {
        self.non_identifiable_items
    }

    /// How the member is populated on instantiation
    pub fn initializer(&self) -> &MemberDefault {
        &self.default
    }
}

/// Shape of a type, as answered by the type descriptor service.
///
/// Built with constructors per category and chained modifiers:
///
/// ```
/// # use quantum::{TypeDescriptor, MemberDescriptor, ValueKind, DescriptorCategory};
/// let part = TypeDescriptor::object("Part")
///     .with_identity("Id")
///     .with_member(MemberDescriptor::new("Name", ValueKind::Text));
/// assert_eq!(part.category(), DescriptorCategory::Object);
/// assert!(part.is_identifiable());
/// assert_eq!(part.members().len(), 2);
///
/// let parts = TypeDescriptor::list("List<Part>", ValueKind::object("Part")).without_remove_at();
/// assert!(parts.is_enumerable());
/// assert!(!parts.has_remove_at());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    name: String,
    category: DescriptorCategory,
    element: ValueKind,
    key: ValueKind,
    members: Vec<MemberDescriptor>,
    identity_member: Option<String>,
    interfaces: Vec<String>,
    has_insert: bool,
    has_remove_at: bool,
    non_identifiable_items: bool,
}

impl TypeDescriptor {
    fn with_category(name: impl Into<String>, category: DescriptorCategory) -> Self {
        Self {
            name: name.into(),
            category,
            element: ValueKind::Any,
            key: ValueKind::Any,
            members: Vec::new(),
            identity_member: None,
            interfaces: Vec::new(),
            has_insert: false,
            has_remove_at: false,
            non_identifiable_items: false,
        }
    }

    /// Descriptor of a primitive kind, named after the kind
    pub fn primitive(kind: ValueKind) -> Self {
        let mut descriptor = Self::with_category(kind.to_string(), DescriptorCategory::Primitive);
        descriptor.element = kind;
        descriptor
    }

    /// Object type with named members
    pub fn object(name: impl Into<String>) -> Self {
        Self::with_category(name, DescriptorCategory::Object)
    }

    /// List-like collection supporting positional insert and removal
    pub fn list(name: impl Into<String>, element: ValueKind) -> Self {
        let mut descriptor = Self::with_category(name, DescriptorCategory::Collection);
        descriptor.element = element;
        descriptor.has_insert = true;
        descriptor.has_remove_at = true;
        descriptor
    }

    /// Set keyed by its (primitive) item values
    pub fn set(name: impl Into<String>, element: ValueKind) -> Self {
        let mut descriptor = Self::with_category(name, DescriptorCategory::Set);
        descriptor.element = element;
        descriptor
    }

    /// Dictionary from `key` to `value`
    pub fn dictionary(name: impl Into<String>, key: ValueKind, value: ValueKind) -> Self {
        let mut descriptor = Self::with_category(name, DescriptorCategory::Dictionary);
        descriptor.key = key;
        descriptor.element = value;
        descriptor
    }

    /// Fixed-length array
    pub fn array(name: impl Into<String>, element: ValueKind) -> Self {
        let mut descriptor = Self::with_category(name, DescriptorCategory::Array);
        descriptor.element = element;
        descriptor
    }

    /// Appends a member declaration
    pub fn with_member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Declares a guid identity member, making instances identifiable
    pub fn with_identity(mut self, member: impl Into<String>) -> Self {
        let member = member.into();
        if !self.members.iter().any(|m| m.name == member) {
            self.members.push(MemberDescriptor::new(member.clone(), ValueKind::Guid));
        }
        self.identity_member = Some(member);
        self
    }

    /// Declares an interface (or base type) instances are assignable to
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Disables positional insertion; inserts fall back to append
    pub fn without_insert(mut self) -> Self {
        self.has_insert = false;
        self
    }

    /// Disables positional removal; removals fall back to removal by value
    pub fn without_remove_at(mut self) -> Self {
        self.has_remove_at = false;
        self
    }

    /// Marks every instance of this collection type as holding owned items
    pub fn with_non_identifiable_items(mut self) -> Self {
        self.non_identifiable_items = true;
        self
    }

    /// Type name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Structural category
    pub fn category(&self) -> DescriptorCategory {
        self.category
    }

    /// Element kind of collections and arrays, value kind of dictionaries
    pub fn element_kind(&self) -> &ValueKind {
        &self.element
    }

    /// Key kind of dictionaries
    pub fn key_kind(&self) -> &ValueKind {
        &self.key
    }

    /// Declared members, in declaration order
    pub fn members(&self) -> &[MemberDescriptor] {
        &self.members
    }

    /// Looks up a member declaration by name
    pub fn member(&self, name: &str) -> Option<&MemberDescriptor> {
        self.members.iter().find(|m| m.name == name)
    }

    /// Name of the identity member, if any
    pub fn identity_member(&self) -> Option<&str> {
        self.identity_member.as_deref()
    }

    /// Returns true if instances carry a stable guid identity
    pub fn is_identifiable(&self) -> bool {
        self.identity_member.is_some()
    }

    /// Returns true if values of this type hold items
    pub fn is_enumerable(&self) -> bool {
        self.category.is_enumerable()
    }

    /// Whether positional insertion is supported
    pub fn has_insert(&self) -> bool {
        self.has_insert
    }

    /// Whether positional removal is supported
    pub fn has_remove_at(&self) -> bool {
        self.has_remove_at
    }

    /// Whether instances are marked as holding owned items
    pub fn has_non_identifiable_items(&self) -> bool {
        self.non_identifiable_items
    }

    /// Returns true if the items of this type may be host objects
    pub fn has_object_items(&self) -> bool {
        self.is_enumerable() && self.element.is_object_like()
    }

    /// Returns true if instances can be stored in a slot declared as `type_name`
    pub fn is_assignable_to(&self, type_name: &str) -> bool {
        self.name == type_name || self.interfaces.iter().any(|i| i == type_name)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.category)
    }
}
