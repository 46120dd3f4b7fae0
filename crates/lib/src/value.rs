//! Host values wrapped by the node graph.
//!
//! The graph never owns the objects it describes. Host applications build
//! their document out of [`HostRef`] objects (shared, interior-mutable and
//! compared by identity) and primitive [`Value`]s; the node graph keeps only
//! [`WeakHost`] handles to them.
//!
//! Every host object carries the [`TypeDescriptor`] that describes its shape,
//! so any value can be classified without a lookup.

use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::{Rc, Weak};

use uuid::Uuid;

use crate::descriptor::{DescriptorError, TypeDescriptor};

/// A value stored in a host object slot, a collection item or a dictionary entry.
///
/// Primitive variants compare by value. [`Value::Object`] compares by identity:
/// two distinct host objects with equal contents are different values.
///
/// ```
/// # use quantum::Value;
/// let text = Value::from("hello");
/// assert_eq!(text.as_text(), Some("hello"));
/// assert!(Value::Null.is_null());
/// assert_eq!(Value::from(3).as_int(), Some(3));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Absent value (a null reference in the host model)
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 text
    Text(String),
    /// Globally unique identifier
    Guid(Uuid),
    /// Shared host object (struct, collection, dictionary...)
    Object(HostRef),
}

impl Value {
    /// Returns true if this is [`Value::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns true if this value is a host object
    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Short name of the variant, or the type name of the host object
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(_) => "int".to_string(),
            Value::Float(_) => "float".to_string(),
            Value::Text(_) => "text".to_string(),
            Value::Guid(_) => "guid".to_string(),
            Value::Object(host) => host.type_name(),
        }
    }

    /// Attempts to read a boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Attempts to read an integer
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Attempts to read a float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Attempts to read text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to read a guid
    pub fn as_guid(&self) -> Option<Uuid> {
        match self {
            Value::Guid(id) => Some(*id),
            _ => None,
        }
    }

    /// Attempts to read a host object
    pub fn as_object(&self) -> Option<&HostRef> {
        match self {
            Value::Object(host) => Some(host),
            _ => None,
        }
    }

    /// Returns true if this value is a host object whose type carries an identity member.
    pub fn is_identifiable(&self) -> bool {
        self.as_object()
            .is_some_and(|host| host.descriptor().is_identifiable())
    }

    /// Converts a primitive value into an item key.
    ///
    /// Floats, nulls and host objects cannot be used as keys.
    pub fn to_index_key(&self) -> Option<IndexKey> {
        match self {
            Value::Bool(b) => Some(IndexKey::Bool(*b)),
            Value::Int(n) => Some(IndexKey::Int(*n)),
            Value::Text(s) => Some(IndexKey::Text(s.clone())),
            Value::Guid(id) => Some(IndexKey::Guid(*id)),
            Value::Null | Value::Float(_) | Value::Object(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(n) => write!(f, "{n}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Guid(id) => write!(f, "{id}"),
            Value::Object(host) => write!(f, "{host:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Uuid> for Value {
    fn from(value: Uuid) -> Self {
        Value::Guid(value)
    }
}

impl From<HostRef> for Value {
    fn from(value: HostRef) -> Self {
        Value::Object(value)
    }
}

impl From<&HostRef> for Value {
    fn from(value: &HostRef) -> Self {
        Value::Object(value.clone())
    }
}

impl From<IndexKey> for Value {
    fn from(value: IndexKey) -> Self {
        match value {
            IndexKey::Bool(b) => Value::Bool(b),
            IndexKey::Int(n) => Value::Int(n),
            IndexKey::Text(s) => Value::Text(s),
            IndexKey::Guid(id) => Value::Guid(id),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Comparable key addressing an item of a collection, set or dictionary.
///
/// Lists and arrays use [`IndexKey::Int`] positions; sets are keyed by their
/// own (primitive) values; dictionaries by their keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndexKey {
    /// Boolean key
    Bool(bool),
    /// Integer key or list position
    Int(i64),
    /// Text key
    Text(String),
    /// Guid key
    Guid(Uuid),
}

impl IndexKey {
    /// Returns the integer position if this key is an [`IndexKey::Int`]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            IndexKey::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the key as a list position, rejecting negative integers
    pub fn as_position(&self) -> Option<usize> {
        self.as_int().and_then(|n| usize::try_from(n).ok())
    }
}

impl From<i64> for IndexKey {
    fn from(n: i64) -> Self {
        IndexKey::Int(n)
    }
}

impl From<bool> for IndexKey {
    fn from(b: bool) -> Self {
        IndexKey::Bool(b)
    }
}

impl From<&str> for IndexKey {
    fn from(s: &str) -> Self {
        IndexKey::Text(s.to_string())
    }
}

impl From<String> for IndexKey {
    fn from(s: String) -> Self {
        IndexKey::Text(s)
    }
}

impl From<Uuid> for IndexKey {
    fn from(id: Uuid) -> Self {
        IndexKey::Guid(id)
    }
}

impl fmt::Display for IndexKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKey::Bool(b) => write!(f, "{b}"),
            IndexKey::Int(n) => write!(f, "{n}"),
            IndexKey::Text(s) => write!(f, "{s:?}"),
            IndexKey::Guid(id) => write!(f, "{id}"),
        }
    }
}

/// Storage of a host object, shaped by its descriptor category.
#[derive(Debug, Clone)]
pub enum HostData {
    /// Declaration-ordered member slots of an object
    Fields(Vec<(String, Value)>),
    /// Items of a list, array or set
    Items(Vec<Value>),
    /// Insertion-ordered dictionary entries
    Entries(Vec<(IndexKey, Value)>),
}

/// A host object: a descriptor plus its storage.
#[derive(Debug)]
pub struct HostObject {
    pub(crate) descriptor: Rc<TypeDescriptor>,
    pub(crate) data: HostData,
}

impl HostObject {
    /// The descriptor of this object
    pub fn descriptor(&self) -> &Rc<TypeDescriptor> {
        &self.descriptor
    }

    /// Read access to the storage
    pub fn data(&self) -> &HostData {
        &self.data
    }
}

/// Shared handle to a host object, compared and hashed by identity.
///
/// Cloning a `HostRef` shares the same object. The node graph only stores
/// [`WeakHost`] handles, so the host application decides how long objects live.
#[derive(Clone)]
pub struct HostRef(Rc<RefCell<HostObject>>);

impl HostRef {
    /// Creates a host object from a descriptor and its storage.
    ///
    /// Prefer [`TypeDescriptorFactory::instantiate`](crate::TypeDescriptorFactory::instantiate),
    /// which validates the storage shape against the descriptor.
    pub fn new(descriptor: Rc<TypeDescriptor>, data: HostData) -> Self {
        HostRef(Rc::new(RefCell::new(HostObject { descriptor, data })))
    }

    /// The descriptor of the object
    pub fn descriptor(&self) -> Rc<TypeDescriptor> {
        Rc::clone(&self.0.borrow().descriptor)
    }

    /// The name of the object's type
    pub fn type_name(&self) -> String {
        self.0.borrow().descriptor.name().to_string()
    }

    /// Reads a member of an object-shaped host through its descriptor.
    pub fn get(&self, member: &str) -> Result<Value, DescriptorError> {
        self.descriptor().get_member(self, member)
    }

    /// Writes a member of an object-shaped host through its descriptor.
    ///
    /// This bypasses the node graph entirely: no change event fires and
    /// references are not resynchronized until the graph is refreshed.
    pub fn set(&self, member: &str, value: impl Into<Value>) -> Result<(), DescriptorError> {
        self.descriptor().set_member(self, member, value.into())
    }

    /// Snapshot of the items of a list, array or set host
    pub fn items(&self) -> Vec<Value> {
        match &self.0.borrow().data {
            HostData::Items(items) => items.clone(),
            HostData::Entries(entries) => entries.iter().map(|(_, v)| v.clone()).collect(),
            HostData::Fields(_) => Vec::new(),
        }
    }

    /// Number of items (or entries) held by an enumerable host
    pub fn len(&self) -> usize {
        match &self.0.borrow().data {
            HostData::Items(items) => items.len(),
            HostData::Entries(entries) => entries.len(),
            HostData::Fields(_) => 0,
        }
    }

    /// Returns true if an enumerable host holds no items
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true if both handles point at the same host object
    pub fn ptr_eq(&self, other: &HostRef) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Creates a non-owning handle
    pub fn downgrade(&self) -> WeakHost {
        WeakHost(Rc::downgrade(&self.0))
    }

    pub(crate) fn borrow(&self) -> Ref<'_, HostObject> {
        self.0.borrow()
    }

    pub(crate) fn borrow_mut(&self) -> RefMut<'_, HostObject> {
        self.0.borrow_mut()
    }

    /// Copy of the storage, for restoring after a failed change
    pub(crate) fn snapshot(&self) -> HostData {
        self.0.borrow().data.clone()
    }

    pub(crate) fn restore(&self, data: HostData) {
        self.0.borrow_mut().data = data;
    }

    /// Identity key of the allocation
    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl PartialEq for HostRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for HostRef {}

impl Hash for HostRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

// Host graphs are routinely cyclic (parent back-links), so Debug never recurses.
impl fmt::Debug for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_borrow() {
            Ok(object) => write!(f, "{}@{:#x}", object.descriptor.name(), self.addr()),
            Err(_) => write!(f, "<borrowed>@{:#x}", self.addr()),
        }
    }
}

/// Non-owning counterpart of [`HostRef`].
#[derive(Clone, Default)]
pub struct WeakHost(Weak<RefCell<HostObject>>);

impl WeakHost {
    /// Returns the host object if it is still alive
    pub fn upgrade(&self) -> Option<HostRef> {
        self.0.upgrade().map(HostRef)
    }

    /// Returns true if the host object has been released
    pub fn is_released(&self) -> bool {
        self.0.strong_count() == 0
    }

    /// Returns true if this handle was created from `host`
    pub fn points_to(&self, host: &HostRef) -> bool {
        std::ptr::eq(self.0.as_ptr(), Rc::as_ptr(&host.0))
    }
}

impl fmt::Debug for WeakHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upgrade() {
            Some(host) => write!(f, "Weak({host:?})"),
            None => write!(f, "Weak(<released>)"),
        }
    }
}
