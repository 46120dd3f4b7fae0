//! Registry of type descriptors and factory for host objects.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;
use uuid::Uuid;

use crate::value::{HostData, HostRef, IndexKey, Value};

use super::{DescriptorCategory, DescriptorError, MemberDefault, TypeDescriptor, ValueKind};

/// Registry of [`TypeDescriptor`]s addressed by type name.
///
/// Descriptors are registered once at startup, then shared. The factory also
/// creates host objects with storage matching their descriptor.
#[derive(Debug, Default)]
pub struct TypeDescriptorFactory {
    types: HashMap<String, Rc<TypeDescriptor>>,
}

impl TypeDescriptorFactory {
    /// Creates an empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor. Fails if the name is already taken.
    pub fn register(
        &mut self,
        descriptor: TypeDescriptor,
    ) -> Result<Rc<TypeDescriptor>, DescriptorError> {
        let name = descriptor.name().to_string();
        if self.types.contains_key(&name) {
            return Err(DescriptorError::DuplicateType { name });
        }
        debug!(type_name = %name, category = %descriptor.category(), "Registered type descriptor");
        let descriptor = Rc::new(descriptor);
        self.types.insert(name, Rc::clone(&descriptor));
        Ok(descriptor)
    }

    /// Finds a registered descriptor by name
    pub fn find(&self, name: &str) -> Result<Rc<TypeDescriptor>, DescriptorError> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| DescriptorError::UnknownType {
                name: name.to_string(),
            })
    }

    /// Returns true if a descriptor is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Describes any value: host objects answer their own descriptor,
    /// primitives a primitive descriptor of their kind.
    pub fn describe(&self, value: &Value) -> Rc<TypeDescriptor> {
        let kind = match value {
            Value::Object(host) => return host.descriptor(),
            Value::Null => ValueKind::Any,
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Text(_) => ValueKind::Text,
            Value::Guid(_) => ValueKind::Guid,
        };
        Rc::new(TypeDescriptor::primitive(kind))
    }

    /// Creates a new host object of the named type.
    ///
    /// Object members are populated from their declared defaults; identity
    /// members receive a fresh guid; enumerable types start empty.
    pub fn instantiate(&self, name: &str) -> Result<HostRef, DescriptorError> {
        let descriptor = self.find(name)?;
        let data = match descriptor.category() {
            DescriptorCategory::Object => {
                let mut fields = Vec::with_capacity(descriptor.members().len());
                for member in descriptor.members() {
                    let value = if descriptor.identity_member() == Some(member.name()) {
                        Value::Guid(Uuid::new_v4())
                    } else {
                        match member.initializer() {
                            MemberDefault::KindDefault => member.kind().default_value(),
                            MemberDefault::Value(value) => value.clone(),
                            MemberDefault::NewInstance => match member.kind() {
                                ValueKind::Object(type_name) => {
                                    Value::Object(self.instantiate(type_name)?)
                                }
                                other => other.default_value(),
                            },
                        }
                    };
                    fields.push((member.name().to_string(), value));
                }
                HostData::Fields(fields)
            }
            DescriptorCategory::Dictionary => HostData::Entries(Vec::new()),
            DescriptorCategory::Collection
            | DescriptorCategory::Set
            | DescriptorCategory::Array => HostData::Items(Vec::new()),
            DescriptorCategory::Primitive => {
                return Err(DescriptorError::UnsupportedOperation {
                    operation: "instantiate",
                    type_name: name.to_string(),
                });
            }
        };
        Ok(HostRef::new(descriptor, data))
    }

    /// Creates a list, set or array host holding `items`, coerced to the element kind.
    pub fn new_collection(&self, name: &str, items: Vec<Value>) -> Result<HostRef, DescriptorError> {
        let host = self.instantiate(name)?;
        let descriptor = host.descriptor();
        match descriptor.category() {
            DescriptorCategory::Collection | DescriptorCategory::Set => {
                for item in items {
                    descriptor.add(&host, item)?;
                }
            }
            DescriptorCategory::Array => {
                let items = items
                    .into_iter()
                    .map(|item| super::convert_value(item, descriptor.element_kind()))
                    .collect::<Result<Vec<_>, _>>()?;
                host.borrow_mut().data = HostData::Items(items);
            }
            _ => {
                return Err(DescriptorError::UnsupportedOperation {
                    operation: "new_collection",
                    type_name: name.to_string(),
                });
            }
        }
        Ok(host)
    }

    /// Creates a dictionary host holding `entries`.
    pub fn new_dictionary(
        &self,
        name: &str,
        entries: Vec<(IndexKey, Value)>,
    ) -> Result<HostRef, DescriptorError> {
        let host = self.instantiate(name)?;
        let descriptor = host.descriptor();
        for (key, value) in entries {
            descriptor.add_entry(&host, key, value)?;
        }
        Ok(host)
    }
}
