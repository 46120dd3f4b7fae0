//! Per-category operations of the type descriptor service.
//!
//! Each operation dispatches once on [`DescriptorCategory`]; a category that
//! does not advertise an operation answers
//! [`DescriptorError::UnsupportedOperation`]. Values written into a slot are
//! coerced to the slot's declared [`ValueKind`] with [`convert_value`].

use crate::value::{HostData, HostRef, IndexKey, Value};

use super::{DescriptorCategory, DescriptorError, TypeDescriptor, ValueKind};

/// Coerces `value` into a slot declared as `kind`.
///
/// Integers widen to floats; integral-range floats narrow to integers with
/// rounding. `Null` is accepted by nullable kinds (text, objects, any). Host
/// objects must be assignable to the declared object type.
///
/// ```
/// # use quantum::{convert_value, Value, ValueKind};
/// assert_eq!(convert_value(Value::Int(2), &ValueKind::Float).unwrap(), Value::Float(2.0));
/// assert_eq!(convert_value(Value::Float(2.6), &ValueKind::Int).unwrap(), Value::Int(3));
/// assert!(convert_value(Value::from("x"), &ValueKind::Int).is_err());
/// ```
pub fn convert_value(value: Value, kind: &ValueKind) -> Result<Value, DescriptorError> {
    let mismatch = |value: &Value| DescriptorError::TypeMismatch {
        expected: kind.to_string(),
        actual: value.type_name(),
    };
    match (kind, value) {
        (ValueKind::Any, value) => Ok(value),
        (ValueKind::Bool, value @ Value::Bool(_))
        | (ValueKind::Int, value @ Value::Int(_))
        | (ValueKind::Float, value @ Value::Float(_))
        | (ValueKind::Guid, value @ Value::Guid(_))
        | (ValueKind::Text, value @ (Value::Text(_) | Value::Null))
        | (ValueKind::Object(_), value @ Value::Null) => Ok(value),
        (ValueKind::Float, Value::Int(n)) => Ok(Value::Float(n as f64)),
        (ValueKind::Int, Value::Float(x)) => {
            let rounded = x.round();
            let in_range =
                rounded.is_finite() && rounded >= i64::MIN as f64 && rounded < i64::MAX as f64;
            if in_range {
                Ok(Value::Int(rounded as i64))
            } else {
                Err(mismatch(&Value::Float(x)))
            }
        }
        (ValueKind::Object(type_name), Value::Object(host)) => {
            if host.descriptor().is_assignable_to(type_name) {
                Ok(Value::Object(host))
            } else {
                Err(mismatch(&Value::Object(host)))
            }
        }
        (_, value) => Err(mismatch(&value)),
    }
}

impl TypeDescriptor {
    fn unsupported(&self, operation: &'static str) -> DescriptorError {
        DescriptorError::UnsupportedOperation {
            operation,
            type_name: self.name().to_string(),
        }
    }

    fn out_of_range(&self, index: i64, count: usize) -> DescriptorError {
        DescriptorError::IndexOutOfRange {
            type_name: self.name().to_string(),
            index,
            count,
        }
    }

    fn key_not_found(&self, key: &IndexKey) -> DescriptorError {
        DescriptorError::KeyNotFound {
            type_name: self.name().to_string(),
            key: key.to_string(),
        }
    }

    fn position(&self, key: &IndexKey, count: usize) -> Result<usize, DescriptorError> {
        let Some(n) = key.as_int() else {
            return Err(DescriptorError::TypeMismatch {
                expected: "int".to_string(),
                actual: key.to_string(),
            });
        };
        usize::try_from(n)
            .ok()
            .filter(|p| *p < count)
            .ok_or_else(|| self.out_of_range(n, count))
    }

    fn set_key(&self, item: &Value) -> Result<IndexKey, DescriptorError> {
        item.to_index_key()
            .ok_or_else(|| DescriptorError::TypeMismatch {
                expected: format!("{} (keyable)", self.element_kind()),
                actual: item.type_name(),
            })
    }

    /// Reads a member of an object host.
    pub fn get_member(&self, host: &HostRef, name: &str) -> Result<Value, DescriptorError> {
        if self.category() != DescriptorCategory::Object {
            return Err(self.unsupported("get_member"));
        }
        match &host.borrow().data {
            HostData::Fields(fields) => fields
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| DescriptorError::UnknownMember {
                    type_name: self.name().to_string(),
                    member: name.to_string(),
                }),
            _ => Err(self.unsupported("get_member")),
        }
    }

    /// Writes a member of an object host, coercing to the declared member kind.
    pub fn set_member(
        &self,
        host: &HostRef,
        name: &str,
        value: Value,
    ) -> Result<(), DescriptorError> {
        if self.category() != DescriptorCategory::Object {
            return Err(self.unsupported("set_member"));
        }
        let member = self.member(name).ok_or_else(|| DescriptorError::UnknownMember {
            type_name: self.name().to_string(),
            member: name.to_string(),
        })?;
        let value = convert_value(value, member.kind())?;
        let mut object = host.borrow_mut();
        let HostData::Fields(fields) = &mut object.data else {
            return Err(self.unsupported("set_member"));
        };
        match fields.iter_mut().find(|(n, _)| n == name) {
            Some((_, slot)) => *slot = value,
            None => fields.push((name.to_string(), value)),
        }
        Ok(())
    }

    /// Number of items of an enumerable host.
    pub fn count(&self, host: &HostRef) -> Result<usize, DescriptorError> {
        if !self.is_enumerable() {
            return Err(self.unsupported("count"));
        }
        Ok(host.len())
    }

    /// Keys of every item, in iteration order.
    ///
    /// Lists and arrays answer positions, sets their item values, dictionaries their keys.
    pub fn keys(&self, host: &HostRef) -> Result<Vec<IndexKey>, DescriptorError> {
        let object = host.borrow();
        match (self.category(), &object.data) {
            (DescriptorCategory::Collection | DescriptorCategory::Array, HostData::Items(items)) => {
                Ok((0..items.len())
                    .map(|i| IndexKey::Int(i64::try_from(i).unwrap_or(i64::MAX)))
                    .collect())
            }
            (DescriptorCategory::Set, HostData::Items(items)) => {
                items.iter().map(|item| self.set_key(item)).collect()
            }
            (DescriptorCategory::Dictionary, HostData::Entries(entries)) => {
                Ok(entries.iter().map(|(k, _)| k.clone()).collect())
            }
            _ => Err(self.unsupported("keys")),
        }
    }

    /// Reads the item addressed by `key`.
    pub fn get_item(&self, host: &HostRef, key: &IndexKey) -> Result<Value, DescriptorError> {
        let object = host.borrow();
        match (self.category(), &object.data) {
            (DescriptorCategory::Collection | DescriptorCategory::Array, HostData::Items(items)) => {
                let position = self.position(key, items.len())?;
                Ok(items[position].clone())
            }
            (DescriptorCategory::Set, HostData::Items(items)) => items
                .iter()
                .find(|item| item.to_index_key().as_ref() == Some(key))
                .cloned()
                .ok_or_else(|| self.key_not_found(key)),
            (DescriptorCategory::Dictionary, HostData::Entries(entries)) => entries
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
                .ok_or_else(|| self.key_not_found(key)),
            _ => Err(self.unsupported("get_item")),
        }
    }

    /// Replaces the item addressed by `key`.
    ///
    /// Dictionaries insert the entry when the key is absent. Sets replace the
    /// item whose value equals the key.
    pub fn set_item(
        &self,
        host: &HostRef,
        key: &IndexKey,
        value: Value,
    ) -> Result<(), DescriptorError> {
        let value = convert_value(value, self.element_kind())?;
        if self.category() == DescriptorCategory::Set {
            self.set_key(&value)?;
        }
        let mut object = host.borrow_mut();
        match (self.category(), &mut object.data) {
            (DescriptorCategory::Collection | DescriptorCategory::Array, HostData::Items(items)) => {
                let position = self.position(key, items.len())?;
                items[position] = value;
                Ok(())
            }
            (DescriptorCategory::Set, HostData::Items(items)) => {
                let position = items
                    .iter()
                    .position(|item| item.to_index_key().as_ref() == Some(key))
                    .ok_or_else(|| self.key_not_found(key))?;
                items[position] = value;
                Ok(())
            }
            (DescriptorCategory::Dictionary, HostData::Entries(entries)) => {
                convert_value(key.clone().into(), self.key_kind())?;
                match entries.iter_mut().find(|(k, _)| k == key) {
                    Some((_, slot)) => *slot = value,
                    None => entries.push((key.clone(), value)),
                }
                Ok(())
            }
            _ => Err(self.unsupported("set_item")),
        }
    }

    /// Appends an item to a list, or adds it to a set (no-op if already present).
    pub fn add(&self, host: &HostRef, item: Value) -> Result<(), DescriptorError> {
        let item = convert_value(item, self.element_kind())?;
        let mut object = host.borrow_mut();
        match (self.category(), &mut object.data) {
            (DescriptorCategory::Collection, HostData::Items(items)) => {
                items.push(item);
                Ok(())
            }
            (DescriptorCategory::Set, HostData::Items(items)) => {
                self.set_key(&item)?;
                if !items.contains(&item) {
                    items.push(item);
                }
                Ok(())
            }
            _ => Err(self.unsupported("add")),
        }
    }

    /// Inserts an item at `position` of a list supporting positional insertion.
    pub fn insert(
        &self,
        host: &HostRef,
        position: usize,
        item: Value,
    ) -> Result<(), DescriptorError> {
        if self.category() != DescriptorCategory::Collection || !self.has_insert() {
            return Err(self.unsupported("insert"));
        }
        let item = convert_value(item, self.element_kind())?;
        let mut object = host.borrow_mut();
        let HostData::Items(items) = &mut object.data else {
            return Err(self.unsupported("insert"));
        };
        if position > items.len() {
            return Err(self.out_of_range(i64::try_from(position).unwrap_or(i64::MAX), items.len()));
        }
        items.insert(position, item);
        Ok(())
    }

    /// Removes the first item equal to `item`. Returns false if nothing matched.
    pub fn remove(&self, host: &HostRef, item: &Value) -> Result<bool, DescriptorError> {
        let mut object = host.borrow_mut();
        match (self.category(), &mut object.data) {
            (DescriptorCategory::Collection | DescriptorCategory::Set, HostData::Items(items)) => {
                match items.iter().position(|i| i == item) {
                    Some(position) => {
                        items.remove(position);
                        Ok(true)
                    }
                    None => Ok(false),
                }
            }
            _ => Err(self.unsupported("remove")),
        }
    }

    /// Removes and returns the item at `position` of a list supporting positional removal.
    pub fn remove_at(&self, host: &HostRef, position: usize) -> Result<Value, DescriptorError> {
        if self.category() != DescriptorCategory::Collection || !self.has_remove_at() {
            return Err(self.unsupported("remove_at"));
        }
        let mut object = host.borrow_mut();
        let HostData::Items(items) = &mut object.data else {
            return Err(self.unsupported("remove_at"));
        };
        if position >= items.len() {
            return Err(self.out_of_range(i64::try_from(position).unwrap_or(i64::MAX), items.len()));
        }
        Ok(items.remove(position))
    }

    /// Adds a new dictionary entry. Fails if the key is already present.
    pub fn add_entry(
        &self,
        host: &HostRef,
        key: IndexKey,
        value: Value,
    ) -> Result<(), DescriptorError> {
        if self.category() != DescriptorCategory::Dictionary {
            return Err(self.unsupported("add_entry"));
        }
        convert_value(key.clone().into(), self.key_kind())?;
        let value = convert_value(value, self.element_kind())?;
        let mut object = host.borrow_mut();
        let HostData::Entries(entries) = &mut object.data else {
            return Err(self.unsupported("add_entry"));
        };
        if entries.iter().any(|(k, _)| *k == key) {
            return Err(DescriptorError::DuplicateKey {
                type_name: self.name().to_string(),
                key: key.to_string(),
            });
        }
        entries.push((key, value));
        Ok(())
    }

    /// Removes and returns the dictionary entry for `key`.
    pub fn remove_entry(&self, host: &HostRef, key: &IndexKey) -> Result<Value, DescriptorError> {
        if self.category() != DescriptorCategory::Dictionary {
            return Err(self.unsupported("remove_entry"));
        }
        let mut object = host.borrow_mut();
        let HostData::Entries(entries) = &mut object.data else {
            return Err(self.unsupported("remove_entry"));
        };
        let position = entries
            .iter()
            .position(|(k, _)| k == key)
            .ok_or_else(|| self.key_not_found(key))?;
        Ok(entries.remove(position).1)
    }

    /// Returns true if a list or set holds an item equal to `item`.
    pub fn contains(&self, host: &HostRef, item: &Value) -> Result<bool, DescriptorError> {
        match self.category() {
            DescriptorCategory::Collection | DescriptorCategory::Set | DescriptorCategory::Array => {
                Ok(host.borrow_items_contains(item))
            }
            DescriptorCategory::Dictionary => {
                let key = item.to_index_key();
                Ok(key.is_some_and(|key| self.get_item(host, &key).is_ok()))
            }
            _ => Err(self.unsupported("contains")),
        }
    }
}

impl HostRef {
    fn borrow_items_contains(&self, item: &Value) -> bool {
        match &self.borrow().data {
            HostData::Items(items) => items.contains(item),
            _ => false,
        }
    }
}
