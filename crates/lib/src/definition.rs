//! Property graph definitions: the value-or-reference policy of a document type.
//!
//! The same shape (an object with an identity member) can be an owned,
//! inlined value in one document type and a link to an object living
//! elsewhere in another. A [`PropertyGraphDefinition`] answers that question
//! per member and per collection item. Definitions are registered per root
//! type in a [`DefinitionRegistry`] and handed to the
//! [`NodeContainer`](crate::NodeContainer) when a root is wrapped.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::debug;

use crate::descriptor::{MemberDescriptor, TypeDescriptor};
use crate::graph::NodeIndex;
use crate::value::Value;

/// The member slot being classified.
#[derive(Debug, Clone, Copy)]
pub struct MemberContext<'a> {
    /// Descriptor of the object owning the member
    pub owner: &'a TypeDescriptor,
    /// Declaration of the member
    pub member: &'a MemberDescriptor,
}

impl MemberContext<'_> {
    /// Name of the member
    pub fn name(&self) -> &str {
        self.member.name()
    }
}

/// The collection item being classified.
#[derive(Debug, Clone, Copy)]
pub struct ItemContext<'a> {
    /// Descriptor of the collection holding the item
    pub collection: &'a TypeDescriptor,
    /// Index of the item
    pub index: &'a NodeIndex,
    /// Whether the collection (or the member holding it) carries the
    /// non-identifiable items marker
    pub non_identifiable_items: bool,
}

/// Policy deciding whether object values are references or owned values.
///
/// Both methods have defaults, so an implementation only overrides what it
/// needs. Overrides can fall back on [`default_is_member_reference`] and
/// [`default_is_item_reference`].
///
/// ```
/// # use quantum::{PropertyGraphDefinition, MemberContext, Value};
/// struct ParentIsReference;
///
/// impl PropertyGraphDefinition for ParentIsReference {
///     fn is_member_reference(&self, member: &MemberContext<'_>, _value: &Value) -> bool {
///         member.name() == "Parent"
///     }
/// }
/// ```
pub trait PropertyGraphDefinition {
    /// Returns true if the object held by `member` is a reference to an
    /// object owned elsewhere
    fn is_member_reference(&self, member: &MemberContext<'_>, value: &Value) -> bool {
        default_is_member_reference(member, value)
    }

    /// Returns true if the item at `item.index` is a reference to an
    /// object owned elsewhere
    fn is_item_reference(&self, item: &ItemContext<'_>, value: &Value) -> bool {
        default_is_item_reference(item, value)
    }
}

/// Members are owned values unless a definition says otherwise.
pub fn default_is_member_reference(_member: &MemberContext<'_>, _value: &Value) -> bool {
    false
}

/// Identifiable items are references, unless their collection is marked as
/// holding non-identifiable (owned) items.
pub fn default_is_item_reference(item: &ItemContext<'_>, value: &Value) -> bool {
    value.is_identifiable() && !item.non_identifiable_items
}

/// The definition used when no other is registered.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultPropertyGraphDefinition;

impl PropertyGraphDefinition for DefaultPropertyGraphDefinition {}

/// Definitions addressed by the type name of the document root.
#[derive(Default)]
pub struct DefinitionRegistry {
    definitions: HashMap<String, Rc<dyn PropertyGraphDefinition>>,
    fallback: Rc<DefaultPropertyGraphDefinition>,
}

impl DefinitionRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `definition` for roots of type `type_name`, replacing any
    /// previous registration
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        definition: impl PropertyGraphDefinition + 'static,
    ) {
        let type_name = type_name.into();
        debug!(type_name = %type_name, "Registered property graph definition");
        self.definitions.insert(type_name, Rc::new(definition));
    }

    /// Definition for roots of type `type_name`, or the default definition
    pub fn find(&self, type_name: &str) -> Rc<dyn PropertyGraphDefinition> {
        match self.definitions.get(type_name) {
            Some(definition) => Rc::clone(definition),
            None => Rc::clone(&self.fallback) as Rc<dyn PropertyGraphDefinition>,
        }
    }

    /// Returns true if a definition is registered for `type_name`
    pub fn contains(&self, type_name: &str) -> bool {
        self.definitions.contains_key(type_name)
    }
}

impl fmt::Debug for DefinitionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.definitions.keys().collect();
        names.sort();
        f.debug_struct("DefinitionRegistry")
            .field("definitions", &names)
            .finish()
    }
}
