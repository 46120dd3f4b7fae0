//! Error types for the type descriptor service.

use thiserror::Error;

/// Errors raised while reading or mutating host objects through their descriptors.
///
/// # Stability
///
/// - New variants may be added in minor versions (enum is `#[non_exhaustive]`)
/// - Helper methods like `is_*()` provide stable APIs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DescriptorError {
    /// A value does not fit the declared kind of a slot
    #[error("Type mismatch: expected {expected}, found {actual}")]
    TypeMismatch { expected: String, actual: String },

    /// No descriptor is registered under this name
    #[error("Unknown type: {name}")]
    UnknownType { name: String },

    /// A descriptor with this name is already registered
    #[error("Type already registered: {name}")]
    DuplicateType { name: String },

    /// The object type declares no member with this name
    #[error("Type '{type_name}' has no member '{member}'")]
    UnknownMember { type_name: String, member: String },

    /// A positional access fell outside the collection
    #[error("Index {index} out of range for '{type_name}' with {count} items")]
    IndexOutOfRange {
        type_name: String,
        index: i64,
        count: usize,
    },

    /// No item or entry exists for the key
    #[error("Key {key} not found in '{type_name}'")]
    KeyNotFound { type_name: String, key: String },

    /// A dictionary already contains the key
    #[error("Key {key} already present in '{type_name}'")]
    DuplicateKey { type_name: String, key: String },

    /// The descriptor category does not advertise the operation
    #[error("Operation '{operation}' is not supported by '{type_name}'")]
    UnsupportedOperation {
        operation: &'static str,
        type_name: String,
    },
}

impl DescriptorError {
    /// Check if this error is a type mismatch
    pub fn is_type_error(&self) -> bool {
        matches!(self, DescriptorError::TypeMismatch { .. })
    }

    /// Check if this error reports a missing type, member or key
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DescriptorError::UnknownType { .. }
                | DescriptorError::UnknownMember { .. }
                | DescriptorError::KeyNotFound { .. }
        )
    }

    /// Check if this error is an out of range position
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, DescriptorError::IndexOutOfRange { .. })
    }

    /// Check if this error reports an unsupported operation
    pub fn is_unsupported(&self) -> bool {
        matches!(self, DescriptorError::UnsupportedOperation { .. })
    }
}

impl From<DescriptorError> for crate::Error {
    fn from(err: DescriptorError) -> Self {
        crate::Error::Descriptor(err)
    }
}
