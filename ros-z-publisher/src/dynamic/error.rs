//! Error types for dynamic message handling.

use std::fmt;

/// Errors that can occur during dynamic message operations.
#[derive(Debug, Clone, PartialEq)]
pub enum DynamicError {
    /// Invalid type name format (should be "package/msg/Name")
    InvalidTypeName(String),

    /// Type descriptor could not be parsed (e.g. "Point[abc]")
    InvalidTypeDescriptor(String),

    /// Field not found in message schema
    FieldNotFound(String),

    /// Attempted to access a nested field on a non-message type
    NotAMessage(String),

    /// Attempted to index into a value that is not an array
    NotAnArray(String),

    /// Malformed field path
    InvalidPath(String),

    /// Index out of bounds for field access
    IndexOutOfBounds(usize),

    /// Schema not found in registry
    SchemaNotFound(String),

    /// Registry lock was poisoned
    RegistryLockPoisoned,
}

impl fmt::Display for DynamicError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicError::InvalidTypeName(name) => {
                write!(
                    f,
                    "Invalid type name '{}': expected format 'package/msg/Name'",
                    name
                )
            }
            DynamicError::InvalidTypeDescriptor(desc) => {
                write!(f, "Invalid type descriptor '{}'", desc)
            }
            DynamicError::FieldNotFound(name) => {
                write!(f, "Field '{}' not found in message schema", name)
            }
            DynamicError::NotAMessage(name) => {
                write!(
                    f,
                    "Field '{}' is not a message type, cannot access nested fields",
                    name
                )
            }
            DynamicError::NotAnArray(name) => {
                write!(f, "Field '{}' is not an array, cannot be indexed", name)
            }
            DynamicError::InvalidPath(path) => {
                write!(f, "Invalid field path '{}'", path)
            }
            DynamicError::IndexOutOfBounds(idx) => {
                write!(f, "Index {} is out of bounds", idx)
            }
            DynamicError::SchemaNotFound(name) => {
                write!(f, "Schema '{}' not found in registry", name)
            }
            DynamicError::RegistryLockPoisoned => {
                write!(f, "Schema registry lock was poisoned")
            }
        }
    }
}

impl std::error::Error for DynamicError {}
