//! Dynamic message container for ROS 2 messages.
//!
//! This module provides `DynamicMessage`, a runtime container for ROS 2
//! messages where the type is determined at runtime rather than compile time.

use std::sync::Arc;

use super::error::DynamicError;
use super::schema::{FieldSchema, MessageSchema};
use super::value::{DynamicValue, FromDynamic, IntoDynamic, default_for_type};

/// A ROS 2 message with runtime-determined type.
///
/// `DynamicMessage` stores message data in a structured format (vector of values)
/// along with the message schema. Fields keep the schema's declared order, which
/// is also the order the tree filler visits them in.
#[derive(Clone, Debug)]
pub struct DynamicMessage {
    schema: Arc<MessageSchema>,
    values: Vec<DynamicValue>,
}

impl DynamicMessage {
    /// Create a new message with default values.
    pub fn new(schema: &Arc<MessageSchema>) -> Self {
        let values = schema
            .fields
            .iter()
            .map(|f| default_for_type(&f.field_type))
            .collect();

        Self {
            schema: Arc::clone(schema),
            values,
        }
    }

    /// Rebind this message to a structurally updated schema, keeping values.
    ///
    /// The caller is responsible for the value at any retyped field.
    pub(crate) fn rebind(&mut self, schema: Arc<MessageSchema>) {
        debug_assert_eq!(schema.fields.len(), self.values.len());
        self.schema = schema;
    }

    /// Get the message schema.
    pub fn schema(&self) -> &MessageSchema {
        &self.schema
    }

    /// Get field value by name with type conversion.
    ///
    /// Supports dot notation for nested fields (e.g., "linear.x").
    pub fn get<T: FromDynamic>(&self, path: &str) -> Result<T, DynamicError> {
        let value = self.get_dynamic(path)?;
        T::from_dynamic(value).ok_or(DynamicError::InvalidPath(format!(
            "{} (expected {})",
            path,
            std::any::type_name::<T>()
        )))
    }

    /// Get field value as DynamicValue.
    ///
    /// Supports dot notation for nested fields (e.g., "linear.x").
    pub fn get_dynamic(&self, path: &str) -> Result<&DynamicValue, DynamicError> {
        let parts: Vec<&str> = path.split('.').collect();
        self.get_nested(&parts)
    }

    fn get_nested(&self, path: &[&str]) -> Result<&DynamicValue, DynamicError> {
        let (field_name, rest) = path
            .split_first()
            .ok_or_else(|| DynamicError::InvalidPath(String::new()))?;
        let field_idx = self
            .schema
            .field_index(field_name)
            .ok_or_else(|| DynamicError::FieldNotFound(field_name.to_string()))?;

        let value = &self.values[field_idx];
        if rest.is_empty() {
            return Ok(value);
        }
        match value {
            DynamicValue::Message(msg) => msg.get_nested(rest),
            _ => Err(DynamicError::NotAMessage(field_name.to_string())),
        }
    }

    /// Set field value by name.
    ///
    /// Supports dot notation for nested fields (e.g., "linear.x").
    pub fn set<T: IntoDynamic>(&mut self, path: &str, value: T) -> Result<(), DynamicError> {
        self.set_dynamic(path, value.into_dynamic())
    }

    /// Set field value as DynamicValue.
    pub fn set_dynamic(&mut self, path: &str, value: DynamicValue) -> Result<(), DynamicError> {
        let parts: Vec<&str> = path.split('.').collect();
        self.set_nested(&parts, value)
    }

    fn set_nested(&mut self, path: &[&str], value: DynamicValue) -> Result<(), DynamicError> {
        let (field_name, rest) = path
            .split_first()
            .ok_or_else(|| DynamicError::InvalidPath(String::new()))?;
        let field_idx = self
            .schema
            .field_index(field_name)
            .ok_or_else(|| DynamicError::FieldNotFound(field_name.to_string()))?;

        if rest.is_empty() {
            self.values[field_idx] = value;
            return Ok(());
        }
        match &mut self.values[field_idx] {
            DynamicValue::Message(msg) => msg.set_nested(rest, value),
            _ => Err(DynamicError::NotAMessage(field_name.to_string())),
        }
    }

    /// Mutable access to a direct child field by name.
    pub fn field_mut(&mut self, name: &str) -> Result<&mut DynamicValue, DynamicError> {
        let idx = self
            .schema
            .field_index(name)
            .ok_or_else(|| DynamicError::FieldNotFound(name.to_string()))?;
        Ok(&mut self.values[idx])
    }

    /// Get the internal values vector.
    pub fn values(&self) -> &[DynamicValue] {
        &self.values
    }

    /// Iterate over all fields with their names and values.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DynamicValue)> {
        self.iter_typed()
            .map(|(field, value)| (field.name.as_str(), value))
    }

    /// Iterate over all fields with their schema and value.
    pub fn iter_typed(&self) -> impl Iterator<Item = (&FieldSchema, &DynamicValue)> {
        self.schema.fields.iter().zip(self.values.iter())
    }

    /// Iterate over all fields with their schema and a mutable value slot.
    ///
    /// This is the accessor/mutator pair the tree filler walks with.
    pub fn iter_typed_mut(&mut self) -> impl Iterator<Item = (&FieldSchema, &mut DynamicValue)> {
        self.schema.fields.iter().zip(self.values.iter_mut())
    }

    /// Get the number of fields.
    pub fn field_count(&self) -> usize {
        self.values.len()
    }
}

impl PartialEq for DynamicMessage {
    fn eq(&self, other: &Self) -> bool {
        (Arc::ptr_eq(&self.schema, &other.schema) || self.schema == other.schema)
            && self.values == other.values
    }
}
