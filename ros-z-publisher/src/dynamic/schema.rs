//! Schema types for dynamic ROS 2 messages.
//!
//! This module provides runtime representations of ROS 2 message types,
//! including field types, field schemas, and complete message schemas.

use std::fmt;
use std::sync::Arc;

use sha2::{Digest, Sha256};

use super::error::DynamicError;

/// ROS 2 field types for dynamic messages.
///
/// Maps to all primitive and compound types supported by ROS 2 IDL.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldType {
    // Primitives (matching ROS 2 IDL)
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float32,
    Float64,
    String,
    /// Bounded string: string<=N
    BoundedString(usize),

    // Compound
    /// Nested message type
    Message(Arc<MessageSchema>),

    // Collections
    /// Fixed-size array: T[N]
    Array(Box<FieldType>, usize),
    /// Unbounded sequence: sequence<T>
    Sequence(Box<FieldType>),
    /// Bounded sequence: sequence<T, N>
    BoundedSequence(Box<FieldType>, usize),
}

impl FieldType {
    /// Parse a primitive ROS 2 type name (`int32`, `string<=10`, ...).
    pub fn primitive(name: &str) -> Option<FieldType> {
        let ty = match name {
            "bool" => FieldType::Bool,
            "int8" | "byte" => FieldType::Int8,
            "int16" => FieldType::Int16,
            "int32" => FieldType::Int32,
            "int64" => FieldType::Int64,
            "uint8" | "char" => FieldType::Uint8,
            "uint16" => FieldType::Uint16,
            "uint32" => FieldType::Uint32,
            "uint64" => FieldType::Uint64,
            "float32" => FieldType::Float32,
            "float64" => FieldType::Float64,
            "string" => FieldType::String,
            _ => {
                let bound = name.strip_prefix("string<=")?.parse::<usize>().ok()?;
                FieldType::BoundedString(bound)
            }
        };
        Some(ty)
    }

    /// Check if this is a primitive type (not a message or collection).
    pub fn is_primitive(&self) -> bool {
        !matches!(
            self,
            FieldType::Message(_)
                | FieldType::Array(_, _)
                | FieldType::Sequence(_)
                | FieldType::BoundedSequence(_, _)
        )
    }

    /// Check if this is a numeric type.
    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            FieldType::Int8
                | FieldType::Int16
                | FieldType::Int32
                | FieldType::Int64
                | FieldType::Uint8
                | FieldType::Uint16
                | FieldType::Uint32
                | FieldType::Uint64
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(self, FieldType::Float32 | FieldType::Float64)
    }

    /// Check if this is a textual type (`string` or `string<=N`).
    pub fn is_string(&self) -> bool {
        matches!(self, FieldType::String | FieldType::BoundedString(_))
    }

    /// Check if this is an array or sequence.
    pub fn is_collection(&self) -> bool {
        self.element_type().is_some()
    }

    /// Get the inner element type for arrays and sequences.
    pub fn element_type(&self) -> Option<&FieldType> {
        match self {
            FieldType::Array(inner, _)
            | FieldType::Sequence(inner)
            | FieldType::BoundedSequence(inner, _) => Some(inner),
            _ => None,
        }
    }

    /// Get the nested schema for message types.
    pub fn message_schema(&self) -> Option<&Arc<MessageSchema>> {
        match self {
            FieldType::Message(schema) => Some(schema),
            _ => None,
        }
    }

    /// The type name without any array suffix, as used for bus channels.
    pub fn base_name(&self) -> String {
        match self.element_type() {
            Some(inner) => inner.base_name(),
            None => self.to_string(),
        }
    }

    /// Hash over the full structure of this type, nested messages included.
    pub fn structural_hash(&self) -> String {
        if let FieldType::Message(schema) = self {
            return schema.structural_hash();
        }
        let mut hasher = Sha256::new();
        self.hash_into(&mut hasher);
        hex_digest(hasher)
    }

    /// Hash advertised on the bus: the schema's declared RIHS01 hash when it
    /// has one, otherwise the structural hash.
    pub fn wire_hash(&self) -> String {
        match self {
            FieldType::Message(schema) => schema
                .type_hash
                .clone()
                .unwrap_or_else(|| schema.structural_hash()),
            _ => self.structural_hash(),
        }
    }

    fn hash_into(&self, hasher: &mut Sha256) {
        hasher.update(self.to_string().as_bytes());
        if let FieldType::Message(schema) = self {
            hasher.update(b"{");
            for field in &schema.fields {
                hasher.update(field.name.as_bytes());
                hasher.update(b":");
                field.field_type.hash_into(hasher);
                hasher.update(b";");
            }
            hasher.update(b"}");
        } else if let Some(inner) = self.element_type() {
            inner.hash_into(hasher);
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Bool => write!(f, "bool"),
            FieldType::Int8 => write!(f, "int8"),
            FieldType::Int16 => write!(f, "int16"),
            FieldType::Int32 => write!(f, "int32"),
            FieldType::Int64 => write!(f, "int64"),
            FieldType::Uint8 => write!(f, "uint8"),
            FieldType::Uint16 => write!(f, "uint16"),
            FieldType::Uint32 => write!(f, "uint32"),
            FieldType::Uint64 => write!(f, "uint64"),
            FieldType::Float32 => write!(f, "float32"),
            FieldType::Float64 => write!(f, "float64"),
            FieldType::String => write!(f, "string"),
            FieldType::BoundedString(n) => write!(f, "string<={}", n),
            FieldType::Message(schema) => write!(f, "{}", schema.type_name),
            FieldType::Array(inner, n) => write!(f, "{}[{}]", inner, n),
            FieldType::Sequence(inner) => write!(f, "{}[]", inner),
            FieldType::BoundedSequence(inner, n) => write!(f, "{}[<={}]", inner, n),
        }
    }
}

/// Schema for a single message field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSchema {
    /// Field name
    pub name: String,
    /// Field type
    pub field_type: FieldType,
}

impl FieldSchema {
    /// Create a new field schema.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Complete schema for a ROS 2 message type.
#[derive(Clone, Debug)]
pub struct MessageSchema {
    /// Full type name: "geometry_msgs/msg/Twist"
    pub type_name: String,
    /// Package name: "geometry_msgs"
    pub package: String,
    /// Message name: "Twist"
    pub name: String,
    /// Ordered list of fields
    pub fields: Vec<FieldSchema>,
    /// RIHS01 type hash, when known
    pub type_hash: Option<String>,
}

impl MessageSchema {
    /// Get field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Get field index by name.
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    /// Create a builder for programmatic schema construction.
    pub fn builder(type_name: &str) -> MessageSchemaBuilder {
        MessageSchemaBuilder::new(type_name)
    }

    /// Number of fields in this message.
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Iterate over field names.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// DDS-mangled type name: "std_msgs::msg::dds_::String_".
    pub fn dds_type_name(&self) -> String {
        format!("{}::msg::dds_::{}_", self.package, self.name)
    }

    /// SHA-256 over the full field structure, nested types included, as hex.
    ///
    /// Two schemas with the same name but a retyped field hash differently.
    /// This is not the ROS 2 type description hash.
    pub fn structural_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.type_name.as_bytes());
        for field in &self.fields {
            hasher.update(field.name.as_bytes());
            field.field_type.hash_into(&mut hasher);
        }
        hex_digest(hasher)
    }

    /// Copy of this schema with the field at `index` retyped.
    pub fn with_field_type(
        &self,
        index: usize,
        field_type: FieldType,
    ) -> Result<Arc<MessageSchema>, DynamicError> {
        let mut schema = self.clone();
        // the declared hash described the original layout
        schema.type_hash = None;
        let field = schema
            .fields
            .get_mut(index)
            .ok_or(DynamicError::IndexOutOfBounds(index))?;
        field.field_type = field_type;
        Ok(Arc::new(schema))
    }
}

fn hex_digest(hasher: Sha256) -> String {
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

impl PartialEq for MessageSchema {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.fields == other.fields
    }
}

/// Builder for creating schemas programmatically.
pub struct MessageSchemaBuilder {
    type_name: String,
    fields: Vec<FieldSchema>,
    type_hash: Option<String>,
}

impl MessageSchemaBuilder {
    /// Create a new builder for the given type name.
    pub fn new(type_name: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            fields: Vec::new(),
            type_hash: None,
        }
    }

    /// Add a field to the schema.
    pub fn field(mut self, name: &str, field_type: FieldType) -> Self {
        self.fields.push(FieldSchema::new(name, field_type));
        self
    }

    /// Set the RIHS01 type hash advertised for this type.
    pub fn type_hash(mut self, hash: impl Into<String>) -> Self {
        self.type_hash = Some(hash.into());
        self
    }

    /// Build the message schema.
    pub fn build(self) -> Result<Arc<MessageSchema>, DynamicError> {
        let parts: Vec<&str> = self.type_name.split('/').collect();
        if parts.len() != 3 || parts[1] != "msg" || parts[0].is_empty() || parts[2].is_empty() {
            return Err(DynamicError::InvalidTypeName(self.type_name));
        }

        Ok(Arc::new(MessageSchema {
            type_name: self.type_name.clone(),
            package: parts[0].to_string(),
            name: parts[2].to_string(),
            fields: self.fields,
            type_hash: self.type_hash,
        }))
    }
}
