//! Schema registry for dynamic message types.
//!
//! Provides a cache of message schemas, pre-populated with bundled schemas,
//! and the [`SchemaAccess`] capability the publisher core consumes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::bundled;
use super::descriptor::TypeDescriptor;
use super::error::DynamicError;
use super::path::{PathSegment, parse_path};
use super::schema::{FieldType, MessageSchema};
use super::value::{DynamicValue, default_for_type};

/// What the publisher core needs from a type system.
pub trait SchemaAccess: Send + Sync {
    /// Resolve a type descriptor (`pkg/msg/Name`, `float64`, `pkg/msg/Name[3]`, ...).
    fn resolve_type(&self, descriptor: &str) -> Result<FieldType, DynamicError>;

    /// Build a zero-valued instance of a resolved type.
    fn instantiate_default(&self, field_type: &FieldType) -> DynamicValue {
        default_for_type(field_type)
    }

    /// Type of the node at `path` below `root`, and whether that node is a sequence.
    ///
    /// An indexed path (`/points[1]`) addresses the element, never the sequence.
    fn field_type_and_arity(
        &self,
        root: &FieldType,
        path: &str,
    ) -> Result<(FieldType, bool), DynamicError> {
        let mut current = root;
        for segment in parse_path(path)? {
            current = match segment {
                PathSegment::Field(name) => {
                    let schema = current
                        .message_schema()
                        .ok_or_else(|| DynamicError::NotAMessage(name.to_string()))?;
                    &schema
                        .field(name)
                        .ok_or_else(|| DynamicError::FieldNotFound(name.to_string()))?
                        .field_type
                }
                PathSegment::Index(index) => {
                    if let FieldType::Array(_, len) | FieldType::BoundedSequence(_, len) = current
                        && index >= *len
                    {
                        return Err(DynamicError::IndexOutOfBounds(index));
                    }
                    current
                        .element_type()
                        .ok_or_else(|| DynamicError::NotAnArray(path.to_string()))?
                }
            };
        }
        Ok((current.clone(), current.is_collection()))
    }
}

/// Registry of message schemas.
///
/// Provides fast O(1) lookup by type name and ensures schema sharing
/// via `Arc<MessageSchema>`.
pub struct SchemaRegistry {
    schemas: RwLock<HashMap<String, Arc<MessageSchema>>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Create a registry holding the bundled common message types.
    pub fn with_bundled() -> Self {
        let registry = Self::new();
        match bundled::schemas() {
            Ok(schemas) => {
                for schema in schemas {
                    registry.register(schema);
                }
            }
            Err(e) => tracing::warn!("Bundled schemas unavailable: {}", e),
        }
        registry
    }

    /// Get schema by full type name (e.g., "geometry_msgs/msg/Twist").
    ///
    /// The short form "geometry_msgs/Twist" is accepted as well.
    pub fn get(&self, type_name: &str) -> Option<Arc<MessageSchema>> {
        self.lookup(type_name).ok().flatten()
    }

    fn lookup(&self, type_name: &str) -> Result<Option<Arc<MessageSchema>>, DynamicError> {
        let schemas = self
            .schemas
            .read()
            .map_err(|_| DynamicError::RegistryLockPoisoned)?;
        Ok(schemas.get(type_name).cloned().or_else(|| {
            let (package, name) = type_name.split_once('/')?;
            if name.contains('/') {
                return None;
            }
            schemas.get(&format!("{}/msg/{}", package, name)).cloned()
        }))
    }

    /// Register a schema and return the Arc for sharing.
    pub fn register(&self, schema: Arc<MessageSchema>) -> Arc<MessageSchema> {
        if let Ok(mut schemas) = self.schemas.write() {
            schemas.insert(schema.type_name.clone(), schema.clone());
        }
        schema
    }

    /// Check if a type is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.get(type_name).is_some()
    }

    /// List all registered type names, sorted.
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .schemas
            .read()
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Number of registered schemas.
    pub fn len(&self) -> usize {
        self.schemas.read().map(|s| s.len()).unwrap_or(0)
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaAccess for SchemaRegistry {
    fn resolve_type(&self, descriptor: &str) -> Result<FieldType, DynamicError> {
        let descriptor = TypeDescriptor::parse(descriptor)?;
        let base = match FieldType::primitive(&descriptor.base) {
            Some(primitive) => primitive,
            None => FieldType::Message(
                self.lookup(&descriptor.base)?
                    .ok_or_else(|| DynamicError::SchemaNotFound(descriptor.base.clone()))?,
            ),
        };
        Ok(descriptor.wrap(base))
    }
}
