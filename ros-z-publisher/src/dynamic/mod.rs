//! Dynamic message support.
//!
//! Message types are resolved at runtime from type descriptors, so the
//! publisher can build and fill any message without generated code.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐
//! │ SchemaRegistry  │────▶│  MessageSchema  │
//! │ (SchemaAccess)  │     │  (type info)    │
//! └────────┬────────┘     └────────┬────────┘
//!          │                       │
//!          ▼                       ▼
//! ┌─────────────────┐     ┌─────────────────┐
//! │ MessageInstance │────▶│  DynamicValue   │
//! │ (typed root)    │     │ (value tree)    │
//! └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust
//! use ros_z_publisher::dynamic::{MessageInstance, SchemaAccess, SchemaRegistry};
//!
//! let registry = SchemaRegistry::with_bundled();
//! let ty = registry.resolve_type("geometry_msgs/msg/Point[2]").unwrap();
//! let instance = MessageInstance::new(ty);
//! assert_eq!(instance.value().as_array().unwrap().len(), 2);
//! ```

pub mod bundled;
pub mod descriptor;
pub mod error;
pub mod instance;
pub mod message;
pub mod path;
pub mod registry;
pub mod schema;
pub mod value;

#[cfg(test)]
mod tests;

pub use descriptor::{ArraySpec, TypeDescriptor};
pub use error::DynamicError;
pub use instance::MessageInstance;
pub use message::DynamicMessage;
pub use registry::{SchemaAccess, SchemaRegistry};
pub use schema::{FieldSchema, FieldType, MessageSchema, MessageSchemaBuilder};
pub use value::{DynamicValue, FromDynamic, IntoDynamic, default_for_type};
