//! A typed message tree: the value together with the type it instantiates.

use super::error::DynamicError;
use super::path::{PathSegment, parse_path};
use super::registry::SchemaAccess;
use super::schema::FieldType;
use super::value::{DynamicValue, default_for_type};

/// A live message instance.
///
/// The root may be a message or, for `Type[N]`/`Type[]` publishers, an array
/// of messages. `value` always structurally matches `field_type`.
#[derive(Clone, Debug, PartialEq)]
pub struct MessageInstance {
    field_type: FieldType,
    value: DynamicValue,
}

impl MessageInstance {
    /// Create a default-valued instance of `field_type`.
    pub fn new(field_type: FieldType) -> Self {
        let value = default_for_type(&field_type);
        Self { field_type, value }
    }

    /// Create an instance whose initial value comes from `schemas`.
    pub fn instantiate(field_type: FieldType, schemas: &dyn SchemaAccess) -> Self {
        let value = schemas.instantiate_default(&field_type);
        Self { field_type, value }
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    pub fn value(&self) -> &DynamicValue {
        &self.value
    }

    /// Split borrow used by the tree filler.
    pub(crate) fn parts_mut(&mut self) -> (&FieldType, &mut DynamicValue) {
        (&self.field_type, &mut self.value)
    }

    /// Replace the type of the node at `path` and reset that node to its default.
    ///
    /// Values outside the retyped node are kept. An empty path retypes the
    /// whole instance.
    pub fn retype(&mut self, path: &str, new_type: FieldType) -> Result<(), DynamicError> {
        let segments = parse_path(path)?;
        let updated = retype_node(&mut self.value, &self.field_type, &segments, new_type, path)?;
        self.field_type = updated;
        Ok(())
    }
}

fn retype_node(
    value: &mut DynamicValue,
    field_type: &FieldType,
    segments: &[PathSegment<'_>],
    new_type: FieldType,
    full_path: &str,
) -> Result<FieldType, DynamicError> {
    let Some((segment, rest)) = segments.split_first() else {
        *value = default_for_type(&new_type);
        return Ok(new_type);
    };

    match segment {
        PathSegment::Field(name) => {
            let schema = field_type
                .message_schema()
                .ok_or_else(|| DynamicError::NotAMessage(name.to_string()))?;
            let msg = value
                .as_message_mut()
                .ok_or_else(|| DynamicError::NotAMessage(name.to_string()))?;
            let index = schema
                .field_index(name)
                .ok_or_else(|| DynamicError::FieldNotFound(name.to_string()))?;
            let child_type = schema.fields[index].field_type.clone();
            let updated = retype_node(msg.field_mut(name)?, &child_type, rest, new_type, full_path)?;
            let schema = schema.with_field_type(index, updated)?;
            msg.rebind(schema.clone());
            Ok(FieldType::Message(schema))
        }
        // Array elements share one element type and cannot be retyped individually.
        PathSegment::Index(_) => Err(DynamicError::InvalidPath(full_path.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::schema::MessageSchema;

    fn pose_type() -> FieldType {
        let point = MessageSchema::builder("geometry_msgs/msg/Point")
            .field("x", FieldType::Float64)
            .field("y", FieldType::Float64)
            .build()
            .unwrap();
        let pose = MessageSchema::builder("test_msgs/msg/Pose")
            .field("position", FieldType::Message(point))
            .field("label", FieldType::String)
            .build()
            .unwrap();
        FieldType::Message(pose)
    }

    #[test]
    fn test_new_matches_type() {
        let inst = MessageInstance::new(pose_type());
        assert!(inst.value().is_instance_of(inst.field_type()));
    }

    #[test]
    fn test_root_array_instance() {
        let ty = FieldType::Array(Box::new(pose_type()), 3);
        let inst = MessageInstance::new(ty);
        assert_eq!(inst.value().as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_retype_nested_field() {
        let mut inst = MessageInstance::new(pose_type());
        if let DynamicValue::Message(msg) = &mut inst.value {
            msg.set("label", "keep").unwrap();
        }
        inst.retype("/position/x", FieldType::Int32).unwrap();

        assert!(inst.value().is_instance_of(inst.field_type()));
        let msg = inst.value().as_message().unwrap();
        assert_eq!(msg.get::<i32>("position.x").unwrap(), 0);
        assert_eq!(msg.get::<String>("label").unwrap(), "keep");
    }

    #[test]
    fn test_retype_root() {
        let mut inst = MessageInstance::new(pose_type());
        inst.retype("", FieldType::Float32).unwrap();
        assert_eq!(inst.value(), &DynamicValue::Float32(0.0));
    }

    #[test]
    fn test_retype_invalid_paths() {
        let mut inst = MessageInstance::new(pose_type());
        assert!(matches!(
            inst.retype("/missing", FieldType::Bool),
            Err(DynamicError::FieldNotFound(_))
        ));
        assert!(matches!(
            inst.retype("/label/x", FieldType::Bool),
            Err(DynamicError::NotAMessage(_))
        ));
        let mut arr = MessageInstance::new(FieldType::Array(Box::new(pose_type()), 2));
        assert!(arr.retype("[0]/label", FieldType::Bool).is_err());
    }
}
