//! Tests for DynamicMessage.

use std::sync::Arc;

use crate::dynamic::error::DynamicError;
use crate::dynamic::message::DynamicMessage;
use crate::dynamic::schema::{FieldType, MessageSchema};
use crate::dynamic::value::DynamicValue;

fn create_twist_schema() -> Arc<MessageSchema> {
    let vector3 = MessageSchema::builder("geometry_msgs/msg/Vector3")
        .field("x", FieldType::Float64)
        .field("y", FieldType::Float64)
        .field("z", FieldType::Float64)
        .build()
        .unwrap();
    MessageSchema::builder("geometry_msgs/msg/Twist")
        .field("linear", FieldType::Message(vector3.clone()))
        .field("angular", FieldType::Message(vector3))
        .build()
        .unwrap()
}

#[test]
fn test_message_defaults() {
    let msg = DynamicMessage::new(&create_twist_schema());
    assert_eq!(msg.field_count(), 2);
    assert_eq!(msg.get::<f64>("linear.x").unwrap(), 0.0);
}

#[test]
fn test_message_set_get_nested() {
    let mut msg = DynamicMessage::new(&create_twist_schema());
    msg.set("linear.x", 1.5f64).unwrap();
    msg.set("angular.z", -0.5f64).unwrap();

    assert_eq!(msg.get::<f64>("linear.x").unwrap(), 1.5);
    assert_eq!(msg.get::<f64>("angular.z").unwrap(), -0.5);
    assert_eq!(msg.get::<f64>("linear.y").unwrap(), 0.0);
}

#[test]
fn test_message_errors() {
    let mut msg = DynamicMessage::new(&create_twist_schema());
    assert!(matches!(
        msg.get_dynamic("nope"),
        Err(DynamicError::FieldNotFound(_))
    ));
    assert!(matches!(
        msg.set("linear.x.y", 1.0f64),
        Err(DynamicError::NotAMessage(_))
    ));
    // Wrong extraction type
    assert!(matches!(
        msg.get::<i32>("linear.x"),
        Err(DynamicError::InvalidPath(_))
    ));
}

#[test]
fn test_message_iter_order() {
    let msg = DynamicMessage::new(&create_twist_schema());
    let names: Vec<&str> = msg.iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["linear", "angular"]);
}

#[test]
fn test_iter_typed_mut_assigns() {
    let mut msg = DynamicMessage::new(&create_twist_schema());
    for (field, value) in msg.iter_typed_mut() {
        if field.name == "angular" {
            let inner = value.as_message_mut().unwrap();
            *inner.field_mut("y").unwrap() = DynamicValue::Float64(3.0);
        }
    }
    assert_eq!(msg.get::<f64>("angular.y").unwrap(), 3.0);
}

#[test]
fn test_message_equality() {
    let schema = create_twist_schema();
    let a = DynamicMessage::new(&schema);
    let mut b = DynamicMessage::new(&create_twist_schema());
    assert_eq!(a, b);
    b.set("linear.z", 2.0f64).unwrap();
    assert_ne!(a, b);
}
