//! Tests for schema types (FieldType, FieldSchema, MessageSchema).

use crate::dynamic::error::DynamicError;
use crate::dynamic::schema::{FieldType, MessageSchema};

#[test]
fn test_field_type_is_primitive() {
    assert!(FieldType::Bool.is_primitive());
    assert!(FieldType::Int32.is_primitive());
    assert!(FieldType::Float64.is_primitive());
    assert!(FieldType::String.is_primitive());
    assert!(FieldType::BoundedString(100).is_primitive());

    assert!(!FieldType::Sequence(Box::new(FieldType::Int32)).is_primitive());
    assert!(!FieldType::Array(Box::new(FieldType::Int32), 10).is_primitive());
}

#[test]
fn test_field_type_is_numeric() {
    assert!(FieldType::Int8.is_numeric());
    assert!(FieldType::Uint64.is_numeric());
    assert!(FieldType::Float32.is_numeric());

    assert!(!FieldType::Bool.is_numeric());
    assert!(!FieldType::String.is_numeric());
}

#[test]
fn test_field_type_primitive_names() {
    assert_eq!(FieldType::primitive("float64"), Some(FieldType::Float64));
    assert_eq!(FieldType::primitive("byte"), Some(FieldType::Int8));
    assert_eq!(FieldType::primitive("char"), Some(FieldType::Uint8));
    assert_eq!(
        FieldType::primitive("string<=8"),
        Some(FieldType::BoundedString(8))
    );
    assert_eq!(FieldType::primitive("geometry_msgs/msg/Point"), None);
    assert_eq!(FieldType::primitive("string<=x"), None);
}

#[test]
fn test_field_type_display() {
    assert_eq!(FieldType::Uint16.to_string(), "uint16");
    assert_eq!(
        FieldType::Array(Box::new(FieldType::Float64), 9).to_string(),
        "float64[9]"
    );
    assert_eq!(
        FieldType::Sequence(Box::new(FieldType::String)).to_string(),
        "string[]"
    );
    assert_eq!(
        FieldType::BoundedSequence(Box::new(FieldType::Int8), 3).to_string(),
        "int8[<=3]"
    );
}

#[test]
fn test_field_type_base_name() {
    let point = MessageSchema::builder("geometry_msgs/msg/Point")
        .field("x", FieldType::Float64)
        .build()
        .unwrap();
    let arr = FieldType::Array(Box::new(FieldType::Message(point)), 4);
    assert_eq!(arr.base_name(), "geometry_msgs/msg/Point");
}

#[test]
fn test_schema_builder() {
    let schema = MessageSchema::builder("geometry_msgs/msg/Point")
        .field("x", FieldType::Float64)
        .field("y", FieldType::Float64)
        .field("z", FieldType::Float64)
        .build()
        .unwrap();

    assert_eq!(schema.type_name, "geometry_msgs/msg/Point");
    assert_eq!(schema.package, "geometry_msgs");
    assert_eq!(schema.name, "Point");
    assert_eq!(schema.field_count(), 3);
    assert_eq!(schema.field_index("y"), Some(1));
    assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["x", "y", "z"]);
    assert_eq!(schema.dds_type_name(), "geometry_msgs::msg::dds_::Point_");
}

#[test]
fn test_schema_builder_invalid_name() {
    for name in ["Point", "geometry_msgs/Point", "geometry_msgs/srv/Point", "/msg/Point"] {
        assert!(matches!(
            MessageSchema::builder(name).build(),
            Err(DynamicError::InvalidTypeName(_))
        ));
    }
}

#[test]
fn test_structural_hash_tracks_field_types() {
    let a = MessageSchema::builder("pkg/msg/A")
        .field("v", FieldType::Int32)
        .build()
        .unwrap();
    let same = MessageSchema::builder("pkg/msg/A")
        .field("v", FieldType::Int32)
        .build()
        .unwrap();
    let retyped = a.with_field_type(0, FieldType::Float32).unwrap();

    assert_eq!(a.structural_hash(), same.structural_hash());
    assert_ne!(a.structural_hash(), retyped.structural_hash());
    assert_eq!(a.structural_hash().len(), 64);
    assert!(a.with_field_type(1, FieldType::Bool).is_err());
}

#[test]
fn test_wire_hash_prefers_declared_hash() {
    let declared = "RIHS01_e3c6ad32e3c3d6bb0b1f3d0b0d9b7b6d0c4ad1a5f1a7f2e0c3b1d0c8e7f6a5b4";
    let schema = MessageSchema::builder("pkg/msg/A")
        .field("v", FieldType::Int32)
        .type_hash(declared)
        .build()
        .unwrap();
    let ty = FieldType::Message(schema.clone());
    assert_eq!(ty.wire_hash(), declared);

    // A retyped copy no longer matches the declared layout
    let retyped = FieldType::Message(schema.with_field_type(0, FieldType::Float32).unwrap());
    assert_eq!(retyped.wire_hash(), retyped.structural_hash());
    assert!(!retyped.wire_hash().starts_with("RIHS01_"));
}
