//! Schemas for common ROS 2 interface types, bundled so a registry is usable
//! without any message package on disk.

use std::sync::Arc;

use super::error::DynamicError;
use super::schema::{FieldType, MessageSchema};

fn msg(schema: &Arc<MessageSchema>) -> FieldType {
    FieldType::Message(schema.clone())
}

fn xyz(type_name: &str, component: FieldType) -> Result<Arc<MessageSchema>, DynamicError> {
    MessageSchema::builder(type_name)
        .field("x", component.clone())
        .field("y", component.clone())
        .field("z", component)
        .build()
}

/// All bundled schemas, dependencies before dependents.
pub fn schemas() -> Result<Vec<Arc<MessageSchema>>, DynamicError> {
    let mut out = Vec::new();

    let time = MessageSchema::builder("builtin_interfaces/msg/Time")
        .field("sec", FieldType::Int32)
        .field("nanosec", FieldType::Uint32)
        .build()?;
    out.push(time.clone());
    out.push(
        MessageSchema::builder("builtin_interfaces/msg/Duration")
            .field("sec", FieldType::Int32)
            .field("nanosec", FieldType::Uint32)
            .build()?,
    );

    for (name, ty) in [
        ("std_msgs/msg/Bool", FieldType::Bool),
        ("std_msgs/msg/Byte", FieldType::Int8),
        ("std_msgs/msg/Char", FieldType::Uint8),
        ("std_msgs/msg/Int8", FieldType::Int8),
        ("std_msgs/msg/Int16", FieldType::Int16),
        ("std_msgs/msg/Int32", FieldType::Int32),
        ("std_msgs/msg/Int64", FieldType::Int64),
        ("std_msgs/msg/UInt8", FieldType::Uint8),
        ("std_msgs/msg/UInt16", FieldType::Uint16),
        ("std_msgs/msg/UInt32", FieldType::Uint32),
        ("std_msgs/msg/UInt64", FieldType::Uint64),
        ("std_msgs/msg/Float32", FieldType::Float32),
        ("std_msgs/msg/Float64", FieldType::Float64),
        ("std_msgs/msg/String", FieldType::String),
    ] {
        out.push(MessageSchema::builder(name).field("data", ty).build()?);
    }
    out.push(MessageSchema::builder("std_msgs/msg/Empty").build()?);
    out.push(
        MessageSchema::builder("std_msgs/msg/ColorRGBA")
            .field("r", FieldType::Float32)
            .field("g", FieldType::Float32)
            .field("b", FieldType::Float32)
            .field("a", FieldType::Float32)
            .build()?,
    );
    let header = MessageSchema::builder("std_msgs/msg/Header")
        .field("stamp", msg(&time))
        .field("frame_id", FieldType::String)
        .build()?;
    out.push(header.clone());

    let point = xyz("geometry_msgs/msg/Point", FieldType::Float64)?;
    let vector3 = xyz("geometry_msgs/msg/Vector3", FieldType::Float64)?;
    let quaternion = MessageSchema::builder("geometry_msgs/msg/Quaternion")
        .field("x", FieldType::Float64)
        .field("y", FieldType::Float64)
        .field("z", FieldType::Float64)
        .field("w", FieldType::Float64)
        .build()?;
    let pose = MessageSchema::builder("geometry_msgs/msg/Pose")
        .field("position", msg(&point))
        .field("orientation", msg(&quaternion))
        .build()?;
    let twist = MessageSchema::builder("geometry_msgs/msg/Twist")
        .field("linear", msg(&vector3))
        .field("angular", msg(&vector3))
        .build()?;
    out.extend([
        point,
        xyz("geometry_msgs/msg/Point32", FieldType::Float32)?,
        vector3,
        quaternion,
        pose.clone(),
        twist.clone(),
        MessageSchema::builder("geometry_msgs/msg/PoseStamped")
            .field("header", msg(&header))
            .field("pose", msg(&pose))
            .build()?,
        MessageSchema::builder("geometry_msgs/msg/TwistStamped")
            .field("header", msg(&header))
            .field("twist", msg(&twist))
            .build()?,
        MessageSchema::builder("sensor_msgs/msg/Temperature")
            .field("header", msg(&header))
            .field("temperature", FieldType::Float64)
            .field("variance", FieldType::Float64)
            .build()?,
    ]);

    Ok(out)
}
