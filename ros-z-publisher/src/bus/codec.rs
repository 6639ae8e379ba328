//! CDR encoding of message instances.
//!
//! The instance is walked alongside its type: messages and fixed arrays are
//! written as tuples (no length prefix), sequences with a length prefix.

use cdr::{CdrLe, Infinite};
use serde::ser::{Error as _, Serialize, SerializeSeq, SerializeTuple, Serializer};

use super::BusError;
use crate::dynamic::{DynamicValue, FieldType, MessageInstance};

/// Encode `message` as little-endian CDR, encapsulation header included.
pub fn encode_cdr(message: &MessageInstance) -> Result<Vec<u8>, BusError> {
    let typed = Typed {
        value: message.value(),
        field_type: message.field_type(),
    };
    cdr::serialize::<_, _, CdrLe>(&typed, Infinite).map_err(|e| BusError::Encode(e.to_string()))
}

struct Typed<'a> {
    value: &'a DynamicValue,
    field_type: &'a FieldType,
}

impl Serialize for Typed<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match (self.value, self.field_type) {
            (DynamicValue::Bool(v), FieldType::Bool) => serializer.serialize_bool(*v),
            (DynamicValue::Int8(v), FieldType::Int8) => serializer.serialize_i8(*v),
            (DynamicValue::Int16(v), FieldType::Int16) => serializer.serialize_i16(*v),
            (DynamicValue::Int32(v), FieldType::Int32) => serializer.serialize_i32(*v),
            (DynamicValue::Int64(v), FieldType::Int64) => serializer.serialize_i64(*v),
            (DynamicValue::Uint8(v), FieldType::Uint8) => serializer.serialize_u8(*v),
            (DynamicValue::Uint16(v), FieldType::Uint16) => serializer.serialize_u16(*v),
            (DynamicValue::Uint32(v), FieldType::Uint32) => serializer.serialize_u32(*v),
            (DynamicValue::Uint64(v), FieldType::Uint64) => serializer.serialize_u64(*v),
            (DynamicValue::Float32(v), FieldType::Float32) => serializer.serialize_f32(*v),
            (DynamicValue::Float64(v), FieldType::Float64) => serializer.serialize_f64(*v),
            (DynamicValue::String(v), FieldType::String | FieldType::BoundedString(_)) => {
                serializer.serialize_str(v)
            }

            (DynamicValue::Message(msg), FieldType::Message(_)) => {
                let mut tuple = serializer.serialize_tuple(msg.field_count())?;
                for (field, value) in msg.iter_typed() {
                    tuple.serialize_element(&Typed {
                        value,
                        field_type: &field.field_type,
                    })?;
                }
                tuple.end()
            }

            // Fixed-size array (no length prefix)
            (DynamicValue::Array(items), FieldType::Array(inner, _)) => {
                let mut tuple = serializer.serialize_tuple(items.len())?;
                for value in items {
                    tuple.serialize_element(&Typed {
                        value,
                        field_type: inner,
                    })?;
                }
                tuple.end()
            }

            // Sequences (with length prefix)
            (
                DynamicValue::Array(items),
                FieldType::Sequence(inner) | FieldType::BoundedSequence(inner, _),
            ) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for value in items {
                    seq.serialize_element(&Typed {
                        value,
                        field_type: inner,
                    })?;
                }
                seq.end()
            }

            (value, field_type) => Err(S::Error::custom(format!(
                "{} value does not match type {}",
                value.kind_name(),
                field_type
            ))),
        }
    }
}
