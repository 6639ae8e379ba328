//! Conversion of script values into typed message values.

use rhai::{Array, Dynamic, FLOAT, INT, Map};

use super::EvalError;
use crate::dynamic::{DynamicValue, FieldType, default_for_type};

/// Convert an evaluated script value to `target`.
///
/// Numbers convert freely within the numeric group and arrays element-wise
/// within the array group. The result is always an instance of `target`.
pub(crate) fn coerce(value: Dynamic, target: &FieldType) -> Result<DynamicValue, EvalError> {
    let coerced = match target {
        FieldType::Bool => DynamicValue::Bool(
            value
                .as_bool()
                .map_err(|found| mismatch(target, found))?,
        ),
        FieldType::Float32 | FieldType::Float64 => coerce_float(&value, target)?,
        FieldType::Int8
        | FieldType::Int16
        | FieldType::Int32
        | FieldType::Int64
        | FieldType::Uint8
        | FieldType::Uint16
        | FieldType::Uint32
        | FieldType::Uint64 => coerce_int(&value, target)?,
        FieldType::String | FieldType::BoundedString(_) => {
            DynamicValue::String(stringify(value, target))
        }
        FieldType::Message(schema) => {
            let type_name = value.type_name();
            let map = value
                .try_cast::<Map>()
                .ok_or_else(|| mismatch(target, type_name))?;
            let mut out = default_for_type(target);
            if let Some(msg) = out.as_message_mut() {
                for (key, field_value) in map {
                    let field = schema.field(key.as_str()).ok_or_else(|| {
                        EvalError::TypeMismatch {
                            expected: target.to_string(),
                            found: format!("map with unknown field '{}'", key),
                        }
                    })?;
                    let converted = coerce(field_value, &field.field_type)?;
                    *msg.field_mut(key.as_str())
                        .map_err(|e| mismatch(target, &e.to_string()))? = converted;
                }
            }
            out
        }
        FieldType::Array(element, _)
        | FieldType::Sequence(element)
        | FieldType::BoundedSequence(element, _) => {
            let items = into_items(value).map_err(|found| mismatch(target, found))?;
            let converted = items
                .into_iter()
                .map(|item| coerce(item, element))
                .collect::<Result<Vec<_>, _>>()?;
            match target {
                FieldType::Array(_, len) if converted.len() != *len => {
                    return Err(EvalError::TypeMismatch {
                        expected: target.to_string(),
                        found: format!("array of length {}", converted.len()),
                    });
                }
                FieldType::BoundedSequence(_, max) if converted.len() > *max => {
                    return Err(EvalError::TypeMismatch {
                        expected: target.to_string(),
                        found: format!("array of length {}", converted.len()),
                    });
                }
                _ => {}
            }
            DynamicValue::Array(converted)
        }
    };

    if coerced.is_instance_of(target) {
        Ok(coerced)
    } else {
        Err(mismatch(target, coerced.kind_name()))
    }
}

/// Text form of a script value for string targets, cut to the bound.
pub(crate) fn stringify(value: Dynamic, target: &FieldType) -> String {
    let text = if value.is_string() {
        value.into_string().unwrap_or_default()
    } else {
        value.to_string()
    };
    truncate(text, target)
}

pub(crate) fn truncate(text: String, target: &FieldType) -> String {
    match target {
        FieldType::BoundedString(max) if text.chars().count() > *max => {
            text.chars().take(*max).collect()
        }
        _ => text,
    }
}

fn into_items(value: Dynamic) -> Result<Array, &'static str> {
    if value.is_blob() {
        let blob = value.into_blob()?;
        return Ok(blob.into_iter().map(|b| Dynamic::from(b as INT)).collect());
    }
    value.into_array()
}

fn coerce_float(value: &Dynamic, target: &FieldType) -> Result<DynamicValue, EvalError> {
    let number = if let Ok(f) = value.as_float() {
        f
    } else if let Ok(i) = value.as_int() {
        i as FLOAT
    } else {
        return Err(mismatch(target, value.type_name()));
    };

    match target {
        FieldType::Float32 => {
            let narrowed = number as f32;
            if number.is_finite() && !narrowed.is_finite() {
                return Err(out_of_range(target, number));
            }
            Ok(DynamicValue::Float32(narrowed))
        }
        _ => Ok(DynamicValue::Float64(number)),
    }
}

fn coerce_int(value: &Dynamic, target: &FieldType) -> Result<DynamicValue, EvalError> {
    let wide: i128 = if let Ok(i) = value.as_int() {
        i as i128
    } else if let Ok(f) = value.as_float() {
        // i128 covers every integer target, so a bounded float truncates exactly.
        const LIMIT: FLOAT = 1.7e38;
        if !f.is_finite() || f.abs() >= LIMIT {
            return Err(out_of_range(target, f));
        }
        f.trunc() as i128
    } else {
        return Err(mismatch(target, value.type_name()));
    };

    let range = || out_of_range(target, wide);
    Ok(match target {
        FieldType::Int8 => DynamicValue::Int8(wide.try_into().map_err(|_| range())?),
        FieldType::Int16 => DynamicValue::Int16(wide.try_into().map_err(|_| range())?),
        FieldType::Int32 => DynamicValue::Int32(wide.try_into().map_err(|_| range())?),
        FieldType::Int64 => DynamicValue::Int64(wide.try_into().map_err(|_| range())?),
        FieldType::Uint8 => DynamicValue::Uint8(wide.try_into().map_err(|_| range())?),
        FieldType::Uint16 => DynamicValue::Uint16(wide.try_into().map_err(|_| range())?),
        FieldType::Uint32 => DynamicValue::Uint32(wide.try_into().map_err(|_| range())?),
        FieldType::Uint64 => DynamicValue::Uint64(wide.try_into().map_err(|_| range())?),
        _ => return Err(mismatch(target, value.type_name())),
    })
}

fn mismatch(target: &FieldType, found: &str) -> EvalError {
    EvalError::TypeMismatch {
        expected: target.to_string(),
        found: found.to_string(),
    }
}

fn out_of_range(target: &FieldType, value: impl std::fmt::Display) -> EvalError {
    EvalError::OutOfRange {
        expected: target.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::MessageSchema;

    #[test]
    fn test_numeric_group() {
        assert_eq!(
            coerce(Dynamic::from(3 as INT), &FieldType::Float64).unwrap(),
            DynamicValue::Float64(3.0)
        );
        assert_eq!(
            coerce(Dynamic::from(-2.9 as FLOAT), &FieldType::Int32).unwrap(),
            DynamicValue::Int32(-2)
        );
        assert_eq!(
            coerce(Dynamic::from(255 as INT), &FieldType::Uint8).unwrap(),
            DynamicValue::Uint8(255)
        );
        assert_eq!(
            coerce(Dynamic::from(0.5 as FLOAT), &FieldType::Float32).unwrap(),
            DynamicValue::Float32(0.5)
        );
    }

    #[test]
    fn test_integer_range() {
        assert!(matches!(
            coerce(Dynamic::from(256 as INT), &FieldType::Uint8),
            Err(EvalError::OutOfRange { .. })
        ));
        assert!(matches!(
            coerce(Dynamic::from(-1 as INT), &FieldType::Uint64),
            Err(EvalError::OutOfRange { .. })
        ));
        assert!(matches!(
            coerce(Dynamic::from(FLOAT::NAN), &FieldType::Int32),
            Err(EvalError::OutOfRange { .. })
        ));
        assert!(matches!(
            coerce(Dynamic::from(1e300 as FLOAT), &FieldType::Float32),
            Err(EvalError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_group_mismatch() {
        assert!(matches!(
            coerce(Dynamic::from(1 as INT), &FieldType::Bool),
            Err(EvalError::TypeMismatch { .. })
        ));
        assert!(matches!(
            coerce(Dynamic::from(true), &FieldType::Float64),
            Err(EvalError::TypeMismatch { .. })
        ));
        let arr: Array = vec![Dynamic::from(1 as INT)];
        assert!(matches!(
            coerce(Dynamic::from(arr), &FieldType::Int32),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_array_group() {
        let arr: Array = vec![Dynamic::from(1 as INT), Dynamic::from(2.5 as FLOAT)];
        let fixed = FieldType::Array(Box::new(FieldType::Float64), 2);
        assert_eq!(
            coerce(Dynamic::from(arr.clone()), &fixed).unwrap(),
            DynamicValue::Array(vec![DynamicValue::Float64(1.0), DynamicValue::Float64(2.5)])
        );

        let too_long = FieldType::Array(Box::new(FieldType::Float64), 3);
        assert!(coerce(Dynamic::from(arr.clone()), &too_long).is_err());

        let bounded = FieldType::BoundedSequence(Box::new(FieldType::Float64), 1);
        assert!(coerce(Dynamic::from(arr), &bounded).is_err());

        let blob: rhai::Blob = vec![1, 2, 3];
        let bytes = FieldType::Sequence(Box::new(FieldType::Uint8));
        assert_eq!(
            coerce(Dynamic::from_blob(blob), &bytes).unwrap(),
            DynamicValue::Array(vec![
                DynamicValue::Uint8(1),
                DynamicValue::Uint8(2),
                DynamicValue::Uint8(3),
            ])
        );
    }

    #[test]
    fn test_map_to_message() {
        let schema = MessageSchema::builder("builtin_interfaces/msg/Time")
            .field("sec", FieldType::Int32)
            .field("nanosec", FieldType::Uint32)
            .build()
            .unwrap();
        let target = FieldType::Message(schema);

        let mut map = Map::new();
        map.insert("sec".into(), Dynamic::from(7 as INT));
        let value = coerce(Dynamic::from_map(map.clone()), &target).unwrap();
        let msg = value.as_message().unwrap();
        assert_eq!(msg.get::<i32>("sec").unwrap(), 7);
        assert_eq!(msg.get::<u32>("nanosec").unwrap(), 0);

        map.insert("bogus".into(), Dynamic::from(1 as INT));
        assert!(coerce(Dynamic::from_map(map), &target).is_err());
    }

    #[test]
    fn test_stringify_truncates() {
        assert_eq!(
            stringify(Dynamic::from("hello".to_string()), &FieldType::BoundedString(3)),
            "hel"
        );
        assert_eq!(stringify(Dynamic::from(42 as INT), &FieldType::String), "42");
    }
}
