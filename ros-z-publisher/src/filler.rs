//! Rebuilds a message tree from its expression overrides.
//!
//! The walk is schema driven: composites are visited field by field in
//! declared order, sequences element by element. An override at a path wins
//! over everything below it.

use std::collections::BTreeMap;

use tracing::trace;

use crate::dynamic::path::{child_path, element_path};
use crate::dynamic::{DynamicValue, FieldType, MessageInstance, default_for_type};
use crate::expression::ExpressionEngine;

/// Field path to expression text.
pub type ExpressionMap = BTreeMap<String, String>;

/// Fill `node` (of type `node_type`, found at `path`) in place.
///
/// Returns a replacement value when `path` itself carries an override: the
/// evaluated value, or the type's default when evaluation fails. Returns
/// `None` when the node was updated in place (or left alone).
pub fn fill(
    node: &mut DynamicValue,
    node_type: &FieldType,
    path: &str,
    expressions: &ExpressionMap,
    engine: &ExpressionEngine,
    counter: u64,
) -> Option<DynamicValue> {
    if let Some(expression) = expressions.get(path).filter(|e| !e.is_empty()) {
        return Some(match engine.evaluate(expression, node_type, counter) {
            Ok(value) => value,
            Err(_) => default_for_type(node_type),
        });
    }

    match node {
        DynamicValue::Message(msg) => {
            for (field, value) in msg.iter_typed_mut() {
                let field_path = child_path(path, &field.name);
                if let Some(replacement) = fill(
                    value,
                    &field.field_type,
                    &field_path,
                    expressions,
                    engine,
                    counter,
                ) {
                    *value = replacement;
                }
            }
        }
        DynamicValue::Array(items) if !items.is_empty() => {
            let element_type = node_type.element_type()?;
            for (index, item) in items.iter_mut().enumerate() {
                let item_path = element_path(path, index);
                if let Some(replacement) =
                    fill(item, element_type, &item_path, expressions, engine, counter)
                {
                    *item = replacement;
                }
            }
        }
        _ => {}
    }
    None
}

/// Fill a whole instance from the root path `""`.
pub fn fill_instance(
    instance: &mut MessageInstance,
    expressions: &ExpressionMap,
    engine: &ExpressionEngine,
    counter: u64,
) {
    let (field_type, value) = instance.parts_mut();
    if let Some(replacement) = fill(value, field_type, "", expressions, engine, counter) {
        *value = replacement;
    }
    trace!(counter, "Filled {}", field_type);
}
