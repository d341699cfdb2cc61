//! Numeric safety pass over the serialized batch.
//!
//! Runs last, after every enrichment phase, and is total: the output of
//! `transform` contains only finite 4-decimal floats, integers, strings,
//! booleans, and nulls.

use psx_core::round4;
use serde_json::{Number, Value};

/// Recursively round every float to 4 decimal places and replace any
/// unrepresentable number with null. Integers and non-numeric values pass
/// through untouched.
pub fn sanitize(value: &mut Value) {
    match value {
        Value::Number(n) => {
            if n.is_f64() {
                let sanitized = n
                    .as_f64()
                    .and_then(|f| Number::from_f64(round4(f)))
                    .map(Value::Number)
                    .unwrap_or(Value::Null);
                *value = sanitized;
            }
        }
        Value::Array(items) => {
            for item in items {
                sanitize(item);
            }
        }
        Value::Object(map) => {
            for item in map.values_mut() {
                sanitize(item);
            }
        }
        _ => {}
    }
}
