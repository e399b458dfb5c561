//! Display and truthiness of dynamic values, following browser coercion.

use serde_json::{Number, Value};

/// Text rendering for `x-text` and attribute values.
///
/// Null renders as the empty string; integral floats drop their fraction;
/// arrays are comma-joined with null elements empty; objects render as
/// `[object Object]`.
pub fn display(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => display_number(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items.iter().map(display).collect::<Vec<_>>().join(","),
        Value::Object(_) => "[object Object]".to_owned(),
    }
}

fn display_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Boolean coercion: null, `false`, zero, NaN and the empty string are falsy.
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Compare as rendered strings, the way form controls compare values.
pub fn loose_eq(value: &Value, text: &str) -> bool {
    display(value) == text
}
