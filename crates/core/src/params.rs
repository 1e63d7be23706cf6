//! Typed parameter extraction from a `serde_json::Value` object.
//!
//! A missing key (or an explicit `null`) yields the default. A key that is
//! present with the wrong JSON type is a configuration error: a run with a
//! silently ignored `"gain": "fast"` is worse than one that refuses to start.

use serde_json::Value;

use crate::error::FieldError;

/// Human-readable JSON type name used in mismatch errors.
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn mismatch(name: &str, expected: &str, got: &Value) -> FieldError {
    FieldError::ParamTypeMismatch {
        name: name.to_string(),
        expected: expected.to_string(),
        got: json_type_name(got).to_string(),
    }
}

fn lookup<'a>(params: &'a Value, name: &str) -> Option<&'a Value> {
    params.get(name).filter(|v| !v.is_null())
}

/// Extracts an `f64` (integers accepted) from `params[name]`.
pub fn param_f64(params: &Value, name: &str, default: f64) -> Result<f64, FieldError> {
    match lookup(params, name) {
        None => Ok(default),
        Some(v) => v.as_f64().ok_or_else(|| mismatch(name, "number", v)),
    }
}

/// Extracts a non-negative integer from `params[name]`.
pub fn param_usize(params: &Value, name: &str, default: usize) -> Result<usize, FieldError> {
    match lookup(params, name) {
        None => Ok(default),
        Some(v) => v
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(|| mismatch(name, "non-negative integer", v)),
    }
}

/// Extracts a `bool` from `params[name]`.
pub fn param_bool(params: &Value, name: &str, default: bool) -> Result<bool, FieldError> {
    match lookup(params, name) {
        None => Ok(default),
        Some(v) => v.as_bool().ok_or_else(|| mismatch(name, "boolean", v)),
    }
}

/// Extracts a `String` from `params[name]`.
pub fn param_string(params: &Value, name: &str, default: &str) -> Result<String, FieldError> {
    match lookup(params, name) {
        None => Ok(default.to_owned()),
        Some(v) => v
            .as_str()
            .map(String::from)
            .ok_or_else(|| mismatch(name, "string", v)),
    }
}
