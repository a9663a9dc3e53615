//! Boundary validation for backend JSON.
//!
//! Every backend response goes through these helpers so a bad shape becomes
//! a [`BackendError::MalformedResponse`] instead of a panic deep in a caller.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::BackendError;

/// Parse `raw` as a JSON object and deserialize its top-level `field`.
///
/// # Errors
///
/// Returns [`BackendError::MalformedResponse`] if `raw` is not a JSON object,
/// the field is absent or null, or its value does not match `T`.
pub fn parse_field<T: DeserializeOwned>(
    raw: &str,
    field: &str,
    context: &str,
) -> Result<T, BackendError> {
    let mut object = parse_json_object(raw, context)?;
    let value = match object.remove(field) {
        Some(Value::Null) | None => {
            return Err(BackendError::malformed(
                context,
                format!("missing field `{field}`"),
            ))
        }
        Some(value) => value,
    };
    serde_json::from_value(value).map_err(|e| {
        BackendError::malformed(context, format!("field `{field}` has unexpected shape: {e}"))
    })
}

/// Parse `raw` as a JSON object and deserialize the whole object.
///
/// # Errors
///
/// Returns [`BackendError::MalformedResponse`] if `raw` is not a JSON object
/// or does not match `T`.
pub fn parse_object<T: DeserializeOwned>(raw: &str, context: &str) -> Result<T, BackendError> {
    let object = parse_json_object(raw, context)?;
    serde_json::from_value(Value::Object(object))
        .map_err(|e| BackendError::malformed(context, format!("unexpected shape: {e}")))
}

fn parse_json_object(raw: &str, context: &str) -> Result<Map<String, Value>, BackendError> {
    let value: Value = serde_json::from_str(strip_code_fence(raw))
        .map_err(|e| BackendError::malformed(context, format!("invalid JSON: {e}")))?;
    match value {
        Value::Object(object) => Ok(object),
        other => Err(BackendError::malformed(
            context,
            format!("expected a JSON object, got {}", json_type(&other)),
        )),
    }
}

/// Models occasionally wrap JSON mode output in a markdown fence.
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
