//! Structured-string unwrap.
//!
//! Agents frequently return values that were JSON-encoded one extra time
//! (a string holding JSON), optionally wrapped in a `payload` field. These
//! helpers peel exactly one layer per call; they never loop to a fixed point.

use serde_json::{Map, Value};

/// Decodes one layer of a possibly JSON-encoded string.
///
/// - valid JSON text → the decoded value
/// - a quoted string that is not valid JSON → the text between the quotes
/// - anything else → the text itself
pub fn decode_structured_str(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::String(String::new());
    }

    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        return v;
    }

    let trimmed = raw.trim();
    if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        return Value::String(trimmed[1..trimmed.len() - 1].to_string());
    }

    Value::String(raw.to_string())
}

/// Unwraps an object's `payload` field, if present.
///
/// A string payload is decoded once with [`decode_structured_str`]; any other
/// payload is returned as-is. Objects without `payload` are returned unchanged.
pub fn decode_structured_object(mut obj: Map<String, Value>) -> Value {
    match obj.remove("payload") {
        Some(Value::String(s)) => decode_structured_str(&s),
        Some(other) => other,
        None => Value::Object(obj),
    }
}

/// Applies the `payload` unwrap to objects and returns other values unchanged.
pub fn unwrap_payload(value: Value) -> Value {
    match value {
        Value::Object(map) => decode_structured_object(map),
        other => other,
    }
}
