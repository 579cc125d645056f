//! Synchronous response normalization.
//!
//! RunAgent servers have shipped several envelope layouts over time. Instead
//! of probing fields at each call site, the envelope is run through a fixed,
//! ordered list of shape matchers; the first match decides the value and no
//! later matcher is consulted.
//!
//! Priority:
//! 1. failure indicator (`success: false` or populated `error`) → error
//! 2. `data` (JSON string, `result_data.data`, `data`, `content`, or the object itself); a null result falls through
//! 3. legacy `payload`
//! 4. legacy `output_data`
//! 5. the whole envelope, verbatim

use crate::classify::{classify_http, classify_payload, envelope_failure};
use crate::normalize::structured::{decode_structured_str, unwrap_payload};
use crate::Result;
use serde_json::{Map, Value};
use tracing::debug;

/// The envelope layout that produced a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// `data` is a JSON-encoded string.
    StringPayload,
    /// `data.result_data.data`
    NestedResultData,
    /// `data.data`
    PlainData,
    /// `data.content`
    DataContent,
    /// `data` is an object without a known inner field.
    DataObject,
    /// `data` is a scalar or an array.
    DataValue,
    /// Top-level `payload`.
    LegacyPayload,
    /// Top-level `output_data`.
    LegacyOutputData,
    /// No known field; the envelope itself is the value.
    Bare,
}

impl EnvelopeShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StringPayload => "string_payload",
            Self::NestedResultData => "nested_result_data",
            Self::PlainData => "plain_data",
            Self::DataContent => "data_content",
            Self::DataObject => "data_object",
            Self::DataValue => "data_value",
            Self::LegacyPayload => "legacy_payload",
            Self::LegacyOutputData => "legacy_output_data",
            Self::Bare => "bare",
        }
    }
}

type ShapeMatcher = fn(&Map<String, Value>) -> Option<(EnvelopeShape, Value)>;

const SHAPE_MATCHERS: &[ShapeMatcher] = &[match_data, match_legacy_payload, match_legacy_output_data];

fn present<'a>(envelope: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    envelope.get(key).filter(|v| !v.is_null())
}

fn match_data(envelope: &Map<String, Value>) -> Option<(EnvelopeShape, Value)> {
    let data = present(envelope, "data")?;
    let (shape, value) = match data {
        Value::String(s) => match decode_structured_str(s) {
            Value::Object(inner) => (EnvelopeShape::StringPayload, match_data_object(&inner).1),
            other => (EnvelopeShape::StringPayload, other),
        },
        Value::Object(obj) => match_data_object(obj),
        other => (EnvelopeShape::DataValue, other.clone()),
    };
    // A null inner value is no match; later shapes get their turn.
    if value.is_null() {
        return None;
    }
    Some((shape, unwrap_payload(value)))
}

fn match_data_object(obj: &Map<String, Value>) -> (EnvelopeShape, Value) {
    if let Some(inner) = obj
        .get("result_data")
        .and_then(Value::as_object)
        .and_then(|rd| rd.get("data"))
    {
        return (EnvelopeShape::NestedResultData, inner.clone());
    }
    if let Some(inner) = obj.get("data") {
        return (EnvelopeShape::PlainData, inner.clone());
    }
    if let Some(inner) = obj.get("content") {
        return (EnvelopeShape::DataContent, inner.clone());
    }
    (EnvelopeShape::DataObject, Value::Object(obj.clone()))
}

fn match_legacy_payload(envelope: &Map<String, Value>) -> Option<(EnvelopeShape, Value)> {
    let value = match present(envelope, "payload")? {
        Value::String(s) => decode_structured_str(s),
        other => other.clone(),
    };
    Some((EnvelopeShape::LegacyPayload, value))
}

fn match_legacy_output_data(envelope: &Map<String, Value>) -> Option<(EnvelopeShape, Value)> {
    present(envelope, "output_data").map(|v| (EnvelopeShape::LegacyOutputData, v.clone()))
}

/// Extracts the logical value of a successful envelope.
///
/// The caller is responsible for the failure check; see [`normalize_response`].
pub fn resolve_envelope(envelope: &Map<String, Value>) -> (EnvelopeShape, Value) {
    SHAPE_MATCHERS
        .iter()
        .find_map(|matcher| matcher(envelope))
        .unwrap_or_else(|| (EnvelopeShape::Bare, Value::Object(envelope.clone())))
}

/// Normalizes a synchronous response into a value or a classified error.
///
/// - non-2xx → always an error, enriched from the body when it parses
/// - 2xx, body not JSON → the text, after one structured-string unwrap
/// - 2xx, JSON object → failure check first, then envelope resolution
/// - 2xx, other JSON → the decoded value
pub fn normalize_response(status: u16, body: &[u8]) -> Result<Value> {
    if !(200..300).contains(&status) {
        return Err(classify_http(status, body));
    }

    let parsed = match serde_json::from_slice::<Value>(body) {
        Ok(v) => v,
        Err(_) => return Ok(decode_structured_str(&String::from_utf8_lossy(body))),
    };

    match parsed {
        Value::Object(envelope) => {
            if let Some(payload) = envelope_failure(&envelope) {
                debug!(http_status = status, "envelope carries failure indicator");
                return Err(classify_payload(payload, Some(status)));
            }
            let (shape, value) = resolve_envelope(&envelope);
            debug!(shape = shape.as_str(), "resolved response envelope");
            Ok(value)
        }
        other => Ok(other),
    }
}
