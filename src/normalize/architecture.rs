//! Architecture lookup normalization.
//!
//! Accepts the enveloped shape `{success, data: {agent_id, entrypoints}, message, error}`
//! as well as the legacy bare `{agent_id?, entrypoints}` shape.

use crate::classify::{classify_http, classify_payload, envelope_failure};
use crate::error_code::codes;
use crate::types::AgentArchitecture;
use crate::{Error, Result};
use serde_json::{Map, Value};

fn is_enveloped(map: &Map<String, Value>) -> bool {
    ["success", "data", "message", "error"]
        .iter()
        .any(|k| map.contains_key(*k))
        && !map.contains_key("entrypoints")
}

fn missing() -> Error {
    Error::validation("architecture endpoint returned no entrypoints")
        .with_code(codes::ARCHITECTURE_MISSING)
        .with_suggestion("Redeploy the agent with entrypoints configured")
}

pub fn normalize_architecture(status: u16, body: &[u8]) -> Result<AgentArchitecture> {
    if !(200..300).contains(&status) {
        return Err(classify_http(status, body));
    }

    let map = match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => return Err(Error::unknown("unexpected architecture response")),
        Err(e) => {
            return Err(Error::unknown("failed to decode architecture response").with_source(e))
        }
    };

    let inner = if is_enveloped(&map) {
        if let Some(payload) = envelope_failure(&map) {
            return Err(classify_payload(payload, Some(status)));
        }
        match map.get("data") {
            Some(Value::Object(data)) => Value::Object(data.clone()),
            _ => return Err(missing()),
        }
    } else {
        Value::Object(map)
    };

    let architecture: AgentArchitecture = serde_json::from_value(inner)
        .map_err(|e| Error::unknown("failed to decode architecture response").with_source(e))?;

    if architecture.entrypoints.is_empty() {
        return Err(missing());
    }
    Ok(architecture)
}
