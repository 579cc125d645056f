//! 错误分类器：将 HTTP 状态码、结构化错误载荷与传输失败映射为统一错误。
//!
//! Error classifier.
//!
//! Reduces every failure source to one [`Error`]:
//! - an HTTP status plus an optional (possibly malformed) body,
//! - a structured or string error payload (envelope `error` field, stream frames),
//! - a lower-level transport failure.
//!
//! Classification never raises a secondary error: malformed bodies degrade to
//! a status-derived error instead of masking the original failure.

use crate::error::BoxError;
use crate::error_code::{codes, ErrorKind};
use crate::Error;
use serde_json::{Map, Value};

const DEFAULT_FAILURE_MESSAGE: &str = "agent execution failed";
const CREDENTIAL_SUGGESTION: &str = "Set RUNAGENT_API_KEY or pass api_key(...) to the client builder";

/// A server error payload before it is turned into an [`Error`].
///
/// `kind` is `Some` only when the payload named a taxonomy member explicitly,
/// so callers can tell an explicit kind apart from a derived one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorPayload {
    pub kind: Option<ErrorKind>,
    pub code: Option<String>,
    pub message: String,
    pub suggestion: Option<String>,
    pub details: Option<Value>,
}

impl ErrorPayload {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Default::default()
        }
    }

    /// Parses an `error` value as sent by RunAgent servers.
    ///
    /// `null` and empty strings carry no failure and return `None`.
    pub fn parse(raw: &Value) -> Option<Self> {
        match raw {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(Self::message(s.clone())),
            Value::Object(map) => Some(Self::from_object(map)),
            other => Some(Self::message(other.to_string())),
        }
    }

    fn from_object(map: &Map<String, Value>) -> Self {
        let str_field = |key: &str| {
            map.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let code = str_field("code");
        // `type` wins over a code that happens to name a kind.
        let kind = str_field("type")
            .and_then(|t| ErrorKind::parse(&t))
            .or_else(|| code.as_deref().and_then(ErrorKind::parse));

        let message = str_field("message")
            .or_else(|| str_field("detail"))
            .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());

        Self {
            kind,
            code,
            message,
            suggestion: str_field("suggestion"),
            details: map.get("details").filter(|v| !v.is_null()).cloned(),
        }
    }

    /// Builds the final error, using `fallback` when no explicit kind was given.
    pub fn into_error(self, fallback: ErrorKind) -> Error {
        let mut err = Error::new(self.kind.unwrap_or(fallback), self.message);
        err.code = self.code;
        err.suggestion = self.suggestion;
        err.details = self.details;
        err
    }
}

/// Returns the failure carried by a response envelope, if any.
///
/// An envelope fails when its `error` field has content or when `success` is
/// explicitly `false`. `success: true` alongside a populated `error` still
/// fails: the error field is checked first.
pub fn envelope_failure(envelope: &Map<String, Value>) -> Option<ErrorPayload> {
    if let Some(payload) = envelope.get("error").and_then(ErrorPayload::parse) {
        return Some(payload);
    }

    if envelope.get("success").and_then(Value::as_bool) == Some(false) {
        let message = envelope
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_FAILURE_MESSAGE);
        return Some(ErrorPayload::message(message));
    }

    None
}

/// Classifies a non-2xx HTTP response.
pub fn classify_http(status: u16, body: &[u8]) -> Error {
    let status_kind = ErrorKind::from_http_status(status);
    let fallback = if status_kind == ErrorKind::Unknown {
        ErrorKind::Server
    } else {
        status_kind
    };

    let payload = serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| match v {
            Value::Object(map) => envelope_failure(&map).or_else(|| detail_only(&map)),
            _ => None,
        })
        .unwrap_or_else(|| ErrorPayload::message(format!("server returned status {}", status)));

    enrich(payload.into_error(fallback).with_status(status))
}

// Frameworks such as FastAPI answer errors with `{"detail": "..."}` only.
fn detail_only(map: &Map<String, Value>) -> Option<ErrorPayload> {
    map.get("detail")
        .or_else(|| map.get("message"))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ErrorPayload::message)
}

/// Classifies an error embedded in a 2xx envelope or a stream frame.
pub fn classify_payload(payload: ErrorPayload, status: Option<u16>) -> Error {
    let mut err = payload.into_error(ErrorKind::Server);
    err.http_status = status;
    enrich(err)
}

/// Classifies the error payload of a terminal stream frame.
pub fn classify_frame_error(raw: Option<&Value>) -> Error {
    let payload = raw
        .and_then(ErrorPayload::parse)
        .unwrap_or_else(|| ErrorPayload {
            code: Some(codes::STREAM_FAILED.to_string()),
            ..ErrorPayload::message("stream failed")
        });
    classify_payload(payload, None)
}

/// Classifies a failure to obtain any response at all.
///
/// Network, DNS, TLS and handshake failures are always `Connection`.
pub fn classify_transport(message: impl Into<String>, cause: BoxError, timed_out: bool) -> Error {
    let mut err = Error::connection(message).with_source(cause);
    if timed_out {
        err = err.with_code(codes::TIMEOUT);
    }
    enrich(err)
}

/// Fills in a remediation hint when none is present.
///
/// Rules match against the lowercased message and the uppercased code.
pub fn enrich(mut err: Error) -> Error {
    if err.suggestion().is_some() {
        return err;
    }

    let msg = err.message.to_lowercase();
    let code = err.code.as_deref().unwrap_or_default().to_ascii_uppercase();

    let suggestion = if msg.contains("unexpected keyword argument")
        || msg.contains("unrecognized argument")
        || msg.contains("unknown argument")
    {
        Some("Check the entrypoint's expected parameter names. If your agent expects 'message', pass kw(\"message\", ...).")
    } else if msg.contains("entrypoint") && msg.contains("not found") {
        Some("Verify the entrypoint tag and use get_architecture() to list available tags.")
    } else if err.kind == ErrorKind::Authentication || code == "AUTHENTICATION_ERROR" {
        Some(CREDENTIAL_SUGGESTION)
    } else if err.kind == ErrorKind::Permission {
        Some("Verify that the API key has access to this agent.")
    } else if code == codes::NON_STREAM_ENTRYPOINT {
        Some("Use client.run(...) for non-stream tags.")
    } else if code == codes::STREAM_ENTRYPOINT {
        Some("Use client.run_stream(...) for *_stream tags.")
    } else if code == codes::TIMEOUT {
        Some("Increase the timeout or check whether the agent is still running.")
    } else if err.kind == ErrorKind::Connection {
        Some("Check your network connection or agent status.")
    } else {
        None
    };

    if let Some(s) = suggestion {
        err.suggestion = Some(s.to_string());
    }
    err
}
