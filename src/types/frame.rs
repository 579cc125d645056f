//! Streaming frames as sent by RunAgent servers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frame category. Unrecognized `type` strings are treated as data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Status,
    Data,
    Error,
    /// A `type` this client does not know; handled like `Data`.
    Unknown,
}

impl FrameKind {
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("status") => Self::Status,
            Some("data") => Self::Data,
            Some("error") => Self::Error,
            _ => Self::Unknown,
        }
    }
}

/// One decoded message received over the streaming transport.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StreamFrame {
    #[serde(rename = "type", default)]
    pub frame_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub content: Option<Value>,
    /// Fallback carrier used by older servers when `content` is absent.
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

impl StreamFrame {
    pub fn kind(&self) -> FrameKind {
        FrameKind::parse(self.frame_type.as_deref())
    }

    /// The error payload, when one with content is attached.
    pub fn error_payload(&self) -> Option<&Value> {
        self.error.as_ref().filter(|e| match e {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
    }

    /// The raw content carrier: `content`, falling back to `data`.
    pub fn raw_content(&self) -> Option<&Value> {
        self.content
            .as_ref()
            .filter(|v| !v.is_null())
            .or_else(|| self.data.as_ref().filter(|v| !v.is_null()))
    }
}
