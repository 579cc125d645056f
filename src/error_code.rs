//! 错误分类：定义封闭的错误类别集合与稳定的短错误码。
//!
//! Closed error taxonomy shared by every RunAgent SDK.
//!
//! Every error raised by this crate carries exactly one [`ErrorKind`]. The
//! string forms (`"AUTHENTICATION_ERROR"`, ...) are the wire names used by
//! RunAgent servers inside structured error payloads.
//!
//! | Kind            | Typical source                                   |
//! |-----------------|--------------------------------------------------|
//! | Authentication  | missing/invalid credential, HTTP 401             |
//! | Permission      | valid credential without access, HTTP 403        |
//! | Connection      | DNS, TLS, connection reset, handshake, timeout   |
//! | Validation      | local precondition failures, bad caller input    |
//! | Server          | non-2xx status, explicit failure envelopes       |
//! | Unknown         | catch-all, cancellation                          |
//!
//! ## Example
//!
//! ```rust
//! use runagent::error_code::ErrorKind;
//!
//! assert_eq!(ErrorKind::from_http_status(401), ErrorKind::Authentication);
//! assert_eq!(ErrorKind::parse("server_error"), Some(ErrorKind::Server));
//! assert_eq!(ErrorKind::Validation.as_str(), "VALIDATION_ERROR");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Missing, invalid or expired credential.
    #[serde(rename = "AUTHENTICATION_ERROR")]
    Authentication,
    /// Credential is valid but lacks access to the agent.
    #[serde(rename = "PERMISSION_ERROR")]
    Permission,
    /// No response could be obtained (network, DNS, TLS, handshake).
    #[serde(rename = "CONNECTION_ERROR")]
    Connection,
    /// Local precondition or caller input problem.
    #[serde(rename = "VALIDATION_ERROR")]
    Validation,
    /// Server-reported failure.
    #[serde(rename = "SERVER_ERROR")]
    Server,
    /// Could not be classified.
    #[serde(rename = "UNKNOWN_ERROR")]
    Unknown,
}

impl ErrorKind {
    /// Returns the canonical wire name (e.g. `"SERVER_ERROR"`).
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Authentication => "AUTHENTICATION_ERROR",
            Self::Permission => "PERMISSION_ERROR",
            Self::Connection => "CONNECTION_ERROR",
            Self::Validation => "VALIDATION_ERROR",
            Self::Server => "SERVER_ERROR",
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Parses a kind from a server-supplied `type`/`code` string.
    ///
    /// Matching is case-insensitive and accepts both the canonical names and
    /// the short forms (`"authentication"`, `"permission_denied"`, ...).
    /// Strings outside the taxonomy return `None` so that the caller keeps
    /// whatever kind it derived from other signals.
    pub fn parse(raw: &str) -> Option<Self> {
        let kind = match raw.trim().to_ascii_lowercase().as_str() {
            "authentication_error" | "authentication" | "unauthorized" | "invalid_api_key" => {
                Self::Authentication
            }
            "permission_error" | "permission" | "permission_denied" | "forbidden" => {
                Self::Permission
            }
            "connection_error" | "connection" => Self::Connection,
            "validation_error" | "validation" | "invalid_request" => Self::Validation,
            "server_error" | "server" | "internal_error" | "execution_error" => Self::Server,
            "unknown_error" | "unknown" => Self::Unknown,
            _ => return None,
        };
        Some(kind)
    }

    /// Maps an HTTP status code to the kind it implies on its own.
    ///
    /// Any non-2xx status that is not an auth failure is a server-reported
    /// failure. 2xx statuses map to `Unknown` (they are not errors by status).
    pub fn from_http_status(status: u16) -> Self {
        match status {
            401 => Self::Authentication,
            403 => Self::Permission,
            200..=299 => Self::Unknown,
            _ => Self::Server,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable short machine tokens attached to [`crate::Error::code`].
pub mod codes {
    /// A streaming entrypoint was passed to the synchronous operation.
    pub const STREAM_ENTRYPOINT: &str = "STREAM_ENTRYPOINT";
    /// A non-streaming entrypoint was passed to the streaming operation.
    pub const NON_STREAM_ENTRYPOINT: &str = "NON_STREAM_ENTRYPOINT";
    pub const ARCHITECTURE_MISSING: &str = "ARCHITECTURE_MISSING";
    pub const ENTRYPOINT_NOT_FOUND: &str = "ENTRYPOINT_NOT_FOUND";
    pub const AGENT_NOT_FOUND: &str = "AGENT_NOT_FOUND";
    pub const AUTHENTICATION_REQUIRED: &str = "AUTHENTICATION_REQUIRED";
    pub const INVALID_ARGUMENTS: &str = "INVALID_ARGUMENTS";
    pub const INVALID_BASE_URL: &str = "INVALID_BASE_URL";
    pub const TIMEOUT: &str = "TIMEOUT";
    pub const CANCELLED: &str = "CANCELLED";
    pub const STREAM_FAILED: &str = "STREAM_FAILED";
    /// The server closed the stream before `stream_completed`.
    pub const STREAM_CLOSED: &str = "STREAM_CLOSED";
    pub const INVALID_STREAM_MESSAGE: &str = "INVALID_STREAM_MESSAGE";
}
