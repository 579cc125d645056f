use crate::error_code::{codes, ErrorKind};
use serde_json::Value;
use thiserror::Error;

/// Boxed lower-level cause kept for diagnostic chaining.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Unified error type for the RunAgent client.
///
/// Every low-level failure (transport, decode, registry) and every
/// server-reported failure is reduced to this one shape. `kind` is always a
/// concrete member of the taxonomy; `Unknown` is the fallback.
#[derive(Debug, Error)]
#[error("{kind}: {message}{}", format_tail(.code, .suggestion))]
pub struct Error {
    pub kind: ErrorKind,
    /// Short machine token (e.g. `"STREAM_ENTRYPOINT"`).
    pub code: Option<String>,
    pub message: String,
    /// Human-readable remediation hint.
    pub suggestion: Option<String>,
    /// Opaque structured context supplied by the server.
    pub details: Option<Value>,
    /// HTTP status of the response that produced this error, if any.
    pub http_status: Option<u16>,
    #[source]
    pub source: Option<BoxError>,
}

fn format_tail(code: &Option<String>, suggestion: &Option<String>) -> String {
    let mut out = String::new();
    if let Some(code) = code.as_deref().filter(|c| !c.is_empty()) {
        out.push_str(&format!(" ({})", code));
    }
    if let Some(s) = suggestion.as_deref().filter(|s| !s.is_empty()) {
        out.push_str(&format!(" | suggestion: {}", s));
    }
    out
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: None,
            message: message.into(),
            suggestion: None,
            details: None,
            http_status: None,
            source: None,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, message)
    }

    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Connection, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Server, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unknown, message)
    }

    /// The error reported when a caller-supplied cancellation signal fires.
    pub fn cancelled() -> Self {
        Self::unknown("operation cancelled").with_code(codes::CANCELLED)
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    pub fn with_source(mut self, source: impl Into<BoxError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the short code, if any.
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Returns the suggestion, if any.
    pub fn suggestion(&self) -> Option<&str> {
        self.suggestion.as_deref().filter(|s| !s.is_empty())
    }

    pub fn is_cancelled(&self) -> bool {
        self.code.as_deref() == Some(codes::CANCELLED)
    }

    /// Renders the error for the opt-in abort path.
    pub fn friendly(&self) -> String {
        match self.suggestion() {
            Some(s) => format!(
                "RunAgent error: {} ({})\nSuggestion: {}",
                self.message, self.kind, s
            ),
            None => format!("RunAgent error: {} ({})", self.message, self.kind),
        }
    }
}

/// Opt-in conversion of errors into a fatal, human-readable abort.
///
/// Intended for quick-start programs and scripts only; the core operations
/// always return errors as values.
pub trait ResultExt<T> {
    /// Returns the value or panics with [`Error::friendly`].
    fn or_abort(self) -> T;
}

impl<T> ResultExt<T> for Result<T, Error> {
    #[track_caller]
    fn or_abort(self) -> T {
        match self {
            Ok(v) => v,
            Err(e) => panic!("{}", e.friendly()),
        }
    }
}
