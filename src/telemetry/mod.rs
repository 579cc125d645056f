//! 可观测性钩子：请求、响应与流式帧的可注入观察者（默认不做任何事）。
//!
//! Observability hook.
//!
//! Raw request and response bodies are never logged by the library itself.
//! Callers who want to see them inject a [`RunObserver`]; the default is
//! [`NoopObserver`].
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`RunObserver`] | Trait with no-op default methods |
//! | [`NoopObserver`] | Default, observes nothing |
//! | [`TracingObserver`] | Emits bodies at `trace` level |
//! | [`InMemoryObserver`] | Records everything, for tests |

use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::trace;

/// How a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    Completed,
    Failed,
    Cancelled,
    /// Released by the caller before a terminal frame arrived.
    Dropped,
}

/// Receives raw traffic for one client. All methods default to no-ops.
pub trait RunObserver: Send + Sync {
    fn on_request(&self, _url: &str, _body: &Value) {}
    fn on_response(&self, _status: u16, _body: &[u8]) {}
    fn on_frame(&self, _raw: &str) {}
    fn on_stream_end(&self, _end: StreamEnd) {}
}

pub struct NoopObserver;

impl RunObserver for NoopObserver {}

pub fn noop_observer() -> Arc<dyn RunObserver> {
    Arc::new(NoopObserver)
}

/// Forwards raw traffic to `tracing` at `trace` level.
pub struct TracingObserver;

impl RunObserver for TracingObserver {
    fn on_request(&self, url: &str, body: &Value) {
        trace!(url, body = %body, "runagent request");
    }

    fn on_response(&self, status: u16, body: &[u8]) {
        trace!(
            http_status = status,
            body = %String::from_utf8_lossy(body),
            "runagent response"
        );
    }

    fn on_frame(&self, raw: &str) {
        trace!(frame = raw, "runagent stream frame");
    }

    fn on_stream_end(&self, end: StreamEnd) {
        trace!(end = ?end, "runagent stream ended");
    }
}

/// Observed event, as recorded by [`InMemoryObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum ObservedEvent {
    Request { url: String, body: Value },
    Response { status: u16, body: String },
    Frame(String),
    StreamEnd(StreamEnd),
}

/// Records every event in memory.
#[derive(Default)]
pub struct InMemoryObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl InMemoryObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(&self, event: ObservedEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl RunObserver for InMemoryObserver {
    fn on_request(&self, url: &str, body: &Value) {
        self.push(ObservedEvent::Request {
            url: url.to_string(),
            body: body.clone(),
        });
    }

    fn on_response(&self, status: u16, body: &[u8]) {
        self.push(ObservedEvent::Response {
            status,
            body: String::from_utf8_lossy(body).into_owned(),
        });
    }

    fn on_frame(&self, raw: &str) {
        self.push(ObservedEvent::Frame(raw.to_string()));
    }

    fn on_stream_end(&self, end: StreamEnd) {
        self.push(ObservedEvent::StreamEnd(end));
    }
}
