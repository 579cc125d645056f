//! Stream normalizer.
//!
//! [`AgentStream`] is a pull-based state machine over one open
//! [`FrameConnection`]. Every call to [`AgentStream::next`] reads frames until
//! it can return a content chunk, end-of-stream, or a classified error. No
//! frame is read ahead and no background task delivers frames.

use crate::classify::{classify_frame_error, classify_payload, enrich, ErrorPayload};
use crate::error::ResultExt;
use crate::error_code::codes;
use crate::normalize::structured::{decode_structured_object, decode_structured_str};
use crate::telemetry::{noop_observer, RunObserver, StreamEnd};
use crate::transport::FrameConnection;
use crate::types::{FrameKind, StreamFrame};
use crate::{BoxStream, Error, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const FAILURE_VOCABULARY: &[&str] = &["error", "fail"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    AwaitingFirstFrame,
    Active,
    TerminatedOk,
    TerminatedError,
}

impl StreamState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::TerminatedOk | Self::TerminatedError)
    }
}

/// What a single frame means for the stream.
#[derive(Debug)]
pub(crate) enum FrameOutcome {
    /// Informational; keep reading.
    Skip,
    Chunk(Value),
    Completed,
    Failed(Error),
}

/// Interprets one raw message received on the stream.
pub(crate) fn interpret_frame(raw: &str) -> FrameOutcome {
    let frame: StreamFrame = match serde_json::from_str(raw) {
        Ok(frame) => frame,
        Err(e) => {
            return FrameOutcome::Failed(
                Error::server("invalid stream message")
                    .with_code(codes::INVALID_STREAM_MESSAGE)
                    .with_source(e),
            )
        }
    };

    if let Some(err) = frame.error_payload() {
        return FrameOutcome::Failed(classify_frame_error(Some(err)));
    }

    match frame.kind() {
        FrameKind::Error => FrameOutcome::Failed(classify_frame_error(None)),
        FrameKind::Status => {
            let status = frame
                .status
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase();
            if status == "stream_completed" {
                FrameOutcome::Completed
            } else if FAILURE_VOCABULARY.iter().any(|w| status.contains(w)) {
                FrameOutcome::Failed(classify_frame_error(None))
            } else {
                FrameOutcome::Skip
            }
        }
        FrameKind::Data | FrameKind::Unknown => decode_chunk(frame.raw_content()),
    }
}

fn decode_chunk(raw: Option<&Value>) -> FrameOutcome {
    let chunk = match raw {
        None => return FrameOutcome::Chunk(Value::Null),
        Some(Value::String(s)) => match decode_structured_str(s) {
            Value::Object(map) => {
                if let Some(err) = embedded_error(&map) {
                    return FrameOutcome::Failed(err);
                }
                decode_structured_object(map)
            }
            other => return FrameOutcome::Chunk(other),
        },
        Some(Value::Object(map)) => {
            if let Some(err) = embedded_error(map) {
                return FrameOutcome::Failed(err);
            }
            // { "type": "data", "data": { "content": ... } }
            match map.get("content") {
                Some(content) => content.clone(),
                None => decode_structured_object(map.clone()),
            }
        }
        Some(other) => return FrameOutcome::Chunk(other.clone()),
    };

    if let Value::Object(inner) = &chunk {
        if let Some(err) = embedded_error(inner) {
            return FrameOutcome::Failed(err);
        }
    }
    FrameOutcome::Chunk(chunk)
}

// Some servers report failures inside otherwise successful data frames.
fn embedded_error(map: &Map<String, Value>) -> Option<Error> {
    if let Some(payload) = map.get("error").and_then(ErrorPayload::parse) {
        return Some(classify_payload(payload, None));
    }
    let typed_error = map
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| t.eq_ignore_ascii_case("error"));
    if typed_error {
        let payload = ErrorPayload::parse(&Value::Object(map.clone()))?;
        return Some(classify_payload(payload, None));
    }
    None
}

/// A live stream of content chunks from one agent invocation.
///
/// The connection is closed exactly once: on the terminal frame, on
/// cancellation, on any error, or on [`close`](Self::close).
pub struct AgentStream {
    conn: Box<dyn FrameConnection>,
    state: StreamState,
    closed: bool,
    cancel: CancellationToken,
    observer: Arc<dyn RunObserver>,
    agent_id: String,
}

impl std::fmt::Debug for AgentStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentStream")
            .field("agent_id", &self.agent_id)
            .field("state", &self.state)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl AgentStream {
    pub fn new(conn: Box<dyn FrameConnection>) -> Self {
        Self {
            conn,
            state: StreamState::AwaitingFirstFrame,
            closed: false,
            cancel: CancellationToken::new(),
            observer: noop_observer(),
            agent_id: String::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_agent_id(mut self, agent_id: impl Into<String>) -> Self {
        self.agent_id = agent_id.into();
        self
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Returns the next chunk, `Ok(None)` at end-of-stream, or the terminal error.
    ///
    /// Once the stream has terminated, every further call returns `Ok(None)`.
    pub async fn next(&mut self) -> Result<Option<Value>> {
        loop {
            if self.state.is_terminal() {
                return Ok(None);
            }
            if self.cancel.is_cancelled() {
                return Err(self.cancelled().await);
            }

            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => None,
                msg = self.conn.recv_text() => Some(msg),
            };

            let raw = match received {
                None => return Err(self.cancelled().await),
                Some(Err(e)) => return Err(self.fail(e).await),
                Some(Ok(None)) => {
                    let err = enrich(
                        Error::connection("stream closed before completion")
                            .with_code(codes::STREAM_CLOSED),
                    );
                    return Err(self.fail(err).await);
                }
                Some(Ok(Some(raw))) => raw,
            };

            self.observer.on_frame(&raw);
            match interpret_frame(&raw) {
                FrameOutcome::Skip => {
                    if self.state == StreamState::AwaitingFirstFrame {
                        debug!(agent_id = %self.agent_id, "stream started");
                        self.state = StreamState::Active;
                    }
                }
                FrameOutcome::Chunk(value) => {
                    self.state = StreamState::Active;
                    return Ok(Some(value));
                }
                FrameOutcome::Completed => {
                    self.terminate(StreamState::TerminatedOk, StreamEnd::Completed)
                        .await;
                    debug!(agent_id = %self.agent_id, "stream completed");
                    return Ok(None);
                }
                FrameOutcome::Failed(err) => return Err(self.fail(err).await),
            }
        }
    }

    /// Like [`next`](Self::next), but aborts the process with a friendly
    /// message on error or on an unexpected end-of-stream.
    ///
    /// Meant for quick-start scripts only.
    pub async fn next_or_abort(&mut self) -> Value {
        match self.next().await.or_abort() {
            Some(value) => value,
            None => panic!("RunAgent stream: terminated unexpectedly before completion"),
        }
    }

    /// Releases the connection early. Idempotent.
    pub async fn close(&mut self) {
        if !self.state.is_terminal() {
            self.terminate(StreamState::TerminatedOk, StreamEnd::Dropped)
                .await;
        }
    }

    /// Adapts the stream into a `futures::Stream`. The adapted stream ends
    /// after the first error.
    pub fn into_stream(self) -> BoxStream<'static, Result<Value>> {
        Box::pin(futures::stream::unfold(Some(self), |state| async move {
            let mut stream = state?;
            match stream.next().await {
                Ok(Some(value)) => Some((Ok(value), Some(stream))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        }))
    }

    async fn cancelled(&mut self) -> Error {
        debug!(agent_id = %self.agent_id, "stream cancelled");
        self.terminate(StreamState::TerminatedError, StreamEnd::Cancelled)
            .await;
        Error::cancelled()
    }

    async fn fail(&mut self, err: Error) -> Error {
        debug!(
            agent_id = %self.agent_id,
            error_kind = err.kind.as_str(),
            "stream failed"
        );
        self.terminate(StreamState::TerminatedError, StreamEnd::Failed)
            .await;
        err
    }

    async fn terminate(&mut self, state: StreamState, end: StreamEnd) {
        self.state = state;
        if self.closed {
            return;
        }
        self.closed = true;
        if let Err(e) = self.conn.close().await {
            warn!(agent_id = %self.agent_id, error = %e, "failed to close stream connection");
        }
        self.observer.on_stream_end(end);
    }
}
