use crate::client::builder::RunAgentClientBuilder;
use crate::client::guard;
use crate::config::{DEFAULT_STREAM_TIMEOUT_SECS, USER_AGENT};
use crate::error_code::codes;
use crate::normalize::{normalize_architecture, normalize_response, AgentStream};
use crate::resolver::ResolvedEndpoints;
use crate::telemetry::RunObserver;
use crate::transport::{HttpReply, HttpRequest, HttpTransport, StreamConnector};
use crate::types::{AgentArchitecture, ArgToken, RunInput, RunRequest};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;
use url::Url;
use uuid::Uuid;

/// Client for one agent entrypoint.
///
/// Immutable after construction. Each call owns its own request or
/// connection, so one client can serve many concurrent invocations.
pub struct RunAgentClient {
    pub(crate) agent_id: String,
    pub(crate) entrypoint_tag: String,
    pub(crate) local: bool,
    pub(crate) endpoints: ResolvedEndpoints,
    pub(crate) api_key: Option<String>,
    pub(crate) timeout_secs: u64,
    pub(crate) async_default: bool,
    pub(crate) extra_params: Map<String, Value>,
    pub(crate) http: Arc<dyn HttpTransport>,
    pub(crate) connector: Arc<dyn StreamConnector>,
    pub(crate) observer: Arc<dyn RunObserver>,
}

impl RunAgentClient {
    pub fn builder(
        agent_id: impl Into<String>,
        entrypoint_tag: impl Into<String>,
    ) -> RunAgentClientBuilder {
        RunAgentClientBuilder::new(agent_id, entrypoint_tag)
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn entrypoint_tag(&self) -> &str {
        &self.entrypoint_tag
    }

    pub fn is_local(&self) -> bool {
        self.local
    }

    pub fn endpoints(&self) -> &ResolvedEndpoints {
        &self.endpoints
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// A copy of the opaque metadata passed at construction.
    pub fn extra_params(&self) -> Map<String, Value> {
        self.extra_params.clone()
    }

    /// Invokes a non-streaming entrypoint and returns its normalized result.
    pub async fn run(&self, input: RunInput) -> Result<Value> {
        self.run_with_cancel(input, &CancellationToken::new()).await
    }

    /// Like [`run`](Self::run), building the input from payload tokens.
    pub async fn run_tokens<I>(&self, tokens: I) -> Result<Value>
    where
        I: IntoIterator<Item = ArgToken>,
    {
        let input = RunInput::from_tokens(tokens)?;
        self.run(input).await
    }

    pub async fn run_with_cancel(&self, input: RunInput, cancel: &CancellationToken) -> Result<Value> {
        guard::ensure_non_stream(&self.entrypoint_tag)?;
        let credential = self.credential()?;

        let request = input.into_request(&self.entrypoint_tag, self.timeout_secs, self.async_default);
        let body = encode_request(&request)?;
        let url = self.endpoints.run_url(&self.agent_id);
        self.observer.on_request(&url, &body);

        let mut http_request = HttpRequest::post_json(url, body)
            .header("user-agent", USER_AGENT)
            .header("x-request-id", Uuid::new_v4().to_string())
            .timeout(Duration::from_secs(request.timeout_seconds));
        if let Some(key) = credential {
            http_request = http_request.header("authorization", format!("Bearer {}", key));
        }

        let start = Instant::now();
        let result = self
            .execute(http_request, cancel)
            .await
            .and_then(|reply| normalize_response(reply.status, &reply.body));

        if let Err(e) = &result {
            info!(
                http_status = e.http_status.unwrap_or(0),
                error_kind = e.kind.as_str(),
                agent_id = self.agent_id.as_str(),
                duration_ms = start.elapsed().as_millis() as u64,
                "runagent run failed"
            );
        }
        result
    }

    /// Opens a stream on a streaming entrypoint.
    ///
    /// The handshake has been written when this returns; chunks are read by
    /// the returned [`AgentStream`].
    pub async fn run_stream(&self, input: RunInput) -> Result<AgentStream> {
        self.run_stream_with_cancel(input, &CancellationToken::new())
            .await
    }

    /// Like [`run_stream`](Self::run_stream), building the input from payload tokens.
    pub async fn run_stream_tokens<I>(&self, tokens: I) -> Result<AgentStream>
    where
        I: IntoIterator<Item = ArgToken>,
    {
        let input = RunInput::from_tokens(tokens)?;
        self.run_stream(input).await
    }

    /// Like [`run_stream`](Self::run_stream). `cancel` also governs every
    /// later read on the returned stream.
    pub async fn run_stream_with_cancel(
        &self,
        input: RunInput,
        cancel: &CancellationToken,
    ) -> Result<AgentStream> {
        guard::ensure_stream(&self.entrypoint_tag)?;
        let credential = self.credential()?;

        let mut request: RunRequest =
            input.into_request(&self.entrypoint_tag, DEFAULT_STREAM_TIMEOUT_SECS, false);
        request.async_execution = false;
        let body = encode_request(&request)?;

        let endpoint = self.endpoints.run_stream_url(&self.agent_id);
        let mut url = Url::parse(&endpoint).map_err(|e| {
            Error::validation(format!("invalid stream URL: {}", endpoint))
                .with_code(codes::INVALID_BASE_URL)
                .with_source(e)
        })?;
        let mut headers = vec![("User-Agent".to_string(), USER_AGENT.to_string())];
        if let Some(key) = credential {
            headers.push(("Authorization".to_string(), format!("Bearer {}", key)));
            url.query_pairs_mut().append_pair("token", key);
        }
        self.observer.on_request(&endpoint, &body);

        if cancel.is_cancelled() {
            return Err(Error::cancelled());
        }
        let start = Instant::now();
        let connected = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(Error::cancelled()),
            conn = self.connector.connect(url.as_str(), &headers) => conn,
        };
        let mut conn = match connected {
            Ok(conn) => conn,
            Err(e) => {
                self.log_stream_failure(&e, start);
                return Err(e);
            }
        };

        if let Err(e) = conn.send_text(body.to_string()).await {
            let _ = conn.close().await;
            self.log_stream_failure(&e, start);
            return Err(e);
        }

        Ok(AgentStream::new(conn)
            .with_cancel(cancel.clone())
            .with_observer(self.observer.clone())
            .with_agent_id(self.agent_id.as_str()))
    }

    /// Fetches the agent's entrypoint listing.
    pub async fn get_architecture(&self) -> Result<AgentArchitecture> {
        let credential = self.credential()?;

        let mut request = HttpRequest::get(self.endpoints.architecture_url(&self.agent_id))
            .header("user-agent", USER_AGENT)
            .timeout(Duration::from_secs(self.timeout_secs));
        if let Some(key) = credential {
            request = request.header("authorization", format!("Bearer {}", key));
        }

        let reply = self.execute(request, &CancellationToken::new()).await?;
        normalize_architecture(reply.status, &reply.body)
    }

    /// Fails with `ENTRYPOINT_NOT_FOUND` when the configured tag is not
    /// listed by the agent.
    pub async fn validate_entrypoint(&self) -> Result<AgentArchitecture> {
        let architecture = self.get_architecture().await?;
        if !architecture.has_entrypoint(&self.entrypoint_tag) {
            return Err(Error::validation(format!(
                "entrypoint '{}' not found for agent {}",
                self.entrypoint_tag, self.agent_id
            ))
            .with_code(codes::ENTRYPOINT_NOT_FOUND)
            .with_suggestion(format!(
                "Available entrypoints: {}",
                architecture.tags().join(", ")
            )));
        }
        Ok(architecture)
    }

    fn credential(&self) -> Result<Option<&str>> {
        if self.local {
            return Ok(None);
        }
        match self.api_key.as_deref() {
            Some(key) => Ok(Some(key)),
            None => Err(Error::authentication("api_key is required for remote calls")
                .with_code(codes::AUTHENTICATION_REQUIRED)
                .with_suggestion("Set RUNAGENT_API_KEY or pass api_key(...) to the client builder")),
        }
    }

    async fn execute(&self, request: HttpRequest, cancel: &CancellationToken) -> Result<HttpReply> {
        if cancel.is_cancelled() {
            return Err(Error::cancelled());
        }
        let reply = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::cancelled()),
            reply = self.http.execute(request) => reply?,
        };
        self.observer.on_response(reply.status, &reply.body);
        Ok(reply)
    }

    fn log_stream_failure(&self, err: &Error, start: Instant) {
        info!(
            error_kind = err.kind.as_str(),
            agent_id = self.agent_id.as_str(),
            duration_ms = start.elapsed().as_millis() as u64,
            "runagent stream failed to start"
        );
    }
}

fn encode_request(request: &RunRequest) -> Result<Value> {
    serde_json::to_value(request).map_err(|e| {
        Error::validation("failed to encode run request")
            .with_code(codes::INVALID_ARGUMENTS)
            .with_source(e)
    })
}
