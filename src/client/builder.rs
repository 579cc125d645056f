use crate::client::core::RunAgentClient;
use crate::config::{
    EnvSettings, EnvSource, ProcessEnv, UserConfig, DEFAULT_TIMEOUT_SECS, HANDSHAKE_TIMEOUT,
};
use crate::registry::{AgentRegistry, SqliteAgentRegistry};
use crate::resolver::{resolve_endpoints, AddressOverrides};
use crate::telemetry::{noop_observer, RunObserver};
use crate::transport::{HttpTransport, ReqwestTransport, StreamConnector, WsConnector};
use crate::{Error, Result};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builder for [`RunAgentClient`].
///
/// Every setting follows the same precedence: the value set here, then the
/// environment, then the persisted user config, then the library default.
pub struct RunAgentClientBuilder {
    agent_id: String,
    entrypoint_tag: String,
    local: Option<bool>,
    host: Option<String>,
    port: Option<u16>,
    base_url: Option<String>,
    api_key: Option<String>,
    timeout_secs: Option<u64>,
    async_execution: bool,
    extra_params: Map<String, Value>,
    env: Arc<dyn EnvSource>,
    user_config: Option<UserConfig>,
    registry: Option<Arc<dyn AgentRegistry>>,
    observer: Arc<dyn RunObserver>,
    http_transport: Option<Arc<dyn HttpTransport>>,
    stream_connector: Option<Arc<dyn StreamConnector>>,
}

impl RunAgentClientBuilder {
    pub fn new(agent_id: impl Into<String>, entrypoint_tag: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            entrypoint_tag: entrypoint_tag.into(),
            local: None,
            host: None,
            port: None,
            base_url: None,
            api_key: None,
            timeout_secs: None,
            async_execution: false,
            extra_params: Map::new(),
            env: Arc::new(ProcessEnv),
            user_config: None,
            registry: None,
            observer: noop_observer(),
            http_transport: None,
            stream_connector: None,
        }
    }

    /// Talk to a locally deployed agent instead of the hosted service.
    pub fn local(mut self, local: bool) -> Self {
        self.local = Some(local);
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Client default for the `async_execution` request flag.
    pub fn async_execution(mut self, enable: bool) -> Self {
        self.async_execution = enable;
        self
    }

    /// Opaque metadata stored on the client and never interpreted.
    pub fn extra_params(mut self, params: Map<String, Value>) -> Self {
        self.extra_params = params;
        self
    }

    /// Replace the process environment as a configuration source.
    pub fn env(mut self, env: impl EnvSource + 'static) -> Self {
        self.env = Arc::new(env);
        self
    }

    /// Use this user config instead of reading `user_data.json`.
    pub fn user_config(mut self, config: UserConfig) -> Self {
        self.user_config = Some(config);
        self
    }

    pub fn registry(mut self, registry: impl AgentRegistry + 'static) -> Self {
        self.registry = Some(Arc::new(registry));
        self
    }

    /// Inject an observer for raw traffic. Default is a no-op observer.
    pub fn observer(mut self, observer: Arc<dyn RunObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn http_transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.http_transport = Some(transport);
        self
    }

    pub fn stream_connector(mut self, connector: Arc<dyn StreamConnector>) -> Self {
        self.stream_connector = Some(connector);
        self
    }

    pub fn build(self) -> Result<RunAgentClient> {
        let agent_id = self.agent_id.trim().to_string();
        if agent_id.is_empty() {
            return Err(Error::validation("agent_id is required"));
        }
        let entrypoint_tag = self.entrypoint_tag.trim().to_string();
        if entrypoint_tag.is_empty() {
            return Err(Error::validation("entrypoint_tag is required"));
        }

        let env = EnvSettings::capture(self.env.as_ref());
        let user = self
            .user_config
            .unwrap_or_else(|| UserConfig::load(&env.user_config_path()));

        let local = self.local.or(env.local).unwrap_or(false);
        let timeout_secs = self
            .timeout_secs
            .filter(|t| *t > 0)
            .or(env.timeout_secs.filter(|t| *t > 0))
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let api_key = self
            .api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .or_else(|| env.api_key.clone())
            .or_else(|| user.api_key());

        let registry: Arc<dyn AgentRegistry> = self
            .registry
            .unwrap_or_else(|| Arc::new(SqliteAgentRegistry::new(env.registry_path())));
        let overrides = AddressOverrides {
            host: self.host,
            port: self.port,
            base_url: self.base_url,
        };
        let endpoints =
            resolve_endpoints(&agent_id, local, &overrides, &env, &user, registry.as_ref())?;

        let http: Arc<dyn HttpTransport> = match self.http_transport {
            Some(transport) => transport,
            None => Arc::new(ReqwestTransport::new(
                Duration::from_secs(timeout_secs),
                env.proxy_url.as_deref(),
            )?),
        };
        let connector: Arc<dyn StreamConnector> = self
            .stream_connector
            .unwrap_or_else(|| Arc::new(WsConnector::new(HANDSHAKE_TIMEOUT)));

        debug!(
            agent_id = agent_id.as_str(),
            entrypoint_tag = entrypoint_tag.as_str(),
            local,
            timeout_secs,
            has_api_key = api_key.is_some(),
            "runagent client built"
        );

        Ok(RunAgentClient {
            agent_id,
            entrypoint_tag,
            local,
            endpoints,
            api_key,
            timeout_secs,
            async_default: self.async_execution,
            extra_params: self.extra_params,
            http,
            connector,
            observer: self.observer,
        })
    }
}
