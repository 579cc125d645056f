//! Address resolver.
//!
//! Turns the agent identifier, mode and configured overrides into the REST and
//! streaming base URLs. Runs exactly once, when a client is built.

use crate::config::{EnvSettings, UserConfig, API_PREFIX, DEFAULT_BASE_URL};
use crate::error_code::codes;
use crate::registry::AgentRegistry;
use crate::{Error, Result};
use tracing::debug;
use url::Url;

/// Explicit values passed to the client builder.
#[derive(Debug, Clone, Default)]
pub struct AddressOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub base_url: Option<String>,
}

/// Base endpoints, both already suffixed with the API prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoints {
    pub rest_base: String,
    pub stream_base: String,
}

impl ResolvedEndpoints {
    pub fn run_url(&self, agent_id: &str) -> String {
        format!("{}/agents/{}/run", self.rest_base, agent_id)
    }

    pub fn run_stream_url(&self, agent_id: &str) -> String {
        format!("{}/agents/{}/run-stream", self.stream_base, agent_id)
    }

    pub fn architecture_url(&self, agent_id: &str) -> String {
        format!("{}/agents/{}/architecture", self.rest_base, agent_id)
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

pub fn resolve_endpoints(
    agent_id: &str,
    local: bool,
    overrides: &AddressOverrides,
    env: &EnvSettings,
    user: &UserConfig,
    registry: &dyn AgentRegistry,
) -> Result<ResolvedEndpoints> {
    let endpoints = if local {
        resolve_local(agent_id, overrides, env, registry)?
    } else {
        let base_url = non_blank(&overrides.base_url)
            .or_else(|| env.base_url.clone())
            .or_else(|| user.base_url())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        normalize_remote_base(&base_url)?
    };
    debug!(
        agent_id,
        local,
        rest_base = %endpoints.rest_base,
        stream_base = %endpoints.stream_base,
        "resolved endpoints"
    );
    Ok(endpoints)
}

fn resolve_local(
    agent_id: &str,
    overrides: &AddressOverrides,
    env: &EnvSettings,
    registry: &dyn AgentRegistry,
) -> Result<ResolvedEndpoints> {
    let mut host = non_blank(&overrides.host).or_else(|| env.host.clone());
    let mut port = overrides.port.filter(|p| *p > 0).or(env.port);

    if host.is_none() || port.is_none() {
        if let Some(found) = registry.lookup(agent_id)? {
            host = host.or(Some(found.host));
            port = port.or(Some(found.port));
        }
    }

    match (host, port) {
        (Some(host), Some(port)) => Ok(ResolvedEndpoints {
            rest_base: format!("http://{}:{}{}", host, port, API_PREFIX),
            stream_base: format!("ws://{}:{}{}", host, port, API_PREFIX),
        }),
        _ => Err(Error::validation(format!("agent {} was not found locally", agent_id))
            .with_code(codes::AGENT_NOT_FOUND)
            .with_suggestion("Pass host/port explicitly or register the agent locally with the RunAgent CLI")),
    }
}

/// Adds a scheme when missing (defaulting to `https`), validates the URL and
/// derives the parallel streaming base (`https` → `wss`, `http` → `ws`).
pub fn normalize_remote_base(raw: &str) -> Result<ResolvedEndpoints> {
    let trimmed = raw.trim();
    let with_scheme = if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let invalid = || {
        Error::validation(format!("invalid base URL: {}", raw))
            .with_code(codes::INVALID_BASE_URL)
            .with_suggestion("Use a URL such as https://backend.run-agent.ai")
    };

    let rest_url = Url::parse(&with_scheme).map_err(|e| invalid().with_source(e))?;
    if rest_url.host_str().is_none() {
        return Err(invalid());
    }
    let stream_scheme = match rest_url.scheme() {
        "https" => "wss",
        "http" => "ws",
        _ => return Err(invalid()),
    };

    let mut stream_url = rest_url.clone();
    stream_url
        .set_scheme(stream_scheme)
        .map_err(|_| invalid())?;

    Ok(ResolvedEndpoints {
        rest_base: format!("{}{}", rest_url.as_str().trim_end_matches('/'), API_PREFIX),
        stream_base: format!("{}{}", stream_url.as_str().trim_end_matches('/'), API_PREFIX),
    })
}
