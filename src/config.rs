//! 配置：环境变量快照、持久化用户配置文件与默认常量。
//!
//! Configuration sources.
//!
//! Every setting is resolved with the same precedence: explicit builder value,
//! then environment, then the persisted user config file (credential and base
//! URL only), then the library default. The environment is read exactly once,
//! when a client is built; later changes do not affect existing clients.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const ENV_API_KEY: &str = "RUNAGENT_API_KEY";
pub const ENV_BASE_URL: &str = "RUNAGENT_BASE_URL";
pub const ENV_LOCAL: &str = "RUNAGENT_LOCAL";
pub const ENV_HOST: &str = "RUNAGENT_HOST";
pub const ENV_PORT: &str = "RUNAGENT_PORT";
pub const ENV_TIMEOUT: &str = "RUNAGENT_TIMEOUT";
pub const ENV_CACHE_DIR: &str = "RUNAGENT_CACHE_DIR";
pub const ENV_PROXY_URL: &str = "RUNAGENT_PROXY_URL";

pub const DEFAULT_BASE_URL: &str = "https://backend.run-agent.ai";
pub const API_PREFIX: &str = "/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_STREAM_TIMEOUT_SECS: u64 = 600;
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

pub const CACHE_DIR_NAME: &str = ".runagent";
pub const DATABASE_FILE_NAME: &str = "runagent_local.db";
pub const USER_DATA_FILE_NAME: &str = "user_data.json";

pub const USER_AGENT: &str = concat!("runagent-rust/", env!("CARGO_PKG_VERSION"));

/// Read-only key/value lookup over an environment.
pub trait EnvSource: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

/// The real process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

fn non_blank(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Snapshot of every environment key the client reads.
///
/// Blank values count as absent; unparseable numbers and booleans are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvSettings {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub local: Option<bool>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub timeout_secs: Option<u64>,
    pub cache_dir: Option<PathBuf>,
    pub proxy_url: Option<String>,
}

impl EnvSettings {
    pub fn capture(env: &dyn EnvSource) -> Self {
        let get = |key: &str| non_blank(env.var(key));
        Self {
            api_key: get(ENV_API_KEY),
            base_url: get(ENV_BASE_URL),
            local: get(ENV_LOCAL).and_then(|v| parse_bool(&v)),
            host: get(ENV_HOST),
            port: get(ENV_PORT).and_then(|v| v.parse().ok()),
            timeout_secs: get(ENV_TIMEOUT).and_then(|v| v.parse().ok()),
            cache_dir: get(ENV_CACHE_DIR).map(PathBuf::from),
            proxy_url: get(ENV_PROXY_URL),
        }
    }

    /// `RUNAGENT_CACHE_DIR`, else `~/.runagent`.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|home| home.join(CACHE_DIR_NAME))
                .unwrap_or_else(|| PathBuf::from(CACHE_DIR_NAME))
        })
    }

    pub fn registry_path(&self) -> PathBuf {
        self.cache_dir().join(DATABASE_FILE_NAME)
    }

    pub fn user_config_path(&self) -> PathBuf {
        self.cache_dir().join(USER_DATA_FILE_NAME)
    }
}

/// Persisted user settings, as written by the RunAgent CLI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub user_info: Map<String, Value>,
}

impl UserConfig {
    /// Reads the file at `path`. A missing or malformed file yields the empty config.
    pub fn load(path: &Path) -> Self {
        let raw = match std::fs::read(path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "user config not loaded");
                return Self::default();
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(config) => config,
            Err(e) => {
                debug!(path = %path.display(), error = %e, "user config is not valid JSON");
                Self::default()
            }
        }
    }

    pub fn api_key(&self) -> Option<String> {
        non_blank(self.api_key.clone())
    }

    pub fn base_url(&self) -> Option<String> {
        non_blank(self.base_url.clone())
    }
}
