//! 本地智能体注册表：按 agent_id 查找本地部署智能体的地址。
//!
//! Local agent registry.
//!
//! The RunAgent CLI records locally deployed agents in a SQLite database
//! (`~/.runagent/runagent_local.db`, table `agents`). The client only ever
//! reads from it: one scoped connection per lookup, released before the
//! lookup returns.

use crate::{Error, Result};
use rusqlite::{Connection, OpenFlags, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Network coordinates of a locally deployed agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentAddress {
    pub host: String,
    pub port: u16,
}

impl AgentAddress {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

/// Maps an agent identifier to its local address.
pub trait AgentRegistry: Send + Sync {
    /// `Ok(None)` when the agent is not registered.
    fn lookup(&self, agent_id: &str) -> Result<Option<AgentAddress>>;
}

/// Reads the CLI's SQLite registry.
#[derive(Debug, Clone)]
pub struct SqliteAgentRegistry {
    path: PathBuf,
}

impl SqliteAgentRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AgentRegistry for SqliteAgentRegistry {
    fn lookup(&self, agent_id: &str) -> Result<Option<AgentAddress>> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "local registry not found");
            return Ok(None);
        }

        let conn = Connection::open_with_flags(&self.path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| {
                Error::connection(format!(
                    "failed to open local registry at {}",
                    self.path.display()
                ))
                .with_source(e)
            })?;

        let row: Option<(Option<String>, Option<i64>)> = conn
            .query_row(
                "SELECT host, port FROM agents WHERE agent_id = ?1",
                [agent_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| Error::server("failed to query local registry").with_source(e))?;

        let address = row.and_then(|(host, port)| {
            let host = host.filter(|h| !h.trim().is_empty())?;
            let port = port.and_then(|p| u16::try_from(p).ok()).filter(|p| *p > 0)?;
            Some(AgentAddress { host, port })
        });
        debug!(agent_id, found = address.is_some(), "local registry lookup");
        Ok(address)
    }
}

/// Fixed in-memory registry.
#[derive(Debug, Clone, Default)]
pub struct StaticAgentRegistry {
    agents: HashMap<String, AgentAddress>,
}

impl StaticAgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, agent_id: impl Into<String>, address: AgentAddress) -> Self {
        self.agents.insert(agent_id.into(), address);
        self
    }
}

impl AgentRegistry for StaticAgentRegistry {
    fn lookup(&self, agent_id: &str) -> Result<Option<AgentAddress>> {
        Ok(self.agents.get(agent_id).cloned())
    }
}
