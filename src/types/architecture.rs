//! Agent architecture metadata.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A named callable surface exposed by an agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntryPoint {
    pub tag: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extractor: Option<Map<String, Value>>,
}

/// Entrypoint listing for one agent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentArchitecture {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub entrypoints: Vec<EntryPoint>,
}

impl AgentArchitecture {
    pub fn has_entrypoint(&self, tag: &str) -> bool {
        self.entrypoints.iter().any(|e| e.tag == tag)
    }

    pub fn tags(&self) -> Vec<&str> {
        self.entrypoints.iter().map(|e| e.tag.as_str()).collect()
    }
}
