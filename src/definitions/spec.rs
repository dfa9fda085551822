//! Declarative agent and team definitions
//!
//! Strategy and member type stay strings here so resolution can report
//! exactly which team or member carries an unsupported value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::team::Edge;

fn default_namespace() -> String {
    "default".to_string()
}

/// A definitions document: one namespace of agents and teams
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Definitions {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default)]
    pub agents: Vec<AgentSpec>,
    #[serde(default)]
    pub teams: Vec<TeamSpec>,
}

/// Definition of a single agent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// System prompt
    #[serde(default)]
    pub prompt: String,
    /// Model override; the configured default applies when absent
    #[serde(default)]
    pub model: Option<String>,
    /// Seed session memory with the system prompt
    #[serde(default)]
    pub hydrate_system_prompt: bool,
    /// Offer the `terminate_team` tool
    #[serde(default)]
    pub can_terminate: bool,
    /// Present for agents served over A2A
    #[serde(default)]
    pub remote: Option<RemoteSpec>,
}

/// Where a remote agent lives
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteSpec {
    pub address: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

/// Reference from a team to one of its members
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRef {
    pub name: String,
    /// "agent" or "team"
    #[serde(rename = "type")]
    pub kind: String,
}

impl MemberRef {
    pub fn agent(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "agent".to_string(),
        }
    }

    pub fn team(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: "team".to_string(),
        }
    }
}

/// Definition of a team
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TeamSpec {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub members: Vec<MemberRef>,
    /// sequential, round-robin, selector or graph
    pub strategy: String,
    #[serde(default)]
    pub max_turns: Option<usize>,
    #[serde(default)]
    pub selector: Option<SelectorSpec>,
    #[serde(default)]
    pub graph: Option<GraphSpec>,
}

/// Selector settings; configured defaults fill the gaps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectorSpec {
    #[serde(default)]
    pub model: Option<String>,
    /// Handlebars template
    #[serde(default)]
    pub prompt: Option<String>,
}

/// Edge list of a graph team
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    #[serde(default)]
    pub edges: Vec<Edge>,
}
