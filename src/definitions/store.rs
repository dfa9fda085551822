//! Definition stores
//!
//! Resolution reads the store on every run, so a reloaded file takes effect
//! on the next query.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::core::{ConductorError, Result};
use crate::definitions::spec::{AgentSpec, Definitions, TeamSpec};

/// Source of agent and team definitions
pub trait DefinitionStore: Send + Sync {
    /// Namespace all definitions belong to
    fn namespace(&self) -> String;

    fn agent(&self, name: &str) -> Option<AgentSpec>;

    fn team(&self, name: &str) -> Option<TeamSpec>;

    fn team_names(&self) -> Vec<String>;

    fn agent_names(&self) -> Vec<String>;
}

/// Definitions loaded from a TOML file, or built in memory
#[derive(Debug, Default)]
pub struct FileStore {
    path: Option<PathBuf>,
    definitions: RwLock<Definitions>,
}

impl FileStore {
    /// Load definitions from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let definitions = Self::read(&path)?;
        tracing::info!(
            path = %path.display(),
            namespace = %definitions.namespace,
            agents = definitions.agents.len(),
            teams = definitions.teams.len(),
            "loaded definitions"
        );

        Ok(Self {
            path: Some(path),
            definitions: RwLock::new(definitions),
        })
    }

    /// Parse definitions from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let definitions = toml::from_str(content)
            .map_err(|e| ConductorError::config(format!("Failed to parse definitions: {}", e)))?;
        Ok(Self::from_definitions(definitions))
    }

    pub fn from_definitions(definitions: Definitions) -> Self {
        Self {
            path: None,
            definitions: RwLock::new(definitions),
        }
    }

    /// Empty in-memory store
    pub fn in_memory(namespace: impl Into<String>) -> Self {
        Self::from_definitions(Definitions {
            namespace: namespace.into(),
            ..Default::default()
        })
    }

    /// Add or replace an agent definition
    pub fn upsert_agent(&self, spec: AgentSpec) {
        let mut defs = self.definitions.write();
        defs.agents.retain(|a| a.name != spec.name);
        defs.agents.push(spec);
    }

    /// Add or replace a team definition
    pub fn upsert_team(&self, spec: TeamSpec) {
        let mut defs = self.definitions.write();
        defs.teams.retain(|t| t.name != spec.name);
        defs.teams.push(spec);
    }

    /// Re-read the backing file. In-memory stores are left as they are.
    pub fn reload(&self) -> Result<()> {
        if let Some(path) = &self.path {
            let definitions = Self::read(path)?;
            *self.definitions.write() = definitions;
            tracing::info!(path = %path.display(), "reloaded definitions");
        }
        Ok(())
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn read(path: &Path) -> Result<Definitions> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConductorError::config(format!(
                "Failed to read definitions {}: {}",
                path.display(),
                e
            ))
        })?;
        toml::from_str(&content).map_err(|e| {
            ConductorError::config(format!(
                "Failed to parse definitions {}: {}",
                path.display(),
                e
            ))
        })
    }
}

impl DefinitionStore for FileStore {
    fn namespace(&self) -> String {
        self.definitions.read().namespace.clone()
    }

    fn agent(&self, name: &str) -> Option<AgentSpec> {
        self.definitions
            .read()
            .agents
            .iter()
            .find(|a| a.name == name)
            .cloned()
    }

    fn team(&self, name: &str) -> Option<TeamSpec> {
        self.definitions
            .read()
            .teams
            .iter()
            .find(|t| t.name == name)
            .cloned()
    }

    fn team_names(&self) -> Vec<String> {
        self.definitions
            .read()
            .teams
            .iter()
            .map(|t| t.name.clone())
            .collect()
    }

    fn agent_names(&self) -> Vec<String> {
        self.definitions
            .read()
            .agents
            .iter()
            .map(|a| a.name.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const DEFINITIONS: &str = r#"
namespace = "research"

[[agents]]
name = "writer"
description = "Writes drafts"
prompt = "You write."
hydrate_system_prompt = true

[[agents]]
name = "scout"
description = "Remote researcher"
[agents.remote]
address = "http://scout.local/a2a"
headers = { "x-api-key" = "secret" }

[[teams]]
name = "pipeline"
strategy = "graph"
max_turns = 5
members = [{ name = "writer", type = "agent" }, { name = "scout", type = "agent" }]
[teams.graph]
edges = [{ from = "writer", to = "scout" }]
"#;

    #[test]
    fn test_parse_definitions() {
        let store = FileStore::from_toml(DEFINITIONS).unwrap();
        assert_eq!(store.namespace(), "research");

        let writer = store.agent("writer").unwrap();
        assert!(writer.hydrate_system_prompt);
        assert!(writer.remote.is_none());

        let scout = store.agent("scout").unwrap();
        let remote = scout.remote.unwrap();
        assert_eq!(remote.headers["x-api-key"], "secret");

        let team = store.team("pipeline").unwrap();
        assert_eq!(team.strategy, "graph");
        assert_eq!(team.max_turns, Some(5));
        assert_eq!(team.members[1].kind, "agent");
        assert_eq!(team.graph.unwrap().edges.len(), 1);
    }

    #[test]
    fn test_load_and_reload_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(DEFINITIONS.as_bytes()).unwrap();

        let store = FileStore::load(file.path()).unwrap();
        assert_eq!(store.team_names(), vec!["pipeline".to_string()]);

        let updated = DEFINITIONS.replace("name = \"pipeline\"", "name = \"flow\"");
        std::fs::write(file.path(), updated).unwrap();
        store.reload().unwrap();

        assert!(store.team("pipeline").is_none());
        assert!(store.team("flow").is_some());
    }

    #[test]
    fn test_upsert_replaces() {
        let store = FileStore::in_memory("default");
        store.upsert_agent(AgentSpec {
            name: "a".into(),
            prompt: "one".into(),
            ..Default::default()
        });
        store.upsert_agent(AgentSpec {
            name: "a".into(),
            prompt: "two".into(),
            ..Default::default()
        });

        assert_eq!(store.agent_names().len(), 1);
        assert_eq!(store.agent("a").unwrap().prompt, "two");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = FileStore::load("/nonexistent/definitions.toml").unwrap_err();
        assert!(matches!(err, ConductorError::Config(_)));
    }
}
