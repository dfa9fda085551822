//! Member resolution
//!
//! Turns definitions into executable members. Every call builds fresh
//! members from the store; nothing is cached between runs. All definition
//! errors surface here, before anything executes.

use std::sync::Arc;

use url::Url;

use crate::agent::member::{MemberType, TeamMember};
use crate::agent::remote::{RemoteAgent, RemoteClient};
use crate::agent::single::Agent;
use crate::core::config::DEFAULT_SELECTOR_PROMPT;
use crate::core::{ConductorError, Result};
use crate::definitions::spec::AgentSpec;
use crate::definitions::store::DefinitionStore;
use crate::llm::LLMProvider;
use crate::team::{Selector, Strategy, Team};
use crate::telemetry::{EventSink, TokenCounter, TokenUsageCollector, TracingSink};

/// Who referenced a definition when it was resolved directly
const DIRECT: &str = "query";

/// Builds teams and agents from a definition store
pub struct MemberResolver {
    store: Arc<dyn DefinitionStore>,
    llm: Arc<dyn LLMProvider>,
    remote: Option<Arc<dyn RemoteClient>>,
    sink: Arc<dyn EventSink>,
    tokens: Arc<dyn TokenCounter>,
    default_model: String,
    selector_model: String,
    selector_prompt: String,
}

impl MemberResolver {
    pub fn new(store: Arc<dyn DefinitionStore>, llm: Arc<dyn LLMProvider>) -> Self {
        Self {
            store,
            llm,
            remote: None,
            sink: Arc::new(TracingSink),
            tokens: Arc::new(TokenUsageCollector::new()),
            default_model: "qwen3:8b".to_string(),
            selector_model: "qwen3:8b".to_string(),
            selector_prompt: DEFAULT_SELECTOR_PROMPT.to_string(),
        }
    }

    /// Client used for agents with a remote address
    pub fn with_remote_client(mut self, client: Arc<dyn RemoteClient>) -> Self {
        self.remote = Some(client);
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_tokens(mut self, tokens: Arc<dyn TokenCounter>) -> Self {
        self.tokens = tokens;
        self
    }

    /// Models used when a definition does not name one
    pub fn with_models(mut self, default: impl Into<String>, selector: impl Into<String>) -> Self {
        self.default_model = default.into();
        self.selector_model = selector.into();
        self
    }

    /// Selector template used when a team does not carry its own
    pub fn with_selector_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.selector_prompt = prompt.into();
        self
    }

    pub fn store(&self) -> &Arc<dyn DefinitionStore> {
        &self.store
    }

    pub fn sink(&self) -> &Arc<dyn EventSink> {
        &self.sink
    }

    pub fn tokens(&self) -> &Arc<dyn TokenCounter> {
        &self.tokens
    }

    pub fn llm(&self) -> &Arc<dyn LLMProvider> {
        &self.llm
    }

    /// Build a team and, recursively, all of its members
    pub fn resolve_team(&self, name: &str) -> Result<Team> {
        self.build_team(name, DIRECT, &mut Vec::new())
    }

    /// Build a single agent (model-backed or remote)
    pub fn resolve_agent(&self, name: &str) -> Result<Arc<dyn TeamMember>> {
        self.build_agent(name, DIRECT)
    }

    fn full_name(&self, name: &str) -> String {
        format!("{}/{}", self.store.namespace(), name)
    }

    /// `stack` holds the teams currently being built, outermost first
    fn build_team(&self, name: &str, referenced_by: &str, stack: &mut Vec<String>) -> Result<Team> {
        let full_name = self.full_name(name);

        if stack.iter().any(|t| t == name) {
            return Err(ConductorError::TeamCycle(full_name));
        }

        let spec = self.store.team(name).ok_or_else(|| ConductorError::TeamNotFound {
            name: name.to_string(),
            team: referenced_by.to_string(),
        })?;

        let strategy: Strategy =
            spec.strategy
                .parse()
                .map_err(|_| ConductorError::UnsupportedStrategy {
                    strategy: spec.strategy.clone(),
                    team: full_name.clone(),
                })?;

        if spec.members.is_empty() {
            return Err(ConductorError::EmptyTeam(full_name));
        }

        stack.push(name.to_string());
        let mut members: Vec<Arc<dyn TeamMember>> = Vec::with_capacity(spec.members.len());
        for member in &spec.members {
            let kind: MemberType =
                member
                    .kind
                    .parse()
                    .map_err(|_| ConductorError::UnsupportedMemberType {
                        kind: member.kind.clone(),
                        member: member.name.clone(),
                        team: full_name.clone(),
                    })?;

            let resolved: Arc<dyn TeamMember> = match kind {
                MemberType::Agent => self.build_agent(&member.name, &full_name)?,
                MemberType::Team => Arc::new(self.build_team(&member.name, &full_name, stack)?),
            };
            members.push(resolved);
        }
        stack.pop();

        let mut builder = Team::builder(&spec.name)
            .namespace(self.store.namespace())
            .description(&spec.description)
            .members(members)
            .strategy(strategy)
            .max_turns(spec.max_turns)
            .edges(spec.graph.map(|g| g.edges).unwrap_or_default())
            .sink(self.sink.clone())
            .tokens(self.tokens.clone());

        if strategy == Strategy::Selector {
            let selector_spec = spec.selector.unwrap_or_default();
            let model = selector_spec
                .model
                .unwrap_or_else(|| self.selector_model.clone());
            let prompt = selector_spec
                .prompt
                .unwrap_or_else(|| self.selector_prompt.clone());
            builder = builder.selector(Selector::new(self.llm.clone(), model, &prompt)?);
        }

        let team = builder.build()?;
        tracing::debug!(team = %team.full_name(), strategy = %strategy, "resolved team");
        Ok(team)
    }

    fn build_agent(&self, name: &str, referenced_by: &str) -> Result<Arc<dyn TeamMember>> {
        let spec = self.store.agent(name).ok_or_else(|| ConductorError::AgentNotFound {
            name: name.to_string(),
            team: referenced_by.to_string(),
        })?;

        if spec.remote.is_some() {
            return self.build_remote_agent(spec);
        }

        let mut builder = Agent::builder(&spec.name)
            .description(&spec.description)
            .model(spec.model.unwrap_or_else(|| self.default_model.clone()))
            .hydrate_system_prompt(spec.hydrate_system_prompt)
            .can_terminate(spec.can_terminate)
            .llm(self.llm.clone())
            .tokens(self.tokens.clone());
        if !spec.prompt.trim().is_empty() {
            builder = builder.prompt(spec.prompt);
        }

        Ok(Arc::new(builder.build()?))
    }

    fn build_remote_agent(&self, spec: AgentSpec) -> Result<Arc<dyn TeamMember>> {
        let Some(remote) = spec.remote else {
            return Err(ConductorError::config(format!("agent {} is not remote", spec.name)));
        };

        let address = Url::parse(&remote.address).map_err(|e| {
            ConductorError::config(format!(
                "invalid address {} for remote agent {}: {}",
                remote.address, spec.name, e
            ))
        })?;
        if !matches!(address.scheme(), "http" | "https") {
            return Err(ConductorError::config(format!(
                "remote agent {} must use http or https, got {}",
                spec.name,
                address.scheme()
            )));
        }

        let client = self.remote.clone().ok_or_else(|| {
            ConductorError::config(format!(
                "no remote client configured for agent {}",
                spec.name
            ))
        })?;

        Ok(Arc::new(
            RemoteAgent::new(spec.name, spec.description, address, client)
                .with_headers(remote.headers),
        ))
    }
}
