//! Query orchestrator
//!
//! Runs one query against a team or agent: resolves it fresh from the
//! definitions, splits the input into current message and context, executes
//! with a response capture attached and reports what the run produced.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::agent::member::TeamMember;
use crate::agent::messages::{
    prepare_agent_messages_for_memory, prepare_execution_messages,
    prepare_team_messages_for_memory,
};
use crate::agent::remote::A2aClient;
use crate::core::{Config, ConductorError, ExecutionContext, Message, Result, TokenUsage};
use crate::definitions::{FileStore, MemberResolver};
use crate::llm::OllamaClient;
use crate::telemetry::{MemberResponse, TokenUsageCollector, TracingSink};

/// Everything one query produced
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub query_id: String,
    /// Messages produced by the run, in order
    pub new_messages: Vec<Message>,
    /// Messages to append to session memory
    pub memory_messages: Vec<Message>,
    /// One record per member invocation, nested teams included
    pub responses: Vec<MemberResponse>,
    pub token_usage: TokenUsage,
    /// Execution error; partial output is still present above
    #[serde(serialize_with = "serialize_error")]
    pub error: Option<ConductorError>,
}

fn serialize_error<S: serde::Serializer>(
    error: &Option<ConductorError>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match error {
        Some(err) => serializer.serialize_some(&err.to_string()),
        None => serializer.serialize_none(),
    }
}

impl RunReport {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Text of the last produced message that has any
    pub fn final_content(&self) -> Option<&str> {
        self.new_messages
            .iter()
            .rev()
            .map(|m| m.content.as_str())
            .find(|c| !c.trim().is_empty())
    }
}

/// Runs queries against definitions
pub struct Orchestrator {
    resolver: MemberResolver,
}

impl Orchestrator {
    pub fn new(resolver: MemberResolver) -> Self {
        Self { resolver }
    }

    /// Wire Ollama, the definitions file and the A2A client from configuration
    pub fn with_config(config: &Config) -> Result<Self> {
        let path = config.engine.definitions.as_ref().ok_or_else(|| {
            ConductorError::config(
                "No definitions file configured. Pass --definitions or set CONDUCTOR_DEFINITIONS",
            )
        })?;

        let store = Arc::new(FileStore::load(path)?);
        let llm = Arc::new(OllamaClient::from_config(config)?);
        let remote = Arc::new(A2aClient::new(Duration::from_secs(
            config.remote.timeout_secs,
        ))?);

        let resolver = MemberResolver::new(store, llm)
            .with_remote_client(remote)
            .with_sink(Arc::new(TracingSink))
            .with_tokens(Arc::new(TokenUsageCollector::new()))
            .with_models(&config.models.default, &config.models.selector)
            .with_selector_prompt(&config.engine.selector_prompt);

        Ok(Self::new(resolver))
    }

    pub fn resolver(&self) -> &MemberResolver {
        &self.resolver
    }

    /// Check the model backend is reachable
    pub async fn initialize(&self) -> Result<Vec<String>> {
        let models = self.resolver.llm().list_models().await?;
        tracing::debug!(provider = %self.resolver.llm().name(), models = ?models, "model backend reachable");
        Ok(models)
    }

    /// Running token total across all runs of this orchestrator
    pub fn token_summary(&self) -> TokenUsage {
        self.resolver.tokens().token_summary()
    }

    /// Run a query against a team.
    ///
    /// Definition errors and empty input are returned as `Err` before
    /// anything executes; execution errors land in the report.
    pub async fn run_team(
        &self,
        ctx: ExecutionContext,
        name: &str,
        input: &[Message],
        memory: &[Message],
    ) -> Result<RunReport> {
        let team = self.resolver.resolve_team(name)?;
        let (current, context) = prepare_execution_messages(input, memory)?;

        let report = self
            .run_member(ctx, &team, &current, &context, |response| {
                prepare_team_messages_for_memory(&team, memory, input, response)
            })
            .await;
        Ok(report)
    }

    /// Run a query against a single agent
    pub async fn run_agent(
        &self,
        ctx: ExecutionContext,
        name: &str,
        input: &[Message],
        memory: &[Message],
    ) -> Result<RunReport> {
        let agent = self.resolver.resolve_agent(name)?;
        let (current, context) = prepare_execution_messages(input, memory)?;

        let report = self
            .run_member(ctx, agent.as_ref(), &current, &context, |response| {
                prepare_agent_messages_for_memory(agent.as_ref(), memory, input, response)
            })
            .await;
        Ok(report)
    }

    async fn run_member<F>(
        &self,
        ctx: ExecutionContext,
        member: &dyn TeamMember,
        current: &Message,
        context: &[Message],
        memory_for: F,
    ) -> RunReport
    where
        F: FnOnce(&[Message]) -> Vec<Message>,
    {
        let (ctx, capture) = ctx.with_response_capture();
        let tokens_before = self.resolver.tokens().token_summary();

        tracing::info!(
            query_id = %ctx.query_id,
            member = %member.name(),
            member_type = %member.member_type(),
            "running query"
        );

        let execution = member.execute(&ctx, current, context).await;
        let token_usage = self
            .resolver
            .tokens()
            .token_summary()
            .delta_since(&tokens_before);

        // A lone agent calling terminate_team has nothing left to stop
        let error = execution.error.filter(|err| !err.is_termination());
        if let Some(err) = &error {
            tracing::warn!(query_id = %ctx.query_id, error = %err, "query failed");
        }

        RunReport {
            query_id: ctx.query_id.clone(),
            memory_messages: memory_for(&execution.messages),
            new_messages: execution.messages,
            responses: capture.responses(),
            token_usage,
            error,
        }
    }
}
