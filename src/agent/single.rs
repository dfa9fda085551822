//! Model-backed agent
//!
//! One model call per execution. Agents allowed to terminate their team are
//! offered the `terminate_team` tool.

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::member::{Execution, MemberType, TeamMember};
use crate::agent::messages::prepare_model_messages;
use crate::agent::tools::{find_termination, terminate_tool, termination_reason, TERMINATE_RESULT};
use crate::core::{ConductorError, ExecutionContext, Message, Result};
use crate::llm::{GenerateOptions, LLMProvider};
use crate::telemetry::{TokenCounter, TokenUsageCollector};

/// A single model-backed agent
#[derive(Clone)]
pub struct Agent {
    name: String,
    description: String,
    prompt: String,
    model: String,
    hydrate_system_prompt: bool,
    can_terminate: bool,
    llm: Arc<dyn LLMProvider>,
    tokens: Arc<dyn TokenCounter>,
}

/// Builder for creating Agents
pub struct AgentBuilder {
    name: String,
    description: String,
    prompt: Option<String>,
    model: Option<String>,
    hydrate_system_prompt: bool,
    can_terminate: bool,
    llm: Option<Arc<dyn LLMProvider>>,
    tokens: Option<Arc<dyn TokenCounter>>,
}

impl AgentBuilder {
    /// Create a new builder with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            prompt: None,
            model: None,
            hydrate_system_prompt: false,
            can_terminate: false,
            llm: None,
            tokens: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the system prompt
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    /// Set the model to use
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Seed session memory with the system prompt
    pub fn hydrate_system_prompt(mut self, hydrate: bool) -> Self {
        self.hydrate_system_prompt = hydrate;
        self
    }

    /// Offer the `terminate_team` tool
    pub fn can_terminate(mut self, can_terminate: bool) -> Self {
        self.can_terminate = can_terminate;
        self
    }

    /// Set the LLM provider
    pub fn llm(mut self, llm: Arc<dyn LLMProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Set the running token counter usage is recorded into
    pub fn tokens(mut self, tokens: Arc<dyn TokenCounter>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Build the Agent
    pub fn build(self) -> Result<Agent> {
        let llm = self
            .llm
            .ok_or_else(|| ConductorError::config(format!("agent {} has no LLM provider", self.name)))?;
        let model = self
            .model
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| ConductorError::config(format!("agent {} has no model", self.name)))?;

        Ok(Agent {
            prompt: self.prompt.unwrap_or_else(|| {
                format!(
                    "You are a helpful agent named '{}'. Complete the task you are given.",
                    self.name
                )
            }),
            name: self.name,
            description: self.description,
            model,
            hydrate_system_prompt: self.hydrate_system_prompt,
            can_terminate: self.can_terminate,
            llm,
            tokens: self
                .tokens
                .unwrap_or_else(|| Arc::new(TokenUsageCollector::new())),
        })
    }
}

impl Agent {
    /// Create a builder
    pub fn builder(name: impl Into<String>) -> AgentBuilder {
        AgentBuilder::new(name)
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn can_terminate(&self) -> bool {
        self.can_terminate
    }

    /// System prompt followed by history and the current input. A history
    /// already led by the same prompt (hydrated memory) is not prompted twice.
    fn model_messages(&self, input: &Message, history: &[Message]) -> Vec<Message> {
        let hydrated = history
            .first()
            .is_some_and(|m| m.is_system() && m.content == self.prompt);

        let mut messages = Vec::with_capacity(history.len() + 2);
        if !hydrated {
            messages.push(Message::system(&self.prompt));
        }
        messages.extend(prepare_model_messages(std::slice::from_ref(input), history));
        messages
    }

    async fn call_model(&self, messages: &[Message]) -> Result<crate::llm::LLMResponse> {
        let options = Some(GenerateOptions {
            temperature: Some(0.7),
            ..Default::default()
        });

        if self.can_terminate {
            self.llm
                .chat_with_tools(&self.model, messages, &[terminate_tool()], options)
                .await
        } else {
            self.llm.chat(&self.model, messages, options).await
        }
    }
}

#[async_trait]
impl TeamMember for Agent {
    fn name(&self) -> &str {
        &self.name
    }

    fn member_type(&self) -> MemberType {
        MemberType::Agent
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn execute(
        &self,
        ctx: &ExecutionContext,
        input: &Message,
        history: &[Message],
    ) -> Execution {
        let messages = self.model_messages(input, history);

        let response = tokio::select! {
            biased;
            _ = ctx.cancelled() => return Execution::failed(Vec::new(), ConductorError::Cancelled),
            response = self.call_model(&messages) => response,
        };

        let response = match response {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(agent = %self.name, model = %self.model, error = %err, "model call failed");
                return Execution::failed(Vec::new(), err);
            }
        };

        if let Some(usage) = response.usage {
            self.tokens.record_usage(usage);
        }

        let termination = find_termination(&response.tool_calls)
            .map(|call| (termination_reason(call), call.id.clone()));

        let reply = Message::assistant_with_tools(response.content, response.tool_calls);

        match termination {
            Some((reason, call_id)) => {
                tracing::debug!(agent = %self.name, reason = %reason, "agent terminated team");
                Execution::failed(
                    vec![reply, Message::tool(TERMINATE_RESULT, call_id)],
                    ConductorError::terminated(reason),
                )
            }
            None => Execution::completed(vec![reply]),
        }
    }

    fn memory_system_prompt(&self) -> Option<&str> {
        (self.hydrate_system_prompt && !self.prompt.is_empty()).then_some(self.prompt.as_str())
    }
}
