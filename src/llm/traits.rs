//! Model provider seam
//!
//! Agents and the selector strategy are the only callers; the team engine
//! never talks to a model directly.

use async_trait::async_trait;

use crate::core::{Message, Result, TokenUsage, ToolCall, ToolDefinition};

/// One completed model turn
#[derive(Debug, Clone, Default)]
pub struct LLMResponse {
    pub content: String,
    /// Tools the model asked to call, in the order it listed them
    pub tool_calls: Vec<ToolCall>,
    /// Absent when the backend did not report counts
    pub usage: Option<TokenUsage>,
    pub model: String,
}

impl LLMResponse {
    /// Plain text response, mostly useful for mocks
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Default::default()
        }
    }
}

/// Sampling knobs passed through to the backend
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub stop: Option<Vec<String>>,
}

/// A chat model backend
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Plain chat completion
    async fn chat(
        &self,
        model: &str,
        messages: &[Message],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse>;

    /// Chat completion that may answer with tool calls
    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        options: Option<GenerateOptions>,
    ) -> Result<LLMResponse>;

    /// Models the backend can serve
    async fn list_models(&self) -> Result<Vec<String>>;

    fn name(&self) -> &str;
}
