//! Response capture
//!
//! One flat, append-only record per member invocation, shared by every team
//! nested inside a run.

use std::time::Duration;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::agent::member::MemberType;
use crate::core::{Message, TokenUsage};

/// A tool call as recorded in a member response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapturedToolCall {
    pub name: String,
    /// Arguments serialized as a JSON string
    pub parameters: String,
}

/// Metadata of one member invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberResponse {
    pub agent_name: String,
    pub agent_type: MemberType,
    pub turn: usize,
    pub content: String,
    #[serde(with = "humantime_serde")]
    pub duration: Duration,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<CapturedToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_usage: Option<TokenUsage>,
}

impl MemberResponse {
    /// Build a response record from the messages a member returned
    pub fn from_messages(
        agent_name: impl Into<String>,
        agent_type: MemberType,
        turn: usize,
        messages: &[Message],
        duration: Duration,
    ) -> Self {
        Self {
            agent_name: agent_name.into(),
            agent_type,
            turn,
            content: response_content(messages),
            duration,
            error: None,
            tool_calls: captured_tool_calls(messages),
            token_usage: None,
        }
    }

    pub fn with_error(mut self, error: impl ToString) -> Self {
        self.error = Some(error.to_string());
        self
    }

    pub fn with_token_usage(mut self, usage: TokenUsage) -> Self {
        self.token_usage = Some(usage);
        self
    }
}

/// Text of the last returned message; system prompts carry no response text
fn response_content(messages: &[Message]) -> String {
    match messages.last() {
        Some(m) if !m.is_system() => m.content.clone(),
        _ => String::new(),
    }
}

fn captured_tool_calls(messages: &[Message]) -> Vec<CapturedToolCall> {
    messages
        .iter()
        .flat_map(|m| m.tool_calls())
        .map(|tc| CapturedToolCall {
            name: tc.name.clone(),
            parameters: tc.arguments.to_string(),
        })
        .collect()
}

/// Run-scoped, mutex-guarded list of member responses
#[derive(Debug, Default)]
pub struct ResponseCapture {
    responses: Mutex<Vec<MemberResponse>>,
}

impl ResponseCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, response: MemberResponse) {
        self.responses.lock().push(response);
    }

    /// Snapshot copy of everything captured so far
    pub fn responses(&self) -> Vec<MemberResponse> {
        self.responses.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.responses.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.lock().is_empty()
    }
}
