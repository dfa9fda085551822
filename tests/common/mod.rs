//! Shared test doubles: scripted members and a scripted model

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use conductor::core::{ToolDefinition, TokenUsage};
use conductor::llm::{GenerateOptions, LLMProvider, LLMResponse};
use conductor::telemetry::TokenCounter;
use conductor::{ConductorError, Execution, ExecutionContext, MemberType, Message, Result, TeamMember};

/// What a scripted member does when executed
#[derive(Debug, Clone)]
pub enum Behavior {
    /// Reply with `<name>: <n>` where n counts calls from 1
    Reply,
    /// Reply, then fail
    Fail,
    /// Reply, then return the termination sentinel
    Terminate,
    /// Cancel the context, then reply
    Cancel,
}

/// Member with scripted behavior that records what it saw
pub struct Scripted {
    name: String,
    behavior: Behavior,
    usage: Option<(Arc<dyn TokenCounter>, TokenUsage)>,
    seen: Mutex<Vec<Vec<Message>>>,
}

impl Scripted {
    pub fn new(name: &str, behavior: Behavior) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior,
            usage: None,
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn reply(name: &str) -> Arc<Self> {
        Self::new(name, Behavior::Reply)
    }

    /// Reply and record token usage on every call
    pub fn with_usage(name: &str, tokens: Arc<dyn TokenCounter>, usage: TokenUsage) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            behavior: Behavior::Reply,
            usage: Some((tokens, usage)),
            seen: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().len()
    }

    /// History passed on each call
    pub fn seen(&self) -> Vec<Vec<Message>> {
        self.seen.lock().clone()
    }
}

#[async_trait]
impl TeamMember for Scripted {
    fn name(&self) -> &str {
        &self.name
    }

    fn member_type(&self) -> MemberType {
        MemberType::Agent
    }

    fn description(&self) -> &str {
        "scripted test member"
    }

    async fn execute(&self, ctx: &ExecutionContext, _input: &Message, history: &[Message]) -> Execution {
        let n = {
            let mut seen = self.seen.lock();
            seen.push(history.to_vec());
            seen.len()
        };

        if let Some((tokens, usage)) = &self.usage {
            tokens.record_usage(*usage);
        }

        let reply = vec![Message::assistant(format!("{}: {}", self.name, n))];
        match self.behavior {
            Behavior::Reply => Execution::completed(reply),
            Behavior::Fail => Execution::failed(reply, ConductorError::llm("model unavailable")),
            Behavior::Terminate => Execution::failed(reply, ConductorError::terminated("work is done")),
            Behavior::Cancel => {
                ctx.cancel();
                Execution::completed(reply)
            }
        }
    }
}

pub fn members(list: &[&Arc<Scripted>]) -> Vec<Arc<dyn TeamMember>> {
    list.iter().map(|m| (*m).clone() as Arc<dyn TeamMember>).collect()
}

pub fn contents(messages: &[Message]) -> Vec<String> {
    messages.iter().map(|m| m.content.clone()).collect()
}

/// Model that answers from a queue of scripted replies, or with a closure
/// over the request when the queue is empty
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<LLMResponse>>,
    fallback: Box<dyn Fn(&[Message]) -> String + Send + Sync>,
    failure: Option<String>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl ScriptedLlm {
    pub fn new(replies: Vec<LLMResponse>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into()),
            fallback: Box::new(|_| "ok".to_string()),
            failure: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn answering<F>(answer: F) -> Arc<Self>
    where
        F: Fn(&[Message]) -> String + Send + Sync + 'static,
    {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Box::new(answer),
            failure: None,
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Model whose every call fails with an LLM error
    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::new()),
            fallback: Box::new(|_| String::new()),
            failure: Some(message.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().clone()
    }

    fn respond(&self, messages: &[Message]) -> Result<LLMResponse> {
        self.requests.lock().push(messages.to_vec());
        if let Some(message) = &self.failure {
            return Err(ConductorError::llm(message.clone()));
        }
        Ok(self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| LLMResponse::text((self.fallback)(messages))))
    }
}

#[async_trait]
impl LLMProvider for ScriptedLlm {
    async fn chat(
        &self,
        _model: &str,
        messages: &[Message],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.respond(messages)
    }

    async fn chat_with_tools(
        &self,
        _model: &str,
        messages: &[Message],
        _tools: &[ToolDefinition],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.respond(messages)
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec!["scripted".to_string()])
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
