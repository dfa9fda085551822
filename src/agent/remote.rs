//! Remote agents over the A2A protocol
//!
//! A remote agent sends the current input text to a JSON-RPC endpoint and
//! returns the reply as one assistant message. Tasks that are still running
//! when the call returns are reported as errors; there is no polling.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use url::Url;
use uuid::Uuid;

use crate::agent::member::{Execution, MemberType, TeamMember};
use crate::core::{ConductorError, ExecutionContext, Message, Result};

/// Transport used by remote agents
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Send one text message and return the text of the reply
    async fn send_message(
        &self,
        address: &Url,
        headers: &BTreeMap<String, String>,
        text: &str,
    ) -> Result<String>;
}

/// A team member backed by a remote A2A agent
#[derive(Clone)]
pub struct RemoteAgent {
    name: String,
    description: String,
    address: Url,
    headers: BTreeMap<String, String>,
    client: Arc<dyn RemoteClient>,
}

impl RemoteAgent {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        address: Url,
        client: Arc<dyn RemoteClient>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            address,
            headers: BTreeMap::new(),
            client,
        }
    }

    /// Headers sent with every request
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    pub fn address(&self) -> &Url {
        &self.address
    }
}

#[async_trait]
impl TeamMember for RemoteAgent {
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
        _history: &[Message],
    ) -> Execution {
        tracing::debug!(agent = %self.name, address = %self.address, "calling remote agent");

        let reply = tokio::select! {
            biased;
            _ = ctx.cancelled() => Err(ConductorError::Cancelled),
            reply = self.client.send_message(&self.address, &self.headers, &input.content) => reply,
        };

        reply.map(|text| vec![Message::assistant(text)]).into()
    }
}

/// JSON-RPC client for `message/send`
#[derive(Clone)]
pub struct A2aClient {
    client: Client,
}

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: Value,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

impl A2aClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn request(text: &str) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method: "message/send",
            params: json!({
                "message": {
                    "kind": "message",
                    "messageId": Uuid::new_v4().to_string(),
                    "role": "user",
                    "parts": [{"kind": "text", "text": text}]
                }
            }),
        }
    }
}

#[async_trait]
impl RemoteClient for A2aClient {
    async fn send_message(
        &self,
        address: &Url,
        headers: &BTreeMap<String, String>,
        text: &str,
    ) -> Result<String> {
        let mut request = self.client.post(address.clone()).json(&Self::request(text));
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request
            .send()
            .await
            .map_err(|e| ConductorError::remote(format!("failed to connect to A2A server: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConductorError::remote(format!(
                "A2A server returned HTTP status {}",
                status.as_u16()
            )));
        }

        let body: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| ConductorError::remote(format!("failed to parse JSON-RPC response: {}", e)))?;

        if let Some(error) = body.error {
            return Err(ConductorError::remote(format!(
                "A2A server returned error: {} (code {})",
                error.message, error.code
            )));
        }

        extract_reply(&body.result.unwrap_or(Value::Null))
    }
}

/// Text of a `message/send` result: a bare string, a message with parts, or a task
pub fn extract_reply(result: &Value) -> Result<String> {
    if let Some(text) = result.as_str() {
        return Ok(text.to_string());
    }

    let map = result
        .as_object()
        .ok_or_else(|| ConductorError::remote("response result is not a map or string"))?;

    if let Some(parts) = map.get("parts").and_then(Value::as_array) {
        if !parts.is_empty() {
            return text_from_parts(parts, true);
        }
    }

    if map.get("kind").and_then(Value::as_str) == Some("task") {
        return task_reply(result);
    }

    Err(ConductorError::remote("unknown A2A response format"))
}

fn task_reply(task: &Value) -> Result<String> {
    let status = task
        .get("status")
        .filter(|s| s.is_object())
        .ok_or_else(|| ConductorError::remote("task response missing status"))?;
    let state = status
        .get("state")
        .and_then(Value::as_str)
        .ok_or_else(|| ConductorError::remote("task status missing state field"))?;

    match state {
        "completed" => {
            let artifacts = task
                .get("artifacts")
                .and_then(Value::as_array)
                .filter(|a| !a.is_empty())
                .ok_or_else(|| ConductorError::remote("completed task has no artifacts"))?;

            let text: String = artifacts
                .iter()
                .filter_map(|artifact| artifact.get("parts").and_then(Value::as_array))
                .filter_map(|parts| text_from_parts(parts, false).ok())
                .collect();

            if text.is_empty() {
                return Err(ConductorError::remote("no artifacts with text content found"));
            }
            Ok(text)
        }
        "failed" => {
            let reason = status
                .pointer("/message/parts")
                .and_then(Value::as_array)
                .and_then(|parts| text_from_parts(parts, true).ok())
                .unwrap_or_else(|| "no error message available".to_string());
            Err(ConductorError::remote(format!("task failed: {}", reason)))
        }
        "submitted" | "working" => Err(ConductorError::remote(format!(
            "task is still {}; polling is not supported",
            state
        ))),
        other => Err(ConductorError::remote(format!("unknown task state: {}", other))),
    }
}

/// Concatenate text parts. Strict mode rejects malformed parts and empty text.
fn text_from_parts(parts: &[Value], strict: bool) -> Result<String> {
    let mut text = String::new();

    for (i, part) in parts.iter().enumerate() {
        let Some(part) = part.as_object() else {
            if strict {
                return Err(ConductorError::remote(format!("parts[{}] is not a map", i)));
            }
            continue;
        };

        if part.get("kind").and_then(Value::as_str) != Some("text") {
            continue;
        }

        match part.get("text").and_then(Value::as_str) {
            Some(t) => text.push_str(t),
            None if strict => {
                return Err(ConductorError::remote(format!(
                    "text field in parts[{}] is missing or not a string",
                    i
                )))
            }
            None => {}
        }
    }

    if strict && text.is_empty() {
        return Err(ConductorError::remote(
            "no parts with kind 'text' and valid text field found",
        ));
    }
    Ok(text)
}
