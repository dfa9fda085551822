//! Team member abstraction
//!
//! Anything a team can execute: a single agent, a nested team or a remote
//! agent. The engine only sees this trait.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{ConductorError, ExecutionContext, Message, Result};

/// Kind of team member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberType {
    Agent,
    Team,
}

impl MemberType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MemberType::Agent => "agent",
            MemberType::Team => "team",
        }
    }
}

impl fmt::Display for MemberType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberType {
    type Err = ConductorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "agent" => Ok(MemberType::Agent),
            "team" => Ok(MemberType::Team),
            other => Err(ConductorError::UnsupportedMemberType {
                kind: other.to_string(),
                member: String::new(),
                team: String::new(),
            }),
        }
    }
}

/// Outcome of one member execution.
///
/// Messages produced before a failure travel with the error, so callers can
/// keep partial output.
#[derive(Debug, Default)]
pub struct Execution {
    pub messages: Vec<Message>,
    pub error: Option<ConductorError>,
}

impl Execution {
    pub fn completed(messages: Vec<Message>) -> Self {
        Self {
            messages,
            error: None,
        }
    }

    pub fn failed(messages: Vec<Message>, error: ConductorError) -> Self {
        Self {
            messages,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Drop partial output on failure
    pub fn into_result(self) -> Result<Vec<Message>> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.messages),
        }
    }
}

impl From<Result<Vec<Message>>> for Execution {
    fn from(result: Result<Vec<Message>>) -> Self {
        match result {
            Ok(messages) => Self::completed(messages),
            Err(err) => Self::failed(Vec::new(), err),
        }
    }
}

/// A unit of execution within a team
#[async_trait]
pub trait TeamMember: Send + Sync {
    fn name(&self) -> &str;

    fn member_type(&self) -> MemberType;

    fn description(&self) -> &str;

    /// Execute against the current input, seeing `history` as prior context.
    /// Returns only the messages this member produced.
    async fn execute(
        &self,
        ctx: &ExecutionContext,
        input: &Message,
        history: &[Message],
    ) -> Execution;

    /// System prompt to seed session memory with, when the member hydrates one
    fn memory_system_prompt(&self) -> Option<&str> {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_member_type_parse() {
        assert_eq!("agent".parse::<MemberType>().unwrap(), MemberType::Agent);
        assert_eq!("team".parse::<MemberType>().unwrap(), MemberType::Team);

        let err = "tool".parse::<MemberType>().unwrap_err();
        assert!(matches!(err, ConductorError::UnsupportedMemberType { kind, .. } if kind == "tool"));
    }

    #[test]
    fn test_failed_execution_keeps_messages() {
        let exec = Execution::failed(vec![Message::assistant("half")], ConductorError::llm("x"));
        assert!(!exec.is_ok());
        assert_eq!(exec.messages.len(), 1);
        assert!(exec.into_result().is_err());
    }
}
