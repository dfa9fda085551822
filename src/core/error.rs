//! Custom error types for Conductor
//!
//! Provides a unified error handling system across all modules. The
//! termination sentinel lives here too: it travels as an error so that any
//! member can stop its team, but the engine never reports it as a failure.

use thiserror::Error;

/// Main error type for Conductor operations
#[derive(Error, Debug)]
pub enum ConductorError {
    /// A member asked its team to stop. Not a failure.
    #[error("team terminated: {reason}")]
    Terminated { reason: String },

    /// Round-robin, selector or graph ran out of turns
    #[error("team {team} reached MaxTurns ({max_turns}) using {strategy} strategy")]
    MaxTurns {
        team: String,
        strategy: String,
        max_turns: usize,
    },

    /// A member failed while executing inside a team
    #[error("member {member} of team {team} failed on turn {turn} ({strategy}): {source}")]
    Member {
        team: String,
        member: String,
        strategy: String,
        turn: usize,
        #[source]
        source: Box<ConductorError>,
    },

    /// The selector could not pick the next participant
    #[error("selector of team {team} failed on turn {turn} ({strategy}): {source}")]
    Selector {
        team: String,
        strategy: String,
        turn: usize,
        #[source]
        source: Box<ConductorError>,
    },

    /// The caller cancelled the run
    #[error("execution cancelled")]
    Cancelled,

    /// Team definition without members
    #[error("team {0} has no members configured")]
    EmptyTeam(String),

    /// Strategy name outside the four known ones
    #[error("unsupported strategy {strategy} for team {team}")]
    UnsupportedStrategy { strategy: String, team: String },

    /// Member type outside agent/team
    #[error("unsupported member type {kind} for member {member} in team {team}")]
    UnsupportedMemberType {
        kind: String,
        member: String,
        team: String,
    },

    /// Agent reference that the definition store cannot resolve
    #[error("failed to get agent {name} for team {team}")]
    AgentNotFound { name: String, team: String },

    /// Team reference that the definition store cannot resolve
    #[error("failed to get team {name} for team {team}")]
    TeamNotFound { name: String, team: String },

    /// Graph edge naming something that is not a member
    #[error("graph edge references {member}, which is not a member of team {team}")]
    UnknownGraphMember { member: String, team: String },

    /// Team that contains itself through nesting
    #[error("team {0} contains itself")]
    TeamCycle(String),

    /// Input sequence with nothing to execute
    #[error("input messages are empty")]
    EmptyInput,

    /// Model provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Model not available
    #[error("Model '{0}' not available in Ollama. Run: ollama pull {0}")]
    ModelNotFound(String),

    /// Remote agent protocol errors
    #[error("remote agent error: {0}")]
    Remote(String),

    /// Selector template errors
    #[error("template error: {0}")]
    Template(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Conductor operations
pub type Result<T> = std::result::Result<T, ConductorError>;

impl ConductorError {
    /// Create the termination sentinel
    pub fn terminated(reason: impl Into<String>) -> Self {
        Self::Terminated {
            reason: reason.into(),
        }
    }

    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Create a remote agent error
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this is the termination sentinel.
    ///
    /// Only the outermost variant counts: a sentinel wrapped as a member
    /// failure is no longer a request to stop.
    pub fn is_termination(&self) -> bool {
        matches!(self, Self::Terminated { .. })
    }

    /// Whether this error comes from cancellation, directly or through a
    /// member or selector wrapper
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled => true,
            Self::Member { source, .. } | Self::Selector { source, .. } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Whether this error was raised while building a team, before any execution
    pub fn is_construction(&self) -> bool {
        matches!(
            self,
            Self::EmptyTeam(_)
                | Self::UnsupportedStrategy { .. }
                | Self::UnsupportedMemberType { .. }
                | Self::AgentNotFound { .. }
                | Self::TeamNotFound { .. }
                | Self::UnknownGraphMember { .. }
                | Self::TeamCycle(_)
        )
    }
}
