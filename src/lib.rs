//! Conductor - Declarative Teams of AI Agents
//!
//! A control plane that resolves agents and teams from declarative
//! definitions and runs queries against them. Agents talk to a local model
//! through Ollama or to remote A2A endpoints; teams coordinate members with a
//! sequential, round-robin, selector or graph strategy.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, execution context and errors
//! - **LLM**: LLM provider abstraction with Ollama implementation
//! - **Agent**: Members, message preparation and the query orchestrator
//! - **Team**: Team execution strategies
//! - **Definitions**: Declarative specs and their resolution into members
//! - **Telemetry**: Response capture, lifecycle events and token counts
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use conductor::{Config, ExecutionContext, Message, Orchestrator};
//!
//! #[tokio::main]
//! async fn main() -> conductor::Result<()> {
//!     let orchestrator = Orchestrator::with_config(&Config::load())?;
//!
//!     let input = [Message::user("Write a haiku about Rust")];
//!     let report = orchestrator
//!         .run_team(ExecutionContext::new(), "writers", &input, &[])
//!         .await?;
//!     println!("{}", report.final_content().unwrap_or_default());
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod definitions;
pub mod llm;
pub mod team;
pub mod telemetry;

// Re-export commonly used items
pub use agent::{Agent, Execution, MemberType, Orchestrator, RunReport, TeamMember};
pub use core::{ConductorError, Config, ExecutionContext, Message, Result, Role, TokenUsage};
pub use definitions::{FileStore, MemberResolver};
pub use team::{Edge, Strategy, Team};
