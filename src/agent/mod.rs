//! Agent module - members and query orchestration
//!
//! Contains the member abstraction, the model-backed and remote agents,
//! message preparation and the orchestrator that runs a query.

pub mod member;
pub mod messages;
pub mod orchestrator;
pub mod remote;
pub mod single;
pub mod tools;

pub use member::{Execution, MemberType, TeamMember};
pub use orchestrator::{Orchestrator, RunReport};
pub use remote::{A2aClient, RemoteAgent, RemoteClient};
pub use single::{Agent, AgentBuilder};
