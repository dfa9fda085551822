//! Definitions module - declarative agents and teams
//!
//! Specs are plain data loaded from TOML; the resolver turns them into
//! executable members.

pub mod resolver;
pub mod spec;
pub mod store;

pub use resolver::MemberResolver;
pub use spec::{AgentSpec, Definitions, GraphSpec, MemberRef, RemoteSpec, SelectorSpec, TeamSpec};
pub use store::{DefinitionStore, FileStore};
