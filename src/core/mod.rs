//! Core module - shared infrastructure for Conductor
//!
//! This module contains foundational types, configuration, the execution
//! context and error handling used throughout the application.

pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod types;

pub use config::Config;
pub use context::ExecutionContext;
pub use error::{ConductorError, Result};
pub use types::*;
