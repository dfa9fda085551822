//! Tracing subscriber setup
//!
//! `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::EnvFilter;

use crate::core::config::LoggingConfig;
use crate::core::error::{ConductorError, Result};

/// Initialize the global tracing subscriber. Call once, from `main`.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| ConductorError::config(format!("Invalid log filter: {}", e)))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.compact().try_init()
    };

    result.map_err(|e| ConductorError::config(format!("Failed to initialize logging: {}", e)))
}
