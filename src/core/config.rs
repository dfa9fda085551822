//! Configuration management for Conductor
//!
//! Supports environment variables, config files, and runtime overrides.
//! Models are interchangeable via settings.
//!
//! Config file location: ~/.config/conductor/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::core::error::{ConductorError, Result};

/// Selector prompt used when a team does not carry its own
pub const DEFAULT_SELECTOR_PROMPT: &str = "You are coordinating a team conversation.

The following participants are available:
{{roles}}

Conversation so far:
{{history}}

Read the conversation above, then choose which participant from [{{participants}}] should act next.
Avoid picking the same participant repeatedly unless the conversation clearly requires it.
Respond with the participant name only.";

/// Main configuration for Conductor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Ollama configuration
    #[serde(default)]
    pub ollama: OllamaConfig,
    /// Model configuration
    #[serde(default)]
    pub models: ModelConfig,
    /// Team engine configuration
    #[serde(default)]
    pub engine: EngineConfig,
    /// Remote agent configuration
    #[serde(default)]
    pub remote: RemoteConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ollama server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Host address (default: localhost)
    pub host: String,
    /// Port number (default: 11434)
    pub port: u16,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Model configuration - interchangeable models
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Model used by agents that do not name one
    pub default: String,
    /// Model used by selector teams that do not name one
    pub selector: String,
}

/// Team engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Path to the TOML definitions file
    pub definitions: Option<PathBuf>,
    /// Selector template used when a team has none
    pub selector_prompt: String,
}

/// Remote agent configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    /// Timeout for one remote agent call in seconds
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive, overridden by RUST_LOG
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

fn env_flag(key: &str) -> Option<bool> {
    env::var(key).ok().map(|v| v == "true" || v == "1")
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: env::var("OLLAMA_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: env::var("OLLAMA_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(11434),
            timeout_secs: 120,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        let default = env::var("CONDUCTOR_MODEL").unwrap_or_else(|_| "qwen3:8b".to_string());
        Self {
            selector: env::var("CONDUCTOR_SELECTOR_MODEL").unwrap_or_else(|_| default.clone()),
            default,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            definitions: env::var("CONDUCTOR_DEFINITIONS").ok().map(PathBuf::from),
            selector_prompt: DEFAULT_SELECTOR_PROMPT.to_string(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self { timeout_secs: 300 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: env::var("CONDUCTOR_LOG").unwrap_or_else(|_| "info".to_string()),
            json: env_flag("CONDUCTOR_LOG_JSON").unwrap_or(false),
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("conductor")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();

        let mut config = Self::load_from_file().unwrap_or_default();
        config.apply_env();
        config
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(ConductorError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| ConductorError::config(format!("Failed to read config: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text; missing sections take defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| ConductorError::config(format!("Failed to parse config: {}", e)))
    }

    /// Environment variables win over the config file
    fn apply_env(&mut self) {
        if let Ok(host) = env::var("OLLAMA_HOST") {
            self.ollama.host = host;
        }
        if let Some(port) = env::var("OLLAMA_PORT").ok().and_then(|p| p.parse().ok()) {
            self.ollama.port = port;
        }
        if let Ok(model) = env::var("CONDUCTOR_MODEL") {
            self.models.default = model;
        }
        if let Ok(model) = env::var("CONDUCTOR_SELECTOR_MODEL") {
            self.models.selector = model;
        }
        if let Ok(path) = env::var("CONDUCTOR_DEFINITIONS") {
            self.engine.definitions = Some(PathBuf::from(path));
        }
        if let Ok(level) = env::var("CONDUCTOR_LOG") {
            self.logging.level = level;
        }
        if let Some(json) = env_flag("CONDUCTOR_LOG_JSON") {
            self.logging.json = json;
        }
    }

    /// Get the full Ollama API URL
    pub fn ollama_url(&self) -> String {
        format!("http://{}:{}", self.ollama.host, self.ollama.port)
    }

    /// Generate a default config file content for display
    pub fn default_config_toml() -> String {
        toml::to_string_pretty(&Config::default())
            .unwrap_or_else(|_| String::from("# Error generating config"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.remote.timeout_secs, 300);
        assert!(config.engine.selector_prompt.contains("{{participants}}"));
        assert!(!config.models.selector.is_empty());
    }

    #[test]
    fn test_partial_toml_takes_defaults() {
        let config = Config::from_toml(
            r#"
[models]
default = "llama3.2"
selector = "qwen3:4b"

[logging]
level = "debug"
json = true
"#,
        )
        .unwrap();
        assert_eq!(config.models.default, "llama3.2");
        assert_eq!(config.models.selector, "qwen3:4b");
        assert!(config.logging.json);
        assert_eq!(config.remote.timeout_secs, 300);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = Config::from_toml("[models\n").unwrap_err();
        assert!(matches!(err, ConductorError::Config(_)));
    }

    #[test]
    fn test_config_dir() {
        let dir = Config::config_dir();
        assert!(dir.to_string_lossy().contains("conductor"));
    }
}
