//! LLM module - Language Model integrations
//!
//! Provides the provider abstraction with Ollama as the backend.

pub mod ollama;
pub mod traits;

pub use ollama::OllamaClient;
pub use traits::{GenerateOptions, LLMProvider, LLMResponse};
