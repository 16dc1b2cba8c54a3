//! Language-model integration for the AI parsing tier.

mod client;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{
    truncate_utf8, LlmAppConfig, LlmClient, LlmConfig, LlmDeviceConfig, LlmProvider,
    DEFAULT_ATTENDANCE_PROMPT,
};

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Empty response")]
    Empty,

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("LLM is disabled")]
    Disabled,
}

/// A text-completion endpoint.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}
