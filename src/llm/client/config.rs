//! Language-model client configuration.
//!
//! Split into two tiers:
//! - `LlmAppConfig`: from the config file (prompt, generation params, timeout)
//! - `LlmDeviceConfig`: from env vars, device-specific (provider, endpoint, model, api_key)
//!
//! Env vars: ROLLCALL_LLM_PROVIDER, ROLLCALL_LLM_MODEL, ROLLCALL_LLM_ENDPOINT,
//! ROLLCALL_LLM_API_KEY (OLLAMA_HOST, GROQ_API_KEY, OPENAI_API_KEY are also honored)

use serde::{Deserialize, Serialize};

use super::prompts::DEFAULT_ATTENDANCE_PROMPT;

/// LLM provider type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Ollama API (local, default)
    #[default]
    Ollama,
    /// OpenAI-compatible API (OpenAI, Groq, Together.ai, etc.)
    OpenAI,
}

impl LlmProvider {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "ollama" => Some(Self::Ollama),
            "openai" | "groq" | "together" => Some(Self::OpenAI),
            _ => None,
        }
    }
}

/// Application-level settings: what the model is asked and how long we wait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmAppConfig {
    /// Whether the AI tier is enabled
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Maximum tokens in response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Temperature for generation (0.0 - 1.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Upper bound on a single completion round trip
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum characters of OCR text sent to the model
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Custom attendance prompt (uses {roster}, {aliases} and {content} placeholders)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendance_prompt: Option<String>,
}

/// Device-level settings: how to reach the model.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmDeviceConfig {
    pub provider: LlmProvider,
    /// API endpoint (provider-specific defaults apply)
    pub endpoint: String,
    pub model: String,
    /// API key for OpenAI-compatible providers
    pub api_key: Option<String>,
}

/// Combined LLM configuration. Only the app half is (de)serialized.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(flatten)]
    pub app: LlmAppConfig,
    #[serde(skip)]
    pub device: LlmDeviceConfig,
}

fn default_enabled() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "llama3.2:3b".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.1
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_content_chars() -> usize {
    12000
}

impl Default for LlmAppConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
            max_content_chars: default_max_content_chars(),
            attendance_prompt: None,
        }
    }
}

impl LlmAppConfig {
    /// Get the attendance prompt, using custom or default.
    pub fn get_attendance_prompt(&self) -> &str {
        self.attendance_prompt
            .as_deref()
            .unwrap_or(DEFAULT_ATTENDANCE_PROMPT)
    }
}

impl Default for LlmDeviceConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl LlmDeviceConfig {
    /// Create device config from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self {
            provider: LlmProvider::default(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
        };

        let explicit_provider = std::env::var("ROLLCALL_LLM_PROVIDER").ok();
        if let Some(provider) = explicit_provider.as_deref().and_then(LlmProvider::from_str) {
            config.provider = provider;
        }

        // Explicit endpoint always wins, then OLLAMA_HOST for Ollama
        let explicit_endpoint = std::env::var("ROLLCALL_LLM_ENDPOINT").ok();
        if let Some(ref endpoint) = explicit_endpoint {
            config.endpoint = endpoint.clone();
        } else if let Ok(ollama_host) = std::env::var("OLLAMA_HOST") {
            config.endpoint = ollama_host;
        }

        if let Ok(key) = std::env::var("ROLLCALL_LLM_API_KEY") {
            config.api_key = Some(key);
        }

        let explicit_model = std::env::var("ROLLCALL_LLM_MODEL").ok();

        match explicit_provider.as_deref().map(str::to_lowercase).as_deref() {
            Some(provider) => {
                if explicit_endpoint.is_none() {
                    match provider {
                        "groq" => config.endpoint = "https://api.groq.com/openai".to_string(),
                        "openai" => config.endpoint = "https://api.openai.com".to_string(),
                        "together" => config.endpoint = "https://api.together.xyz".to_string(),
                        _ => {}
                    }
                }
                if config.api_key.is_none() {
                    match provider {
                        "groq" => config.api_key = std::env::var("GROQ_API_KEY").ok(),
                        "openai" => config.api_key = std::env::var("OPENAI_API_KEY").ok(),
                        _ => {}
                    }
                }
                if explicit_model.is_none() {
                    match provider {
                        "groq" => config.model = "llama-3.3-70b-versatile".to_string(),
                        "openai" => config.model = "gpt-4o-mini".to_string(),
                        _ => {}
                    }
                }
            }
            None if config.api_key.is_none() => {
                // Auto-detect a hosted provider from well-known keys
                if let Ok(key) = std::env::var("GROQ_API_KEY") {
                    config.api_key = Some(key);
                    config.provider = LlmProvider::OpenAI;
                    if explicit_endpoint.is_none() {
                        config.endpoint = "https://api.groq.com/openai".to_string();
                    }
                    config.model = "llama-3.3-70b-versatile".to_string();
                } else if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                    config.api_key = Some(key);
                    config.provider = LlmProvider::OpenAI;
                    if explicit_endpoint.is_none() {
                        config.endpoint = "https://api.openai.com".to_string();
                    }
                    config.model = "gpt-4o-mini".to_string();
                }
            }
            None => {}
        }

        if let Some(model) = explicit_model {
            config.model = model;
        }

        config
    }

    /// Get the provider name for display.
    pub fn provider_name(&self) -> &'static str {
        match self.provider {
            LlmProvider::Ollama => "Ollama",
            LlmProvider::OpenAI => {
                if self.endpoint.contains("groq.com") {
                    "Groq"
                } else if self.endpoint.contains("together.xyz") {
                    "Together.ai"
                } else {
                    "OpenAI"
                }
            }
        }
    }
}

impl LlmConfig {
    pub fn new(app: LlmAppConfig, device: LlmDeviceConfig) -> Self {
        Self { app, device }
    }

    pub fn enabled(&self) -> bool {
        self.app.enabled
    }

    pub fn provider(&self) -> &LlmProvider {
        &self.device.provider
    }

    pub fn endpoint(&self) -> &str {
        &self.device.endpoint
    }

    pub fn model(&self) -> &str {
        &self.device.model
    }

    pub fn api_key(&self) -> Option<&str> {
        self.device.api_key.as_deref()
    }

    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.app.timeout_secs)
    }

    pub fn provider_name(&self) -> &'static str {
        self.device.provider_name()
    }

    pub fn set_endpoint(&mut self, endpoint: String) {
        self.device.endpoint = endpoint;
    }

    pub fn set_model(&mut self, model: String) {
        self.device.model = model;
    }
}
