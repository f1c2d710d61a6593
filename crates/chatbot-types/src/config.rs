//! Application configuration types.
//!
//! `AppConfig` represents `config.toml` in the data directory. Every field has
//! a default, so an empty or missing file yields a working configuration.

use serde::{Deserialize, Serialize};

use crate::llm::GenerationConfig;

/// Default system instruction given to the model.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are Conversational and image recognition chatbot, an AI assistant. \
Your role is to assist users by providing clear, accurate, and engaging responses. \
You can handle complex queries, generate creative ideas, and analyze multimodal data like text and images. \
Always respond professionally and adapt your style based on the user's needs.";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub chat: ChatConfig,
}

/// HTTP listener settings. CLI flags take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Which model to call and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,
    /// Override the provider base URL (proxies, tests).
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub generation: GenerationConfig,
}

fn default_model_name() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_system_instruction() -> String {
    DEFAULT_SYSTEM_INSTRUCTION.to_string()
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            system_instruction: default_system_instruction(),
            base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
            generation: GenerationConfig::default(),
        }
    }
}

/// Login session cookie settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Session lifetime in hours (default: two weeks).
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: i64,
    /// How often the server purges expired sessions and idle
    /// conversations, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl SessionConfig {
    /// Session lifetime as a std duration (negative TTLs count as zero).
    pub fn ttl(&self) -> std::time::Duration {
        let hours = u64::try_from(self.ttl_hours).unwrap_or(0);
        std::time::Duration::from_secs(hours.saturating_mul(3600))
    }
}

fn default_cookie_name() -> String {
    "sessionid".to_string()
}

fn default_ttl_hours() -> i64 {
    24 * 14
}

fn default_sweep_interval_secs() -> u64 {
    600
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_hours: default_ttl_hours(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

/// Conversation handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Write `Message` and `ChatMessage` rows for every successful exchange.
    #[serde(default)]
    pub persist_transcripts: bool,
    /// Turns kept per conversation before the oldest are dropped.
    #[serde(default = "default_max_history_turns")]
    pub max_history_turns: usize,
}

fn default_max_history_turns() -> usize {
    200
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            persist_transcripts: false,
            max_history_turns: default_max_history_turns(),
        }
    }
}
