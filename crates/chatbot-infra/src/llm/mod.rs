//! Chat provider implementations.
//!
//! Contains the Gemini implementation of the [`ChatProvider`] trait defined
//! in `chatbot-core`, plus [`create_provider`] which builds the boxed
//! provider the server runs with.
//!
//! [`ChatProvider`]: chatbot_core::llm::provider::ChatProvider

pub mod gemini;

use std::time::Duration;

use chatbot_core::llm::box_provider::BoxChatProvider;
use chatbot_types::config::ModelConfig;
use chatbot_types::llm::LlmError;
use secrecy::SecretString;

use self::gemini::GeminiProvider;

/// Create the configured provider from a [`ModelConfig`] and the API key.
pub fn create_provider(
    config: &ModelConfig,
    api_key: SecretString,
) -> Result<BoxChatProvider, LlmError> {
    let mut provider =
        GeminiProvider::new(api_key, Duration::from_secs(config.request_timeout_secs))?;
    if let Some(base_url) = config.base_url.as_deref() {
        provider = provider.with_base_url(base_url);
    }

    tracing::info!(
        provider = "gemini",
        model = %config.name,
        "chat provider configured"
    );
    Ok(BoxChatProvider::new(provider))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_provider_default_config() {
        let provider = create_provider(&ModelConfig::default(), SecretString::from("k")).unwrap();
        assert_eq!(provider.name(), "gemini");
    }

    #[test]
    fn test_create_provider_with_base_url() {
        let config = ModelConfig {
            base_url: Some("http://localhost:9999".to_string()),
            ..ModelConfig::default()
        };
        let provider = create_provider(&config, SecretString::from("k")).unwrap();
        assert_eq!(provider.name(), "gemini");
    }
}
