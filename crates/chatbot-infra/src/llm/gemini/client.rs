//! GeminiProvider -- concrete [`ChatProvider`] implementation for Google Gemini.
//!
//! Sends the whole conversation to `models/{model}:generateContent` on every
//! call; the conversation state itself lives in the chat service.
//!
//! The API key is wrapped in [`secrecy::SecretString`] and is only exposed
//! when building the request header.

use std::time::Duration;

use chatbot_core::llm::provider::ChatProvider;
use chatbot_types::llm::{ChatRequest, ChatResponse, LlmError, Usage};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};

use super::types::{
    GeminiContent, GeminiErrorEnvelope, GeminiGenerationConfig, GeminiPart,
    GenerateContentRequest, GenerateContentResponse,
};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini chat provider.
///
/// Deliberately not `Debug`.
pub struct GeminiProvider {
    client: reqwest::Client,
    api_key: SecretString,
    base_url: String,
}

impl GeminiProvider {
    pub fn new(api_key: SecretString, request_timeout: Duration) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| LlmError::Provider {
                message: format!("failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Override the base URL (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }
}

/// Convert a generic [`ChatRequest`] into the Gemini request body.
pub(crate) fn to_gemini_request(request: &ChatRequest) -> GenerateContentRequest {
    let contents = request
        .turns
        .iter()
        .map(|turn| GeminiContent {
            role: Some(turn.role.to_string()),
            parts: vec![GeminiPart {
                text: Some(turn.text.clone()),
            }],
        })
        .collect();

    let system_instruction = request.system_instruction.as_ref().map(|text| GeminiContent {
        role: None,
        parts: vec![GeminiPart {
            text: Some(text.clone()),
        }],
    });

    let generation = &request.generation;
    GenerateContentRequest {
        system_instruction,
        contents,
        generation_config: GeminiGenerationConfig {
            temperature: generation.temperature,
            top_p: generation.top_p,
            top_k: generation.top_k,
            max_output_tokens: generation.max_output_tokens,
            response_mime_type: generation.response_mime_type.clone(),
        },
    }
}

/// Pull the reply text out of a successful response body.
pub(crate) fn from_gemini_response(
    response: GenerateContentResponse,
    requested_model: &str,
) -> Result<ChatResponse, LlmError> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.clone())
    {
        return Err(LlmError::Blocked(reason));
    }

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(LlmError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(match candidate.finish_reason.as_deref() {
            Some(reason @ ("SAFETY" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "RECITATION")) => {
                LlmError::Blocked(reason.to_string())
            }
            _ => LlmError::EmptyResponse,
        });
    }

    let usage = response.usage_metadata.unwrap_or_default();
    Ok(ChatResponse {
        text,
        model: response
            .model_version
            .unwrap_or_else(|| requested_model.to_string()),
        finish_reason: candidate.finish_reason,
        usage: Usage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        },
    })
}

/// Map a non-success status and its body to an [`LlmError`].
pub(crate) fn error_for_status(
    status: StatusCode,
    body: &str,
    retry_after: Option<&str>,
) -> LlmError {
    let detail = serde_json::from_str::<GeminiErrorEnvelope>(body)
        .map(|e| e.error)
        .ok();
    let message = detail
        .as_ref()
        .map(|d| d.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.to_string());

    match status.as_u16() {
        401 | 403 => LlmError::AuthenticationFailed,
        400 if message.contains("API key") => LlmError::AuthenticationFailed,
        400 => LlmError::InvalidRequest(message),
        429 => LlmError::RateLimited {
            retry_after_ms: retry_after
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|secs| secs.saturating_mul(1000)),
        },
        _ => LlmError::Provider {
            message: format!("HTTP {status}: {message}"),
        },
    }
}

impl ChatProvider for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn send(&self, request: &ChatRequest) -> Result<ChatResponse, LlmError> {
        if request.turns.is_empty() {
            return Err(LlmError::InvalidRequest("no turns to send".to_string()));
        }

        let body = to_gemini_request(request);
        let url = self.url(&request.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let error_body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &error_body, retry_after.as_deref()));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        from_gemini_response(parsed, &request.model)
    }
}
