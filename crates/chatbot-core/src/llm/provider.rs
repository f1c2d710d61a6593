//! ChatProvider trait definition.
//!
//! The only capability the chat endpoint needs from a generative-AI backend:
//! send a conversation, receive the model's text reply. Any provider that can
//! satisfy this contract is substitutable.

use chatbot_types::llm::{ChatRequest, ChatResponse, LlmError};

/// Trait for chat-completion backends (Gemini, test doubles, ...).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in chatbot-infra (e.g., `GeminiProvider`).
pub trait ChatProvider: Send + Sync {
    /// Human-readable provider name (e.g., "gemini").
    fn name(&self) -> &str;

    /// Send the full conversation and receive the reply to its last turn.
    fn send(
        &self,
        request: &ChatRequest,
    ) -> impl std::future::Future<Output = Result<ChatResponse, LlmError>> + Send;
}
