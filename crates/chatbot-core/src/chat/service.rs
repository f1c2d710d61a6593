//! Chat service: forwards user text to the provider within the caller's
//! conversation and turns provider failures into a fixed apology.
//!
//! ChatService coordinates the ConversationStore, the BoxChatProvider and
//! (optionally) the MessageRepository for transcript persistence.

use chatbot_observe::genai_attrs::{
    GEN_AI_RESPONSE_FINISH_REASONS, GEN_AI_RESPONSE_MODEL, GEN_AI_USAGE_INPUT_TOKENS,
    GEN_AI_USAGE_OUTPUT_TOKENS, OP_CHAT,
};
use chatbot_types::config::{ChatConfig, ModelConfig};
use chatbot_types::error::ChatError;
use chatbot_types::llm::{ChatRequest, GenerationConfig, Turn};
use chatbot_types::message::{ChatMessage, Message, Sender};
use tracing::{Instrument, error, field, info_span};
use uuid::Uuid;

use crate::chat::conversation::ConversationStore;
use crate::llm::box_provider::BoxChatProvider;
use crate::repository::message::MessageRepository;

/// Reply returned to the client when the provider call fails.
pub const APOLOGY_REPLY: &str = "Sorry, I encountered an issue processing your request.";

/// Text handed back to the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
    /// True when `text` is the apology rather than a model reply.
    pub fallback: bool,
}

/// Everything about the model call that does not change per request.
#[derive(Debug, Clone)]
pub struct ChatSettings {
    pub model: String,
    pub system_instruction: Option<String>,
    pub generation: GenerationConfig,
    pub persist_transcripts: bool,
}

impl ChatSettings {
    pub fn from_config(model: &ModelConfig, chat: &ChatConfig) -> Self {
        let system_instruction = Some(model.system_instruction.trim().to_string())
            .filter(|s| !s.is_empty());
        Self {
            model: model.name.clone(),
            system_instruction,
            generation: model.generation.clone(),
            persist_transcripts: chat.persist_transcripts,
        }
    }
}

/// Orchestrates one chat exchange per call.
///
/// Generic over `MessageRepository` (chatbot-core never depends on chatbot-infra).
pub struct ChatService<M: MessageRepository> {
    provider: BoxChatProvider,
    conversations: ConversationStore,
    messages: M,
    settings: ChatSettings,
}

impl<M: MessageRepository> ChatService<M> {
    pub fn new(
        provider: BoxChatProvider,
        messages: M,
        settings: ChatSettings,
        max_history_turns: usize,
    ) -> Self {
        Self {
            provider,
            conversations: ConversationStore::new(max_history_turns),
            messages,
            settings,
        }
    }

    pub fn conversations(&self) -> &ConversationStore {
        &self.conversations
    }

    pub fn message_repo(&self) -> &M {
        &self.messages
    }

    pub fn settings(&self) -> &ChatSettings {
        &self.settings
    }

    /// Send `text` within the conversation identified by `session_key`.
    ///
    /// Provider failures never surface as errors: they are logged and the
    /// apology is returned with `fallback = true`, leaving the history as it
    /// was. Only an empty message or a persistence failure is an `Err`.
    pub async fn send_message(
        &self,
        user_id: &Uuid,
        session_key: &str,
        text: &str,
    ) -> Result<ChatReply, ChatError> {
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let mut conversation = self.conversations.acquire(session_key).await;

        let mut turns = conversation.turns().to_vec();
        turns.push(Turn::user(text));
        let request = ChatRequest {
            model: self.settings.model.clone(),
            system_instruction: self.settings.system_instruction.clone(),
            turns,
            generation: self.settings.generation.clone(),
        };

        let span = info_span!(
            "gen_ai.chat",
            gen_ai.operation.name = OP_CHAT,
            gen_ai.system = self.provider.name(),
            gen_ai.request.model = %request.model,
            gen_ai.request.max_tokens = request.generation.max_output_tokens,
            gen_ai.request.temperature = request.generation.temperature,
            gen_ai.usage.input_tokens = field::Empty,
            gen_ai.usage.output_tokens = field::Empty,
            gen_ai.response.finish_reasons = field::Empty,
            gen_ai.response.model = field::Empty,
            history_turns = conversation.len(),
        );

        let response = match self.provider.send(&request).instrument(span.clone()).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    parent: &span,
                    provider = self.provider.name(),
                    session = session_key,
                    "Error getting chat response: {e}"
                );
                return Ok(ChatReply {
                    text: APOLOGY_REPLY.to_string(),
                    fallback: true,
                });
            }
        };

        span.record(GEN_AI_USAGE_INPUT_TOKENS, response.usage.input_tokens);
        span.record(GEN_AI_USAGE_OUTPUT_TOKENS, response.usage.output_tokens);
        span.record(GEN_AI_RESPONSE_MODEL, response.model.as_str());
        if let Some(reason) = &response.finish_reason {
            span.record(GEN_AI_RESPONSE_FINISH_REASONS, reason.as_str());
        }

        if self.settings.persist_transcripts {
            self.persist_exchange(user_id, session_key, text, &response.text)
                .await?;
        }

        conversation.record_exchange(
            Turn::user(text),
            Turn::model(response.text.clone()),
            self.conversations.max_turns(),
        );

        Ok(ChatReply {
            text: response.text,
            fallback: false,
        })
    }

    /// Forget the conversation for a session (on logout).
    pub fn end_conversation(&self, session_key: &str) -> bool {
        self.conversations.end(session_key)
    }

    /// A user's message/response pairs, newest first.
    pub async fn list_messages(
        &self,
        user_id: &Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, ChatError> {
        Ok(self.messages.list_messages(user_id, limit).await?)
    }

    /// The recorded lines of one conversation, oldest first.
    pub async fn transcript(&self, session_key: &str) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.messages.list_chat_messages(session_key).await?)
    }

    async fn persist_exchange(
        &self,
        user_id: &Uuid,
        session_key: &str,
        text: &str,
        reply: &str,
    ) -> Result<(), ChatError> {
        let message = Message::new(*user_id, text, Some(reply.to_string()));
        let lines = [
            ChatMessage::new(session_key, Sender::User, text),
            ChatMessage::new(session_key, Sender::Bot, reply),
        ];
        self.messages.save_exchange(&message, &lines).await?;
        Ok(())
    }
}
