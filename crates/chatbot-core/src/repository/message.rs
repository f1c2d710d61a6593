//! MessageRepository trait definition.
//!
//! Both record types are append-only: the trait offers inserts and reads,
//! never updates or deletes. Owner deletion cascades at the storage level.

use chatbot_types::error::RepositoryError;
use chatbot_types::message::{ChatMessage, Message};
use uuid::Uuid;

/// Repository trait for `Message` and `ChatMessage` records.
pub trait MessageRepository: Send + Sync {
    /// Append a message/response pair owned by a user.
    fn save_message(
        &self,
        message: &Message,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List a user's messages, newest first.
    fn list_messages(
        &self,
        user_id: &Uuid,
        limit: Option<u32>,
    ) -> impl std::future::Future<Output = Result<Vec<Message>, RepositoryError>> + Send;

    /// Append a single chat line.
    fn save_chat_message(
        &self,
        message: &ChatMessage,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Append a message/response pair and its chat lines atomically: either
    /// every row is written or none is.
    fn save_exchange(
        &self,
        message: &Message,
        lines: &[ChatMessage],
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List the lines of one conversation, oldest first.
    fn list_chat_messages(
        &self,
        session_id: &str,
    ) -> impl std::future::Future<Output = Result<Vec<ChatMessage>, RepositoryError>> + Send;
}
