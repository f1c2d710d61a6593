//! SQLite repository for the append-only `messages` and `chat_messages` tables.
//!
//! Only inserts and reads are issued here; the schema additionally rejects
//! updates with triggers.

use chatbot_core::repository::message::MessageRepository;
use chatbot_types::error::RepositoryError;
use chatbot_types::message::{ChatMessage, Message, Sender};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `MessageRepository`.
pub struct SqliteMessageRepository {
    pool: DatabasePool,
}

impl SqliteMessageRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

const INSERT_MESSAGE: &str = r#"INSERT INTO messages (id, user_id, content, response, created_at)
   VALUES (?, ?, ?, ?, ?)"#;

const INSERT_CHAT_MESSAGE: &str = r#"INSERT INTO chat_messages (id, session_id, sender, message, created_at)
   VALUES (?, ?, ?, ?, ?)"#;

struct MessageRow {
    id: String,
    user_id: String,
    content: String,
    response: Option<String>,
    created_at: String,
}

impl MessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            content: row.try_get("content")?,
            response: row.try_get("response")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_message(self) -> Result<Message, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid message id: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;

        Ok(Message {
            id,
            user_id,
            content: self.content,
            response: self.response,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

struct ChatMessageRow {
    id: String,
    session_id: String,
    sender: String,
    message: String,
    created_at: String,
}

impl ChatMessageRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            session_id: row.try_get("session_id")?,
            sender: row.try_get("sender")?,
            message: row.try_get("message")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_chat_message(self) -> Result<ChatMessage, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid chat message id: {e}")))?;
        let sender: Sender = self
            .sender
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(ChatMessage {
            id,
            session_id: self.session_id,
            sender,
            message: self.message,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

impl MessageRepository for SqliteMessageRepository {
    async fn save_message(&self, message: &Message) -> Result<(), RepositoryError> {
        sqlx::query(INSERT_MESSAGE)
            .bind(message.id.to_string())
            .bind(message.user_id.to_string())
            .bind(&message.content)
            .bind(&message.response)
            .bind(format_datetime(&message.created_at))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_messages(
        &self,
        user_id: &Uuid,
        limit: Option<u32>,
    ) -> Result<Vec<Message>, RepositoryError> {
        let rows = match limit {
            Some(limit) => {
                sqlx::query(
                    "SELECT * FROM messages WHERE user_id = ? ORDER BY created_at DESC, id DESC LIMIT ?",
                )
                .bind(user_id.to_string())
                .bind(i64::from(limit))
                .fetch_all(&self.pool.reader)
                .await
            }
            None => {
                sqlx::query(
                    "SELECT * FROM messages WHERE user_id = ? ORDER BY created_at DESC, id DESC",
                )
                .bind(user_id.to_string())
                .fetch_all(&self.pool.reader)
                .await
            }
        }
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut messages = Vec::with_capacity(rows.len());
        for row in &rows {
            let message_row =
                MessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            messages.push(message_row.into_message()?);
        }
        Ok(messages)
    }

    async fn save_chat_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
        sqlx::query(INSERT_CHAT_MESSAGE)
            .bind(message.id.to_string())
            .bind(&message.session_id)
            .bind(message.sender.to_string())
            .bind(&message.message)
            .bind(format_datetime(&message.created_at))
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn save_exchange(
        &self,
        message: &Message,
        lines: &[ChatMessage],
    ) -> Result<(), RepositoryError> {
        let mut tx = self
            .pool
            .writer
            .begin()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        sqlx::query(INSERT_MESSAGE)
            .bind(message.id.to_string())
            .bind(message.user_id.to_string())
            .bind(&message.content)
            .bind(&message.response)
            .bind(format_datetime(&message.created_at))
            .execute(&mut *tx)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        for line in lines {
            sqlx::query(INSERT_CHAT_MESSAGE)
                .bind(line.id.to_string())
                .bind(&line.session_id)
                .bind(line.sender.to_string())
                .bind(&line.message)
                .bind(format_datetime(&line.created_at))
                .execute(&mut *tx)
                .await
                .map_err(|e| RepositoryError::Query(e.to_string()))?;
        }

        // Dropping `tx` on an early return rolls everything back.
        tx.commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn list_chat_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM chat_messages WHERE session_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(session_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut lines = Vec::with_capacity(rows.len());
        for row in &rows {
            let line_row =
                ChatMessageRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            lines.push(line_row.into_chat_message()?);
        }
        Ok(lines)
    }
}
