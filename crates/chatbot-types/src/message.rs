//! Persisted chat records.
//!
//! Two independent, append-only record types:
//! - [`Message`]: one user-submitted message and (optionally) the reply it got.
//! - [`ChatMessage`]: a single line in a conversation, tagged with a free-text
//!   session identifier and the side that produced it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

/// Maximum length of a [`ChatMessage::session_id`].
///
/// Maps to the CHECK constraint `length(session_id) <= 100` in the schema.
pub const SESSION_ID_MAX_LEN: usize = 100;

/// Number of characters of the message shown by `ChatMessage`'s `Display`.
const DISPLAY_PREVIEW_CHARS: usize = 50;

/// A user-submitted message and its reply, owned by a user account.
///
/// Rows are cascade-deleted with their owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub response: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Build a new record stamped with the current time.
    pub fn new(user_id: Uuid, content: impl Into<String>, response: Option<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            content: content.into(),
            response,
            created_at: Utc::now(),
        }
    }
}

/// Which side of a conversation produced a [`ChatMessage`].
///
/// Maps to the CHECK constraint `sender IN ('user', 'bot')`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sender::User => write!(f, "user"),
            Sender::Bot => write!(f, "bot"),
        }
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Sender::User),
            "bot" => Ok(Sender::Bot),
            other => Err(format!("invalid sender: '{other}'")),
        }
    }
}

/// One line of a conversation grouped by a free-text session identifier.
///
/// There is no ownership relation beyond `session_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub session_id: String,
    pub sender: Sender,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl ChatMessage {
    /// Build a new chat line stamped with the current time.
    pub fn new(session_id: impl Into<String>, sender: Sender, message: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            session_id: session_id.into(),
            sender,
            message: message.into(),
            created_at: Utc::now(),
        }
    }
}

impl fmt::Display for ChatMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.message.chars().take(DISPLAY_PREVIEW_CHARS).collect();
        write!(f, "{}: {}", self.sender, preview)
    }
}
