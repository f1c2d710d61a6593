//! Per-session conversation history.
//!
//! Each login session owns its own conversation, keyed by an explicit
//! session identifier. Different sessions proceed concurrently; turns within
//! one session are serialised by that session's async lock so a reply is
//! always recorded against the history it was generated from.

use std::sync::Arc;
use std::time::Duration;

use chatbot_types::llm::Turn;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::time::Instant;

/// Ordered turns of a single conversation.
#[derive(Debug)]
pub struct Conversation {
    turns: Vec<Turn>,
    last_used: Instant,
}

impl Default for Conversation {
    fn default() -> Self {
        Self {
            turns: Vec::new(),
            last_used: Instant::now(),
        }
    }
}

impl Conversation {
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a completed user/model exchange, then drop the oldest turns
    /// (in pairs) until at most `max_turns` remain.
    pub fn record_exchange(&mut self, user: Turn, model: Turn, max_turns: usize) {
        self.turns.push(user);
        self.turns.push(model);

        if self.turns.len() > max_turns {
            let excess = self.turns.len() - max_turns;
            let drop = (excess + excess % 2).min(self.turns.len());
            self.turns.drain(..drop);
        }
    }
}

/// Concurrent map from session key to conversation.
pub struct ConversationStore {
    conversations: DashMap<String, Arc<Mutex<Conversation>>>,
    max_turns: usize,
}

impl ConversationStore {
    pub fn new(max_turns: usize) -> Self {
        Self {
            conversations: DashMap::new(),
            max_turns,
        }
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Lock the conversation for `key`, creating it on first use.
    ///
    /// The guard is owned, so it can be held across the provider call
    /// without borrowing the store.
    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<Conversation> {
        // Clone the Arc out so no map shard lock is held across the await.
        let slot = self
            .conversations
            .entry(key.to_string())
            .or_default()
            .value()
            .clone();
        let mut conversation = slot.lock_owned().await;
        conversation.last_used = Instant::now();
        conversation
    }

    /// Discard a conversation. Returns whether one existed.
    pub fn end(&self, key: &str) -> bool {
        self.conversations.remove(key).is_some()
    }

    /// Discard conversations nobody has acquired for at least `max_idle`.
    ///
    /// Conversations locked right now are in use and always kept. Returns
    /// how many were discarded.
    pub fn evict_idle(&self, max_idle: Duration) -> usize {
        let mut evicted = 0;
        self.conversations.retain(|_, slot| {
            let keep = match slot.try_lock() {
                Ok(conversation) => conversation.last_used.elapsed() < max_idle,
                Err(_) => true,
            };
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    /// Number of live conversations.
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}
