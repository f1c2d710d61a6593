//! Infrastructure layer for the chatbot service.
//!
//! Contains implementations of the traits defined in `chatbot-core`:
//! SQLite storage, Argon2 password hashing and session token digests, the
//! Gemini HTTP client, and config/data-directory loading.

pub mod config;
pub mod crypto;
pub mod llm;
pub mod sqlite;
