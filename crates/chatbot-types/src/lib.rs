//! Shared domain types for the chatbot service.
//!
//! Users and auth sessions, the two persisted chat records, LLM request and
//! reply shapes, configuration, and the error enums shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod error;
pub mod llm;
pub mod message;
pub mod user;
