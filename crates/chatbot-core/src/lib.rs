//! Business logic and repository trait definitions for the chatbot service.
//!
//! This crate defines the "ports" (repository, provider and hashing traits)
//! that the infrastructure layer implements, plus the auth and chat services
//! built on top of them. It depends on `chatbot-types` (and the span
//! attribute names in `chatbot-observe`) -- never on
//! `chatbot-infra` or any database/IO crate.

pub mod auth;
pub mod chat;
pub mod llm;
pub mod repository;
