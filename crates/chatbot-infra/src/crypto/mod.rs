//! Cryptographic operations for the chatbot service.
//!
//! - `password`: Argon2id password hashing for user accounts
//! - `token`: random session tokens and their SHA-256 digests

pub mod password;
pub mod token;
