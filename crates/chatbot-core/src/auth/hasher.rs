//! Hashing ports used by the auth service.
//!
//! Defined here so the service can hash without coupling to a specific
//! algorithm. The Argon2 and SHA-256 adapters live in chatbot-infra.

use chatbot_types::error::AuthError;

/// One-way password hashing with embedded salt and parameters.
pub trait PasswordHasher: Send + Sync {
    /// Produce a self-describing hash string for storage.
    fn hash_password(&self, password: &str) -> Result<String, AuthError>;

    /// Check a candidate password against a stored hash.
    ///
    /// Malformed hashes verify as `false`.
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}

/// Generates opaque session tokens and the digests stored in their place.
pub trait TokenGenerator: Send + Sync {
    /// A fresh high-entropy token for the session cookie.
    fn generate_token(&self) -> String;

    /// Deterministic digest of a token (lowercase hex).
    fn digest(&self, token: &str) -> String;
}
