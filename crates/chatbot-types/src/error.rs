use thiserror::Error;

use crate::user::SignupErrors;

/// Errors from repository operations (used by trait definitions in chatbot-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database connection error")]
    Connection,

    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),
}

/// Errors related to signup, login and session resolution.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("account is inactive")]
    Inactive,

    #[error("invalid signup form: {0}")]
    Validation(SignupErrors),

    #[error("password hashing failed")]
    Hashing,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors from the chat service.
///
/// Provider failures are not represented here: they are converted into an
/// apology reply before reaching the caller.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("no message provided")]
    EmptyMessage,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
