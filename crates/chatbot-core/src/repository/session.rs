use chatbot_types::error::RepositoryError;
use chatbot_types::user::AuthSession;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Repository trait for server-side login sessions.
pub trait SessionRepository: Send + Sync {
    fn create_session(
        &self,
        session: &AuthSession,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Find a session by the SHA-256 digest of its cookie token.
    fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> impl std::future::Future<Output = Result<Option<AuthSession>, RepositoryError>> + Send;

    fn delete_session(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Remove every session that expired at or before `now`, returning the
    /// removed sessions.
    fn delete_expired(
        &self,
        now: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<Vec<AuthSession>, RepositoryError>> + Send;
}
