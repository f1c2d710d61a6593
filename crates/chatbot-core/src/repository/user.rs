use chatbot_types::error::RepositoryError;
use chatbot_types::user::User;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Repository trait for user account persistence.
///
/// Implementations live in chatbot-infra (e.g., `SqliteUserRepository`).
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Returns `Conflict` if the username is taken.
    fn create_user(
        &self,
        user: &User,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Look up a user by exact username.
    fn get_by_username(
        &self,
        username: &str,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Look up a user by id.
    fn get_by_id(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Stamp the user's last successful login.
    fn update_last_login(
        &self,
        id: &Uuid,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete a user. Messages and sessions owned by the user cascade.
    fn delete_user(
        &self,
        id: &Uuid,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Total number of registered users.
    fn count_users(&self) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
