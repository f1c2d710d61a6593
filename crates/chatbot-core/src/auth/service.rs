//! Auth service: signup, login, session resolution and logout.
//!
//! Generic over the user/session repositories and the hashing ports so the
//! core never depends on chatbot-infra.

use std::sync::Arc;

use chatbot_types::error::{AuthError, RepositoryError};
use chatbot_types::user::{AuthSession, SignupErrors, SignupForm, User};
use chrono::{Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::hasher::{PasswordHasher, TokenGenerator};
use super::validation::{MSG_USERNAME_TAKEN, validate_signup};
use crate::repository::session::SessionRepository;
use crate::repository::user::UserRepository;

/// A successful login: the user, the stored session, and the plaintext
/// token that goes into the cookie (never stored).
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub session: AuthSession,
    pub token: String,
}

/// What a cookie token resolved to.
#[derive(Debug, Clone)]
pub enum SessionLookup {
    /// A live session of an active user.
    Active { user: User, session: AuthSession },
    /// The session had expired and has just been deleted.
    Expired(AuthSession),
    /// Unknown token, or the owner is missing or inactive.
    Invalid,
}

/// Orchestrates account creation and cookie-backed login sessions.
pub struct AuthService<U, S, H, T>
where
    U: UserRepository,
    S: SessionRepository,
    H: PasswordHasher,
    T: TokenGenerator,
{
    users: U,
    sessions: S,
    hasher: Arc<H>,
    tokens: T,
    session_ttl: Duration,
}

impl<U, S, H, T> AuthService<U, S, H, T>
where
    U: UserRepository,
    S: SessionRepository,
    H: PasswordHasher + 'static,
    T: TokenGenerator,
{
    pub fn new(users: U, sessions: S, hasher: H, tokens: T, session_ttl: Duration) -> Self {
        Self {
            users,
            sessions,
            hasher: Arc::new(hasher),
            tokens,
            session_ttl,
        }
    }

    /// Hash on the blocking pool; Argon2 is too slow for a runtime worker.
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        tokio::task::spawn_blocking(move || hasher.hash_password(&password))
            .await
            .map_err(|e| {
                warn!(error = %e, "password hashing task failed");
                AuthError::Hashing
            })?
    }

    async fn verify_password(&self, password: &str, hash: &str) -> bool {
        let hasher = Arc::clone(&self.hasher);
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify_password(&password, &hash))
            .await
            .unwrap_or(false)
    }

    /// Access the user repository.
    pub fn users(&self) -> &U {
        &self.users
    }

    /// Validate the signup form and create exactly one user.
    ///
    /// Any validation problem (including a taken username) returns
    /// `AuthError::Validation` and creates nothing.
    pub async fn signup(&self, form: &SignupForm) -> Result<User, AuthError> {
        let mut errors = validate_signup(form);
        let username = form.username.trim();

        if errors.field("username").is_empty()
            && self.users.get_by_username(username).await?.is_some()
        {
            errors.add("username", MSG_USERNAME_TAKEN);
        }
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors));
        }

        let user = User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            password_hash: self.hash_password(&form.password1).await?,
            is_active: true,
            date_joined: Utc::now(),
            last_login: None,
        };

        match self.users.create_user(&user).await {
            Ok(()) => {}
            // Lost a race with a concurrent signup for the same name.
            Err(RepositoryError::Conflict(_)) => {
                let mut errors = SignupErrors::new();
                errors.add("username", MSG_USERNAME_TAKEN);
                return Err(AuthError::Validation(errors));
            }
            Err(e) => return Err(e.into()),
        }

        info!(user_id = %user.id, username = %user.username, "user created");
        Ok(user)
    }

    /// Check credentials and open a new session.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let Some(user) = self.users.get_by_username(username.trim()).await? else {
            // Spend comparable time on unknown usernames.
            let _ = self.hash_password(password).await;
            debug!(username, "login for unknown username");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(password, &user.password_hash).await {
            debug!(user_id = %user.id, "login with wrong password");
            return Err(AuthError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(AuthError::Inactive);
        }

        let now = Utc::now();
        let token = self.tokens.generate_token();
        let session = AuthSession {
            id: Uuid::now_v7(),
            user_id: user.id,
            token_hash: self.tokens.digest(&token),
            created_at: now,
            expires_at: now + self.session_ttl,
        };
        self.sessions.create_session(&session).await?;
        self.users.update_last_login(&user.id, now).await?;

        info!(user_id = %user.id, session_id = %session.id, "user logged in");
        Ok(LoginOutcome {
            user: User {
                last_login: Some(now),
                ..user
            },
            session,
            token,
        })
    }

    /// Resolve a cookie token to its live session and active user.
    ///
    /// Expired sessions are deleted on sight and handed back as
    /// [`SessionLookup::Expired`] so per-session state can be released too.
    pub async fn resolve(&self, token: &str) -> Result<SessionLookup, AuthError> {
        let digest = self.tokens.digest(token);
        let Some(session) = self.sessions.get_by_token_hash(&digest).await? else {
            return Ok(SessionLookup::Invalid);
        };

        if session.is_expired(Utc::now()) {
            debug!(session_id = %session.id, "session expired");
            match self.sessions.delete_session(&session.id).await {
                Ok(()) | Err(RepositoryError::NotFound) => {}
                Err(e) => {
                    warn!(session_id = %session.id, "failed to delete expired session: {e}");
                }
            }
            return Ok(SessionLookup::Expired(session));
        }

        match self.users.get_by_id(&session.user_id).await? {
            Some(user) if user.is_active => Ok(SessionLookup::Active { user, session }),
            _ => Ok(SessionLookup::Invalid),
        }
    }

    /// Tear down the session behind a cookie token.
    ///
    /// Returns the removed session, or `None` if the token matched nothing.
    pub async fn logout(&self, token: &str) -> Result<Option<AuthSession>, AuthError> {
        let digest = self.tokens.digest(token);
        let Some(session) = self.sessions.get_by_token_hash(&digest).await? else {
            return Ok(None);
        };

        match self.sessions.delete_session(&session.id).await {
            Ok(()) | Err(RepositoryError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }
        info!(session_id = %session.id, user_id = %session.user_id, "user logged out");
        Ok(Some(session))
    }

    /// Remove expired sessions, returning the ones deleted.
    pub async fn purge_expired_sessions(&self) -> Result<Vec<AuthSession>, AuthError> {
        let purged = self.sessions.delete_expired(Utc::now()).await?;
        if !purged.is_empty() {
            info!(count = purged.len(), "purged expired sessions");
        }
        Ok(purged)
    }

    /// Create a user from the command line, through the same validation as signup.
    pub async fn create_user(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let form = SignupForm {
            username: username.to_string(),
            password1: password.to_string(),
            password2: password.to_string(),
        };
        self.signup(&form).await
    }

    /// Delete a user by username. Their messages and sessions cascade.
    pub async fn delete_user(&self, username: &str) -> Result<User, AuthError> {
        let user = self
            .users
            .get_by_username(username)
            .await?
            .ok_or(AuthError::Repository(RepositoryError::NotFound))?;
        self.users.delete_user(&user.id).await?;
        info!(user_id = %user.id, username = %user.username, "user deleted");
        Ok(user)
    }
}
