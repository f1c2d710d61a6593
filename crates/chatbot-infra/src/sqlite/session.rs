//! SQLite login-session repository implementation.

use chatbot_core::repository::session::SessionRepository;
use chatbot_types::error::RepositoryError;
use chatbot_types::user::AuthSession;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `SessionRepository`.
pub struct SqliteSessionRepository {
    pool: DatabasePool,
}

impl SqliteSessionRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct AuthSessionRow {
    id: String,
    user_id: String,
    token_hash: String,
    created_at: String,
    expires_at: String,
}

impl AuthSessionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            token_hash: row.try_get("token_hash")?,
            created_at: row.try_get("created_at")?,
            expires_at: row.try_get("expires_at")?,
        })
    }

    fn into_session(self) -> Result<AuthSession, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid session id: {e}")))?;
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| RepositoryError::Query(format!("invalid user_id: {e}")))?;

        Ok(AuthSession {
            id,
            user_id,
            token_hash: self.token_hash,
            created_at: parse_datetime(&self.created_at)?,
            expires_at: parse_datetime(&self.expires_at)?,
        })
    }
}

impl SessionRepository for SqliteSessionRepository {
    async fn create_session(&self, session: &AuthSession) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT INTO auth_sessions (id, user_id, token_hash, created_at, expires_at)
               VALUES (?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.user_id.to_string())
        .bind(&session.token_hash)
        .bind(format_datetime(&session.created_at))
        .bind(format_datetime(&session.expires_at))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(())
    }

    async fn get_by_token_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<AuthSession>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM auth_sessions WHERE token_hash = ?")
            .bind(token_hash)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        match row {
            Some(row) => {
                let session_row = AuthSessionRow::from_row(&row)
                    .map_err(|e| RepositoryError::Query(e.to_string()))?;
                Ok(Some(session_row.into_session()?))
            }
            None => Ok(None),
        }
    }

    async fn delete_session(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_expired(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<AuthSession>, RepositoryError> {
        let rows = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= ? RETURNING *")
            .bind(format_datetime(&now))
            .fetch_all(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let mut sessions = Vec::with_capacity(rows.len());
        for row in &rows {
            let session_row =
                AuthSessionRow::from_row(row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            sessions.push(session_row.into_session()?);
        }
        Ok(sessions)
    }
}
