//! SQLite user repository implementation.

use chatbot_core::repository::user::UserRepository;
use chatbot_types::error::RepositoryError;
use chatbot_types::user::User;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime};

/// SQLite-backed implementation of `UserRepository`.
pub struct SqliteUserRepository {
    pool: DatabasePool,
}

impl SqliteUserRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

struct UserRow {
    id: String,
    username: String,
    password_hash: String,
    is_active: bool,
    date_joined: String,
    last_login: Option<String>,
}

impl UserRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            password_hash: row.try_get("password_hash")?,
            is_active: row.try_get("is_active")?,
            date_joined: row.try_get("date_joined")?,
            last_login: row.try_get("last_login")?,
        })
    }

    fn into_user(self) -> Result<User, RepositoryError> {
        let id = Uuid::parse_str(&self.id)
            .map_err(|e| RepositoryError::Query(format!("invalid user id: {e}")))?;
        let date_joined = parse_datetime(&self.date_joined)?;
        let last_login = self.last_login.as_deref().map(parse_datetime).transpose()?;

        Ok(User {
            id,
            username: self.username,
            password_hash: self.password_hash,
            is_active: self.is_active,
            date_joined,
            last_login,
        })
    }
}

fn map_row(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<User>, RepositoryError> {
    match row {
        Some(row) => {
            let user_row =
                UserRow::from_row(&row).map_err(|e| RepositoryError::Query(e.to_string()))?;
            Ok(Some(user_row.into_user()?))
        }
        None => Ok(None),
    }
}

impl UserRepository for SqliteUserRepository {
    async fn create_user(&self, user: &User) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"INSERT INTO users (id, username, password_hash, is_active, date_joined, last_login)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(user.id.to_string())
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.is_active)
        .bind(format_datetime(&user.date_joined))
        .bind(user.last_login.as_ref().map(format_datetime))
        .execute(&self.pool.writer)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => Err(
                RepositoryError::Conflict(format!("username '{}' already exists", user.username)),
            ),
            Err(e) => Err(RepositoryError::Query(e.to_string())),
        }
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_row(row)
    }

    async fn get_by_id(&self, id: &Uuid) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        map_row(row)
    }

    async fn update_last_login(&self, id: &Uuid, at: DateTime<Utc>) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE users SET last_login = ? WHERE id = ?")
            .bind(format_datetime(&at))
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_user(&self, id: &Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn count_users(&self) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(count as u64)
    }
}

#[cfg(test)]
pub(crate) fn make_user(username: &str) -> User {
    User {
        id: Uuid::now_v7(),
        username: username.to_string(),
        password_hash: "$argon2id$placeholder".to_string(),
        is_active: true,
        date_joined: Utc::now(),
        last_login: None,
    }
}
