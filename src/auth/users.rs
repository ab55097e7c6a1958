use chrono::{DateTime, Utc};
use rocket_db_pools::sqlx::{self, FromRow, PgPool};
use uuid::Uuid;

use crate::auth::{AuthError, AuthResult};

/// Postgres unique_violation.
const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug, Clone, FromRow)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Insert a user, mapping a duplicate email to [`AuthError::UserExists`].
pub async fn insert_user(
    pool: &PgPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> AuthResult<Uuid> {
    let result = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(normalize_email(email))
    .bind(password_hash)
    .fetch_one(pool)
    .await;

    match result {
        Ok(id) => Ok(id),
        Err(sqlx::Error::Database(db_err))
            if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
        {
            Err(AuthError::UserExists)
        }
        Err(err) => Err(err.into()),
    }
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> AuthResult<Option<UserRecord>> {
    let user = sqlx::query_as::<_, UserRecord>(
        "SELECT id, username, email, password_hash, created_at FROM users WHERE lower(email) = $1",
    )
    .bind(normalize_email(email))
    .fetch_optional(pool)
    .await?;

    Ok(user)
}
