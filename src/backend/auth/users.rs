/**
 * User Model and Database Operations
 *
 * Single-statement queries take any `PgExecutor`, so they run equally on the
 * pool or inside a caller's transaction.
 */

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgExecutor;

/// User struct representing a user in the database
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// User email address (unique)
    pub email: String,
    /// Hashed password (bcrypt), never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub picture_url: Option<String>,
    pub phone_num: Option<String>,
    /// Set once the email OTP has been confirmed
    pub is_email_valid: bool,
    pub is_online: bool,
    pub last_seen: DateTime<Utc>,
    pub registered_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const USER_COLUMNS: &str = "id, username, email, password_hash, picture_url, phone_num, \
     is_email_valid, is_online, last_seen, registered_at, updated_at";

/// Create a new user
pub async fn create_user(
    db: impl PgExecutor<'_>,
    username: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        INSERT INTO users (username, email, password_hash)
        VALUES ($1, $2, $3)
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(username)
    .bind(email)
    .bind(password_hash)
    .fetch_one(db)
    .await
}

/// Get user by ID
pub async fn get_user_by_id(db: impl PgExecutor<'_>, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

/// Get user by username
pub async fn get_user_by_username(db: impl PgExecutor<'_>, username: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
        .bind(username)
        .fetch_optional(db)
        .await
}

/// Get user by email
pub async fn get_user_by_email(db: impl PgExecutor<'_>, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
        .bind(email)
        .fetch_optional(db)
        .await
}

/// Of `ids`, the ones that belong to existing users
pub async fn existing_user_ids(db: impl PgExecutor<'_>, ids: &[i64]) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE id = ANY($1) ORDER BY id")
        .bind(ids)
        .fetch_all(db)
        .await
}

pub async fn update_username(db: impl PgExecutor<'_>, id: i64, username: &str) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users SET username = $1, updated_at = NOW()
        WHERE id = $2
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(username)
    .bind(id)
    .fetch_one(db)
    .await
}

/// Set the online flag; going offline also stamps `last_seen`
pub async fn set_online(db: impl PgExecutor<'_>, id: i64, online: bool) -> Result<User, sqlx::Error> {
    sqlx::query_as::<_, User>(&format!(
        r#"
        UPDATE users
        SET is_online = $1,
            last_seen = CASE WHEN $1 THEN last_seen ELSE NOW() END,
            updated_at = NOW()
        WHERE id = $2
        RETURNING {USER_COLUMNS}
        "#
    ))
    .bind(online)
    .bind(id)
    .fetch_one(db)
    .await
}

pub async fn mark_email_verified(db: impl PgExecutor<'_>, email: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET is_email_valid = TRUE, updated_at = NOW() WHERE email = $1")
        .bind(email)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn update_password(db: impl PgExecutor<'_>, email: &str, password_hash: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE email = $2")
        .bind(password_hash)
        .bind(email)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_user(db: impl PgExecutor<'_>, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn user_exists(db: impl PgExecutor<'_>, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
        .bind(id)
        .fetch_one(db)
        .await
}
