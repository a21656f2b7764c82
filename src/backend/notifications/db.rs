/**
 * Notification Database Operations
 */

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgExecutor;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub content: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const NOTIFICATION_COLUMNS: &str = "id, user_id, title, content, is_read, created_at, updated_at";

pub async fn insert_notification(
    db: impl PgExecutor<'_>,
    user_id: i64,
    title: &str,
    content: &str,
) -> Result<Notification, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "INSERT INTO notifications (user_id, title, content) VALUES ($1, $2, $3) RETURNING {NOTIFICATION_COLUMNS}"
    ))
    .bind(user_id)
    .bind(title)
    .bind(content)
    .fetch_one(db)
    .await
}

/// Newest first
pub async fn notifications_for_user(db: impl PgExecutor<'_>, user_id: i64) -> Result<Vec<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE user_id = $1 ORDER BY id DESC"
    ))
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn get_notification(
    db: impl PgExecutor<'_>,
    user_id: i64,
    id: i64,
) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}

pub async fn mark_read(db: impl PgExecutor<'_>, user_id: i64, id: i64) -> Result<Option<Notification>, sqlx::Error> {
    sqlx::query_as::<_, Notification>(&format!(
        r#"
        UPDATE notifications SET is_read = TRUE, updated_at = NOW()
        WHERE id = $1 AND user_id = $2
        RETURNING {NOTIFICATION_COLUMNS}
        "#
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
}
