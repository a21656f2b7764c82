/**
 * Push Subscription Database Operations
 *
 * Subscriptions use time-ordered ids and are unique per endpoint.
 */

use serde::Serialize;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::shared::ids::new_time_ordered_id;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: i64,
    pub endpoint: String,
    pub auth: String,
    pub p256dh: String,
}

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, endpoint, auth, p256dh";

/// Insert a subscription; a duplicate endpoint fails with a unique violation
pub async fn insert_subscription(
    db: impl PgExecutor<'_>,
    user_id: i64,
    endpoint: &str,
    auth: &str,
    p256dh: &str,
) -> Result<Subscription, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!(
        r#"
        INSERT INTO subscriptions (id, user_id, endpoint, auth, p256dh)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {SUBSCRIPTION_COLUMNS}
        "#
    ))
    .bind(new_time_ordered_id())
    .bind(user_id)
    .bind(endpoint)
    .bind(auth)
    .bind(p256dh)
    .fetch_one(db)
    .await
}

pub async fn get_by_endpoint(db: impl PgExecutor<'_>, endpoint: &str) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!(
        "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE endpoint = $1"
    ))
    .bind(endpoint)
    .fetch_optional(db)
    .await
}

pub async fn get_by_id(db: impl PgExecutor<'_>, id: Uuid) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(&format!("SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1"))
        .bind(id)
        .fetch_optional(db)
        .await
}

pub async fn delete_subscription(db: impl PgExecutor<'_>, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
