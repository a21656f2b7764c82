//! Notification dispatch: persist, then publish to the user's topic.

use sqlx::PgPool;

use super::db::{self, Notification};
use crate::backend::broker::Publisher;
use crate::backend::error::{BackendError, BackendResult};
use crate::shared::Envelope;

/// Store a notification for `user_id` and push it to their live sockets
///
/// The row is committed before publishing. A publish failure is logged and
/// the stored notification is still returned.
pub async fn dispatch(
    pool: &PgPool,
    publisher: &Publisher,
    user_id: i64,
    title: &str,
    content: &str,
) -> BackendResult<Notification> {
    if content.trim().is_empty() {
        return Err(BackendError::invalid_input("content is required"));
    }

    let notification = db::insert_notification(pool, user_id, title, content).await?;

    let envelope = Envelope::notification(title, content)?;
    if let Err(e) = publisher.send_to_user(user_id, &envelope).await {
        tracing::warn!("[Notifications] Publish to user {} failed: {}", user_id, e);
    }
    Ok(notification)
}
