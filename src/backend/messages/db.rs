/**
 * Database Operations for Room Messages
 *
 * Messages are ordered by their serial id, which follows insertion order
 * within a room.
 */

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgExecutor;
use uuid::Uuid;

/// Messages per page of `GET /v1/rooms/{roomId}/messages`
pub const MESSAGE_PAGE_SIZE: i64 = 10;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub room_id: Uuid,
    pub sender_id: i64,
    pub sender_name: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

const MESSAGE_SELECT: &str = r#"
    SELECT m.id, m.room_id, m.sender_id, u.username AS sender_name, m.content, m.sent_at
    FROM messages m
    JOIN users u ON u.id = m.sender_id
"#;

/// Number of pages needed for `total` messages; an empty room has none
pub fn page_count(total: i64) -> i64 {
    (total + MESSAGE_PAGE_SIZE - 1) / MESSAGE_PAGE_SIZE
}

/// Save a message and return it with the sender's name
pub async fn save_message(
    db: impl PgExecutor<'_>,
    room_id: Uuid,
    sender_id: i64,
    content: &str,
) -> Result<Message, sqlx::Error> {
    sqlx::query_as::<_, Message>(
        r#"
        WITH inserted AS (
            INSERT INTO messages (room_id, sender_id, content)
            VALUES ($1, $2, $3)
            RETURNING id, room_id, sender_id, content, sent_at
        )
        SELECT i.id, i.room_id, i.sender_id, u.username AS sender_name, i.content, i.sent_at
        FROM inserted i
        JOIN users u ON u.id = i.sender_id
        "#,
    )
    .bind(room_id)
    .bind(sender_id)
    .bind(content)
    .fetch_one(db)
    .await
}

pub async fn get_message(db: impl PgExecutor<'_>, room_id: Uuid, id: i64) -> Result<Option<Message>, sqlx::Error> {
    sqlx::query_as::<_, Message>(&format!("{MESSAGE_SELECT} WHERE m.id = $1 AND m.room_id = $2"))
        .bind(id)
        .bind(room_id)
        .fetch_optional(db)
        .await
}

/// One page of a room's messages; pages start at 1
pub async fn room_messages(
    db: impl PgExecutor<'_>,
    room_id: Uuid,
    page: i64,
    ascending: bool,
) -> Result<Vec<Message>, sqlx::Error> {
    let order = if ascending { "ASC" } else { "DESC" };
    let offset = (page.max(1) - 1) * MESSAGE_PAGE_SIZE;
    sqlx::query_as::<_, Message>(&format!(
        "{MESSAGE_SELECT} WHERE m.room_id = $1 ORDER BY m.id {order} LIMIT $2 OFFSET $3"
    ))
    .bind(room_id)
    .bind(MESSAGE_PAGE_SIZE)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count_room_messages(db: impl PgExecutor<'_>, room_id: Uuid) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM messages WHERE room_id = $1")
        .bind(room_id)
        .fetch_one(db)
        .await
}
