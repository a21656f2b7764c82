/**
 * Room Database Operations
 *
 * Rooms, their attendees (`room_users`) and invitations. Functions that
 * must run inside a service transaction take any `PgExecutor`.
 */

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::backend::auth::users::User;
use crate::shared::ids::new_time_ordered_id;

/// Rooms per page of `GET /v1/rooms`
pub const ROOM_PAGE_SIZE: i64 = 6;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub date: DateTime<Utc>,
    pub time: String,
    pub venue: String,
    pub host_id: i64,
    pub attendees_count: i32,
    pub is_closed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RoomInvite {
    pub id: i64,
    pub room_id: Uuid,
    pub user_id: i64,
    pub inviter_id: i64,
    pub status: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// A pending invite with what the invitee needs to decide
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PendingInvite {
    pub id: i64,
    pub room_id: Uuid,
    pub room_name: String,
    pub room_date: DateTime<Utc>,
    pub venue: String,
    pub inviter_id: i64,
    pub inviter_username: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied by the host
#[derive(Debug, Clone)]
pub struct NewRoom {
    pub name: String,
    pub date: DateTime<Utc>,
    pub time: String,
    pub venue: String,
}

const ROOM_COLUMNS: &str =
    "id, name, date, time, venue, host_id, attendees_count, is_closed, created_at, updated_at";

const INVITE_COLUMNS: &str = "id, room_id, user_id, inviter_id, status, message, created_at";

/// Insert a room with a fresh time-ordered id
pub async fn insert_room(db: impl PgExecutor<'_>, host_id: i64, room: &NewRoom) -> Result<Room, sqlx::Error> {
    sqlx::query_as::<_, Room>(&format!(
        r#"
        INSERT INTO rooms (id, name, date, time, venue, host_id, attendees_count)
        VALUES ($1, $2, $3, $4, $5, $6, 1)
        RETURNING {ROOM_COLUMNS}
        "#
    ))
    .bind(new_time_ordered_id())
    .bind(&room.name)
    .bind(room.date)
    .bind(&room.time)
    .bind(&room.venue)
    .bind(host_id)
    .fetch_one(db)
    .await
}

pub async fn get_room(db: impl PgExecutor<'_>, room_id: Uuid) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1"))
        .bind(room_id)
        .fetch_optional(db)
        .await
}

/// Same as `get_room` but locks the row until the transaction ends
pub async fn lock_room(db: impl PgExecutor<'_>, room_id: Uuid) -> Result<Option<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(&format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = $1 FOR UPDATE"))
        .bind(room_id)
        .fetch_optional(db)
        .await
}

pub async fn room_exists(db: impl PgExecutor<'_>, room_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM rooms WHERE id = $1)")
        .bind(room_id)
        .fetch_one(db)
        .await
}

pub async fn attendee_ids(db: impl PgExecutor<'_>, room_id: Uuid) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT user_id FROM room_users WHERE room_id = $1 ORDER BY user_id")
        .bind(room_id)
        .fetch_all(db)
        .await
}

pub async fn attendees(db: impl PgExecutor<'_>, room_id: Uuid) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.email, u.password_hash, u.picture_url, u.phone_num,
               u.is_email_valid, u.is_online, u.last_seen, u.registered_at, u.updated_at
        FROM users u
        JOIN room_users ru ON ru.user_id = u.id
        WHERE ru.room_id = $1
        ORDER BY ru.joined_at, u.id
        "#,
    )
    .bind(room_id)
    .fetch_all(db)
    .await
}

pub async fn is_attendee(db: impl PgExecutor<'_>, room_id: Uuid, user_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM room_users WHERE room_id = $1 AND user_id = $2)",
    )
    .bind(room_id)
    .bind(user_id)
    .fetch_one(db)
    .await
}

/// Record a membership row; the counter is maintained separately
pub async fn add_attendee(db: impl PgExecutor<'_>, room_id: Uuid, user_id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT INTO room_users (room_id, user_id) VALUES ($1, $2)")
        .bind(room_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(())
}

pub async fn remove_attendee(db: impl PgExecutor<'_>, room_id: Uuid, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM room_users WHERE room_id = $1 AND user_id = $2")
        .bind(room_id)
        .bind(user_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Add `delta` to `attendees_count`
pub async fn adjust_attendees_count(db: impl PgExecutor<'_>, room_id: Uuid, delta: i32) -> Result<Room, sqlx::Error> {
    sqlx::query_as::<_, Room>(&format!(
        r#"
        UPDATE rooms SET attendees_count = attendees_count + $1, updated_at = NOW()
        WHERE id = $2
        RETURNING {ROOM_COLUMNS}
        "#
    ))
    .bind(delta)
    .bind(room_id)
    .fetch_one(db)
    .await
}

pub async fn set_closed(db: impl PgExecutor<'_>, room_id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE rooms SET is_closed = TRUE, updated_at = NOW() WHERE id = $1")
        .bind(room_id)
        .execute(db)
        .await?;
    Ok(())
}

/// Rooms the user attends, newest first; `page` starts at 1
pub async fn user_rooms(db: impl PgExecutor<'_>, user_id: i64, page: i64) -> Result<Vec<Room>, sqlx::Error> {
    let offset = (page.max(1) - 1) * ROOM_PAGE_SIZE;
    sqlx::query_as::<_, Room>(
        r#"
        SELECT r.id, r.name, r.date, r.time, r.venue, r.host_id, r.attendees_count,
               r.is_closed, r.created_at, r.updated_at
        FROM rooms r
        JOIN room_users ru ON ru.room_id = r.id
        WHERE ru.user_id = $1
        ORDER BY r.created_at DESC, r.id DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(ROOM_PAGE_SIZE)
    .bind(offset)
    .fetch_all(db)
    .await
}

pub async fn count_user_rooms(db: impl PgExecutor<'_>, user_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM room_users WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await
}

pub async fn insert_invites(
    db: impl PgExecutor<'_>,
    room_id: Uuid,
    inviter_id: i64,
    invitees: &[i64],
    message: &str,
) -> Result<Vec<RoomInvite>, sqlx::Error> {
    if invitees.is_empty() {
        return Ok(Vec::new());
    }
    sqlx::query_as::<_, RoomInvite>(&format!(
        r#"
        INSERT INTO room_invites (room_id, user_id, inviter_id, status, message)
        SELECT $1, invitee, $2, 'pending', $3 FROM UNNEST($4::BIGINT[]) AS invitee
        RETURNING {INVITE_COLUMNS}
        "#
    ))
    .bind(room_id)
    .bind(inviter_id)
    .bind(message)
    .bind(invitees)
    .fetch_all(db)
    .await
}

pub async fn has_pending_invite(db: impl PgExecutor<'_>, room_id: Uuid, user_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM room_invites
            WHERE room_id = $1 AND user_id = $2 AND status = 'pending'
        )
        "#,
    )
    .bind(room_id)
    .bind(user_id)
    .fetch_one(db)
    .await
}

/// Answer the user's pending invite; `false` when there was none
pub async fn answer_invite(
    db: impl PgExecutor<'_>,
    room_id: Uuid,
    user_id: i64,
    status: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE room_invites SET status = $1 WHERE room_id = $2 AND user_id = $3 AND status = 'pending'",
    )
    .bind(status)
    .bind(room_id)
    .bind(user_id)
    .execute(db)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_pending_invites(db: impl PgExecutor<'_>, room_id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM room_invites WHERE room_id = $1 AND status = 'pending'")
        .bind(room_id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

pub async fn pending_invites(db: impl PgExecutor<'_>, user_id: i64) -> Result<Vec<PendingInvite>, sqlx::Error> {
    sqlx::query_as::<_, PendingInvite>(
        r#"
        SELECT i.id, i.room_id, r.name AS room_name, r.date AS room_date, r.venue,
               i.inviter_id, u.username AS inviter_username, i.message, i.created_at
        FROM room_invites i
        JOIN rooms r ON r.id = i.room_id
        JOIN users u ON u.id = i.inviter_id
        WHERE i.user_id = $1 AND i.status = 'pending'
        ORDER BY i.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn count_pending_invites(db: impl PgExecutor<'_>, user_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM room_invites WHERE user_id = $1 AND status = 'pending'",
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}
