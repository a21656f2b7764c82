//! Database operations for friendships and friend requests
//!
//! Friendships are stored as two directed edges. Friend requests keep
//! their history; only one pending request per ordered pair can exist.

use sqlx::postgres::PgRow;
use sqlx::{PgExecutor, Row};

use crate::backend::auth::users::User;
use crate::shared::social::{FriendRequest, FriendRequestStatus};

const REQUEST_SELECT: &str = r#"
    SELECT fr.id, fr.sender_id, fr.receiver_id, u.username AS sender_username,
           fr.status, fr.sent_at, fr.responded_at
    FROM friend_requests fr
    JOIN users u ON u.id = fr.sender_id
"#;

fn friend_request_from_row(row: &PgRow) -> Result<FriendRequest, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let status = FriendRequestStatus::parse(&status).ok_or_else(|| sqlx::Error::ColumnDecode {
        index: "status".to_string(),
        source: format!("unknown friend request status '{}'", status).into(),
    })?;
    Ok(FriendRequest {
        id: row.try_get("id")?,
        sender_id: row.try_get("sender_id")?,
        receiver_id: row.try_get("receiver_id")?,
        sender_username: row.try_get("sender_username")?,
        status,
        sent_at: row.try_get("sent_at")?,
        responded_at: row.try_get("responded_at")?,
    })
}

/// Friends of `user_id`, ordered by username
pub async fn friends_of(db: impl PgExecutor<'_>, user_id: i64) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT u.id, u.username, u.email, u.password_hash, u.picture_url, u.phone_num,
               u.is_email_valid, u.is_online, u.last_seen, u.registered_at, u.updated_at
        FROM friendships f
        JOIN users u ON u.id = f.friend_id
        WHERE f.user_id = $1
        ORDER BY u.username
        "#,
    )
    .bind(user_id)
    .fetch_all(db)
    .await
}

pub async fn count_friends(db: impl PgExecutor<'_>, user_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM friendships WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(db)
        .await
}

pub async fn is_friend(db: impl PgExecutor<'_>, user_id: i64, friend_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM friendships WHERE user_id = $1 AND friend_id = $2)",
    )
    .bind(user_id)
    .bind(friend_id)
    .fetch_one(db)
    .await
}

/// Record the friendship in both directions
pub async fn insert_friendship(db: impl PgExecutor<'_>, a: i64, b: i64) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO friendships (user_id, friend_id)
        VALUES ($1, $2), ($2, $1)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(a)
    .bind(b)
    .execute(db)
    .await?;
    Ok(())
}

/// Remove both directed edges; returns the number of rows deleted
pub async fn remove_friendship(db: impl PgExecutor<'_>, a: i64, b: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        DELETE FROM friendships
        WHERE (user_id = $1 AND friend_id = $2) OR (user_id = $2 AND friend_id = $1)
        "#,
    )
    .bind(a)
    .bind(b)
    .execute(db)
    .await?;
    Ok(result.rows_affected())
}

pub async fn insert_friend_request(
    db: impl PgExecutor<'_>,
    sender_id: i64,
    receiver_id: i64,
) -> Result<FriendRequest, sqlx::Error> {
    let row = sqlx::query(
        r#"
        WITH inserted AS (
            INSERT INTO friend_requests (sender_id, receiver_id)
            VALUES ($1, $2)
            RETURNING id, sender_id, receiver_id, status, sent_at, responded_at
        )
        SELECT i.id, i.sender_id, i.receiver_id, u.username AS sender_username,
               i.status, i.sent_at, i.responded_at
        FROM inserted i
        JOIN users u ON u.id = i.sender_id
        "#,
    )
    .bind(sender_id)
    .bind(receiver_id)
    .fetch_one(db)
    .await?;
    friend_request_from_row(&row)
}

/// Whether a pending request exists in either direction
pub async fn pending_request_between(db: impl PgExecutor<'_>, a: i64, b: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS (
            SELECT 1 FROM friend_requests
            WHERE status = 'pending'
              AND ((sender_id = $1 AND receiver_id = $2) OR (sender_id = $2 AND receiver_id = $1))
        )
        "#,
    )
    .bind(a)
    .bind(b)
    .fetch_one(db)
    .await
}

/// Requests received by `user_id` with the given status, newest first
pub async fn received_requests(
    db: impl PgExecutor<'_>,
    user_id: i64,
    status: FriendRequestStatus,
) -> Result<Vec<FriendRequest>, sqlx::Error> {
    let rows = sqlx::query(&format!(
        "{REQUEST_SELECT} WHERE fr.receiver_id = $1 AND fr.status = $2 ORDER BY fr.sent_at DESC"
    ))
    .bind(user_id)
    .bind(status.as_str())
    .fetch_all(db)
    .await?;
    rows.iter().map(friend_request_from_row).collect()
}

pub async fn count_pending_received(db: impl PgExecutor<'_>, user_id: i64) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM friend_requests WHERE receiver_id = $1 AND status = 'pending'",
    )
    .bind(user_id)
    .fetch_one(db)
    .await
}

/// Load a request and lock its row until the transaction ends
pub async fn lock_request(db: impl PgExecutor<'_>, id: i64) -> Result<Option<FriendRequest>, sqlx::Error> {
    let row = sqlx::query(&format!("{REQUEST_SELECT} WHERE fr.id = $1 FOR UPDATE OF fr"))
        .bind(id)
        .fetch_optional(db)
        .await?;
    row.as_ref().map(friend_request_from_row).transpose()
}

pub async fn set_request_status(
    db: impl PgExecutor<'_>,
    id: i64,
    status: FriendRequestStatus,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE friend_requests SET status = $2, responded_at = NOW() WHERE id = $1")
        .bind(id)
        .bind(status.as_str())
        .execute(db)
        .await?;
    Ok(())
}
