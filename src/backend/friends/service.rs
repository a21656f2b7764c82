//! Friend request state machine on top of the database.

use chrono::Utc;
use sqlx::PgPool;

use super::db;
use crate::backend::auth::users::user_exists;
use crate::backend::error::{is_unique_violation, BackendError, BackendResult};
use crate::shared::social::{FriendRequest, FriendRequestAction};

/// Send a request from `sender_id` to `receiver_id`
pub async fn send_request(pool: &PgPool, sender_id: i64, receiver_id: i64) -> BackendResult<FriendRequest> {
    if sender_id == receiver_id {
        return Err(BackendError::invalid_input("Cannot send a friend request to yourself"));
    }
    if !user_exists(pool, receiver_id).await? {
        return Err(BackendError::not_found("User not found"));
    }
    if db::is_friend(pool, sender_id, receiver_id).await? {
        return Err(BackendError::conflict("Already friends"));
    }
    if db::pending_request_between(pool, sender_id, receiver_id).await? {
        return Err(BackendError::conflict("A pending friend request already exists"));
    }

    let request = db::insert_friend_request(pool, sender_id, receiver_id)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BackendError::conflict("A pending friend request already exists")
            } else {
                e.into()
            }
        })?;
    tracing::info!("[Friends] Request {} sent from {} to {}", request.id, sender_id, receiver_id);
    Ok(request)
}

/// Answer a pending request as its receiver
///
/// Accepting writes both friendship edges in the same transaction as the
/// status change.
pub async fn respond_to_request(
    pool: &PgPool,
    caller_id: i64,
    request_id: i64,
    action: FriendRequestAction,
) -> BackendResult<FriendRequest> {
    let mut tx = pool.begin().await?;
    let mut request = db::lock_request(&mut *tx, request_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Friend request not found"))?;

    if request.receiver_id != caller_id {
        return Err(BackendError::forbidden("Only the receiver can answer this request"));
    }
    let status = request
        .status
        .respond(action)
        .map_err(|e| BackendError::conflict(e.to_string()))?;

    db::set_request_status(&mut *tx, request_id, status).await?;
    if action == FriendRequestAction::Accept {
        db::insert_friendship(&mut *tx, request.sender_id, request.receiver_id).await?;
    }
    tx.commit().await?;

    request.status = status;
    request.responded_at = Some(Utc::now());
    tracing::info!("[Friends] Request {} {}", request_id, status.as_str());
    Ok(request)
}
