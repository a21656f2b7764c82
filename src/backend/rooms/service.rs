//! Room use cases that span several statements.
//!
//! Every function here runs in one transaction. The room row is locked
//! (`FOR UPDATE`) before any check that a concurrent request could
//! invalidate, such as the host check or the closed flag.

use std::collections::BTreeSet;

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::db::{self, NewRoom, Room, RoomInvite};
use crate::backend::auth::users::{existing_user_ids, User};
use crate::backend::bills::db::all_bills_consolidated;
use crate::backend::error::{BackendError, BackendResult};

async fn locked_room(conn: &mut PgConnection, room_id: Uuid) -> BackendResult<Room> {
    db::lock_room(conn, room_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Room not found"))
}

/// Distinct invitees, all of which must exist
async fn resolve_invitees(conn: &mut PgConnection, invitees: &[i64]) -> BackendResult<Vec<i64>> {
    let wanted: Vec<i64> = invitees.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
    let found = existing_user_ids(conn, &wanted).await?;
    if found.len() != wanted.len() {
        return Err(BackendError::not_found("One or more invitees not found"));
    }
    Ok(wanted)
}

/// Check that none of `invitees` is attending or already invited
async fn validate_invitees(conn: &mut PgConnection, room_id: Uuid, invitees: &[i64]) -> BackendResult<()> {
    for &user_id in invitees {
        if db::is_attendee(&mut *conn, room_id, user_id).await? {
            return Err(BackendError::conflict("User is already in room"));
        }
        if db::has_pending_invite(&mut *conn, room_id, user_id).await? {
            return Err(BackendError::conflict("User already has pending invite"));
        }
    }
    Ok(())
}

/// Create a room hosted by `host_id` and invite `invitees`
pub async fn create_room_with_invites(
    pool: &PgPool,
    host_id: i64,
    room: &NewRoom,
    invitees: &[i64],
    message: &str,
) -> BackendResult<(Room, Vec<RoomInvite>)> {
    let mut tx = pool.begin().await?;

    let invitees: Vec<i64> = resolve_invitees(&mut tx, invitees)
        .await?
        .into_iter()
        .filter(|&id| id != host_id)
        .collect();

    let room = db::insert_room(&mut *tx, host_id, room).await?;
    db::add_attendee(&mut *tx, room.id, host_id).await?;
    let invites = db::insert_invites(&mut *tx, room.id, host_id, &invitees, message).await?;

    tx.commit().await?;
    tracing::info!("[Rooms] Created room {} with {} invites", room.id, invites.len());
    Ok((room, invites))
}

/// Invite more users; host only
pub async fn invite_users(
    pool: &PgPool,
    room_id: Uuid,
    inviter_id: i64,
    invitees: &[i64],
    message: &str,
) -> BackendResult<Vec<RoomInvite>> {
    let mut tx = pool.begin().await?;

    let room = locked_room(&mut tx, room_id).await?;
    if room.host_id != inviter_id {
        return Err(BackendError::forbidden("User is not the host of the room"));
    }
    if room.is_closed {
        return Err(BackendError::conflict("Room is closed"));
    }

    let invitees = resolve_invitees(&mut tx, invitees).await?;
    validate_invitees(&mut tx, room_id, &invitees).await?;
    let invites = db::insert_invites(&mut *tx, room_id, inviter_id, &invitees, message).await?;

    tx.commit().await?;
    Ok(invites)
}

/// Answer the caller's pending invite
///
/// Accepting makes the caller an attendee and returns the updated room
/// with its attendees; rejecting returns `None`.
pub async fn respond_to_invite(
    pool: &PgPool,
    room_id: Uuid,
    user_id: i64,
    accept: bool,
) -> BackendResult<Option<(Room, Vec<User>)>> {
    let mut tx = pool.begin().await?;

    let room = locked_room(&mut tx, room_id).await?;
    let status = if accept { "accepted" } else { "rejected" };
    if !db::answer_invite(&mut *tx, room_id, user_id, status).await? {
        return Err(BackendError::not_found("No pending invite for this room"));
    }

    if !accept {
        tx.commit().await?;
        return Ok(None);
    }
    if room.is_closed {
        return Err(BackendError::conflict("Room is closed"));
    }

    db::add_attendee(&mut *tx, room_id, user_id).await?;
    let room = db::adjust_attendees_count(&mut *tx, room_id, 1).await?;
    let attendees = db::attendees(&mut *tx, room_id).await?;

    tx.commit().await?;
    Ok(Some((room, attendees)))
}

/// Join an open room without an invite
pub async fn join_room(pool: &PgPool, room_id: Uuid, user_id: i64) -> BackendResult<(Room, Vec<User>)> {
    let mut tx = pool.begin().await?;

    let room = locked_room(&mut tx, room_id).await?;
    if db::is_attendee(&mut *tx, room_id, user_id).await? {
        return Err(BackendError::conflict("User is already in room"));
    }
    if room.is_closed {
        return Err(BackendError::conflict("Room is closed"));
    }

    db::add_attendee(&mut *tx, room_id, user_id).await?;
    let room = db::adjust_attendees_count(&mut *tx, room_id, 1).await?;
    // A pending invite is moot once the user is in.
    db::answer_invite(&mut *tx, room_id, user_id, "accepted").await?;
    let attendees = db::attendees(&mut *tx, room_id).await?;

    tx.commit().await?;
    Ok((room, attendees))
}

/// Close the room; host only, all bills consolidated
pub async fn close_room(pool: &PgPool, room_id: Uuid, user_id: i64) -> BackendResult<()> {
    let mut tx = pool.begin().await?;

    let room = locked_room(&mut tx, room_id).await?;
    if !all_bills_consolidated(&mut *tx, room_id).await? {
        return Err(BackendError::conflict("Cannot perform action with unconsolidated bills"));
    }
    if room.host_id != user_id {
        return Err(BackendError::forbidden("User is not the host of the room"));
    }
    if room.is_closed {
        return Err(BackendError::conflict("Room is already closed"));
    }

    db::set_closed(&mut *tx, room_id).await?;
    let dropped = db::delete_pending_invites(&mut *tx, room_id).await?;

    tx.commit().await?;
    tracing::info!("[Rooms] Closed room {} ({} pending invites removed)", room_id, dropped);
    Ok(())
}

/// Leave the room; all bills consolidated, the host cannot leave
pub async fn leave_room(pool: &PgPool, room_id: Uuid, user_id: i64) -> BackendResult<()> {
    let mut tx = pool.begin().await?;

    let room = locked_room(&mut tx, room_id).await?;
    if !all_bills_consolidated(&mut *tx, room_id).await? {
        return Err(BackendError::conflict("Cannot perform action with unconsolidated bills"));
    }
    if room.host_id == user_id {
        return Err(BackendError::conflict("Cannot leave room as host"));
    }
    if !db::remove_attendee(&mut *tx, room_id, user_id).await? {
        return Err(BackendError::forbidden("User is not in room"));
    }
    db::adjust_attendees_count(&mut *tx, room_id, -1).await?;

    tx.commit().await?;
    Ok(())
}
