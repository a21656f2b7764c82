/**
 * Room Membership Guard
 *
 * Applied to the `/v1/rooms/{roomId}/...` routes that only attendees may
 * use. Loads the attendee list once; handlers that broadcast to the room
 * read it from the `RoomMembership` extension instead of querying again.
 */

use std::collections::HashMap;

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::backend::middleware::auth::AuthUser;
use crate::backend::rooms::db::{attendee_ids, room_exists};
use crate::backend::server::state::AppState;
use crate::shared::ids::parse_id;

/// The room in the path and everyone attending it
#[derive(Clone, Debug)]
pub struct RoomMembership {
    pub room_id: Uuid,
    pub attendees: Vec<i64>,
}

impl RoomMembership {
    pub fn contains(&self, user_id: i64) -> bool {
        self.attendees.contains(&user_id)
    }
}

/// Fails 404 for an unknown room and 403 when the caller is not attending
pub async fn require_room_member(
    State(app_state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(params): Path<HashMap<String, String>>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let raw = params
        .get("roomId")
        .ok_or_else(|| BackendError::invalid_input("Missing room id"))?;
    let room_id = parse_id(raw)?;

    let pool = app_state.db()?;
    if !room_exists(pool, room_id).await? {
        return Err(BackendError::not_found("Room not found"));
    }

    let attendees = attendee_ids(pool, room_id).await?;
    if !attendees.contains(&user.user_id) {
        tracing::warn!("[Rooms] User {} is not in room {}", user.user_id, room_id);
        return Err(BackendError::forbidden("User is not in room"));
    }

    request.extensions_mut().insert(RoomMembership { room_id, attendees });
    Ok(next.run(request).await)
}
