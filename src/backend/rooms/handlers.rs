/**
 * Room Handlers
 *
 * `/v1/rooms` endpoints. Routes under `/v1/rooms/{roomId}` that require
 * attendance receive the `RoomMembership` set by the room guard.
 */

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::db::{self, NewRoom, PendingInvite, Room, RoomInvite};
use super::service;
use crate::backend::auth::users::User;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::{AuthUser, RoomMembership};
use crate::backend::server::state::AppState;
use crate::shared::ids::parse_id;

#[derive(Debug, Deserialize, Serialize)]
pub struct RoomFields {
    pub name: String,
    pub date: DateTime<Utc>,
    pub time: String,
    pub venue: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub room: RoomFields,
    #[serde(default)]
    pub invitees_id: Vec<i64>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteRequest {
    pub invitees_id: Vec<i64>,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RespondInviteRequest {
    pub accept: bool,
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

#[derive(Debug, Serialize)]
pub struct CreateRoomResponse {
    pub room: Room,
    pub invites: Vec<RoomInvite>,
}

#[derive(Debug, Serialize)]
pub struct RoomWithAttendees {
    pub room: Room,
    pub attendees: Vec<User>,
}

fn non_empty(field: &str, value: &str) -> BackendResult<()> {
    if value.trim().is_empty() {
        return Err(BackendError::invalid_input(format!("{} is required", field)));
    }
    Ok(())
}

/// POST /v1/rooms
pub async fn create_room(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateRoomRequest>,
) -> BackendResult<Json<CreateRoomResponse>> {
    non_empty("name", &request.room.name)?;
    non_empty("time", &request.room.time)?;
    non_empty("venue", &request.room.venue)?;

    let new_room = NewRoom {
        name: request.room.name.trim().to_string(),
        date: request.room.date,
        time: request.room.time,
        venue: request.room.venue,
    };
    let (room, invites) = service::create_room_with_invites(
        state.db()?,
        user.user_id,
        &new_room,
        &request.invitees_id,
        &request.message,
    )
    .await?;
    Ok(Json(CreateRoomResponse { room, invites }))
}

/// GET /v1/rooms?page=N
pub async fn get_rooms(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<PageQuery>,
) -> BackendResult<Json<Vec<Room>>> {
    let rooms = db::user_rooms(state.db()?, user.user_id, query.page.unwrap_or(1)).await?;
    Ok(Json(rooms))
}

/// GET /v1/rooms/count
pub async fn count_rooms(State(state): State<AppState>, AuthUser(user): AuthUser) -> BackendResult<Json<CountResponse>> {
    let count = db::count_user_rooms(state.db()?, user.user_id).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /v1/rooms/invites
pub async fn get_invites(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<Vec<PendingInvite>>> {
    Ok(Json(db::pending_invites(state.db()?, user.user_id).await?))
}

/// GET /v1/rooms/invites/count
pub async fn count_invites(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<CountResponse>> {
    let count = db::count_pending_invites(state.db()?, user.user_id).await?;
    Ok(Json(CountResponse { count }))
}

/// GET /v1/rooms/{roomId}
pub async fn get_room(
    State(state): State<AppState>,
    Extension(membership): Extension<RoomMembership>,
) -> BackendResult<Json<Room>> {
    let room = db::get_room(state.db()?, membership.room_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Room not found"))?;
    Ok(Json(room))
}

/// GET /v1/rooms/{roomId}/attendees
pub async fn get_attendees(
    State(state): State<AppState>,
    Extension(membership): Extension<RoomMembership>,
) -> BackendResult<Json<Vec<User>>> {
    Ok(Json(db::attendees(state.db()?, membership.room_id).await?))
}

/// POST /v1/rooms/{roomId}
pub async fn invite_users(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Extension(membership): Extension<RoomMembership>,
    Json(request): Json<InviteRequest>,
) -> BackendResult<Json<Vec<RoomInvite>>> {
    if request.invitees_id.is_empty() {
        return Err(BackendError::invalid_input("inviteesId must not be empty"));
    }
    let invites = service::invite_users(
        state.db()?,
        membership.room_id,
        user.user_id,
        &request.invitees_id,
        &request.message,
    )
    .await?;
    Ok(Json(invites))
}

/// PATCH /v1/rooms/{roomId}/close
pub async fn close_room(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Extension(membership): Extension<RoomMembership>,
) -> BackendResult<Json<serde_json::Value>> {
    service::close_room(state.db()?, membership.room_id, user.user_id).await?;
    Ok(Json(serde_json::json!({ "roomId": membership.room_id, "isClosed": true })))
}

/// PATCH /v1/rooms/{roomId}/leave
pub async fn leave_room(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Extension(membership): Extension<RoomMembership>,
) -> BackendResult<Json<serde_json::Value>> {
    service::leave_room(state.db()?, membership.room_id, user.user_id).await?;
    Ok(Json(serde_json::json!({ "roomId": membership.room_id, "left": true })))
}

fn room_id_from(raw: &str) -> BackendResult<Uuid> {
    Ok(parse_id(raw)?)
}

/// PATCH /v1/rooms/{roomId}
pub async fn respond_to_invite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<String>,
    Json(request): Json<RespondInviteRequest>,
) -> BackendResult<Json<Option<RoomWithAttendees>>> {
    let room_id = room_id_from(&room_id)?;
    let answered = service::respond_to_invite(state.db()?, room_id, user.user_id, request.accept).await?;
    Ok(Json(answered.map(|(room, attendees)| RoomWithAttendees { room, attendees })))
}

/// PATCH /v1/rooms/{roomId}/join
pub async fn join_room(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(room_id): Path<String>,
) -> BackendResult<Json<RoomWithAttendees>> {
    let room_id = room_id_from(&room_id)?;
    let (room, attendees) = service::join_room(state.db()?, room_id, user.user_id).await?;
    Ok(Json(RoomWithAttendees { room, attendees }))
}
