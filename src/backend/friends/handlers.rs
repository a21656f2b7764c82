/**
 * Friend Handlers
 *
 * `/v1/users/{userId}/friends` and `/v1/users/{userId}/friendRequests`.
 * Friend lists are readable by any signed-in user; requests and removals
 * act on the caller's own id only.
 */

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use super::{db, service};
use crate::backend::auth::users::User;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::{AuthUser, AuthenticatedUser};
use crate::backend::rooms::handlers::CountResponse;
use crate::backend::server::state::AppState;
use crate::shared::social::{FriendRequest, FriendRequestAction, FriendRequestStatus};

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FriendIdRequest {
    pub friend_id: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsFriendResponse {
    pub is_friend: bool,
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondRequest {
    pub request_id: i64,
    pub action: FriendRequestAction,
}

fn ensure_self(user: &AuthenticatedUser, user_id: i64) -> BackendResult<()> {
    if user.user_id != user_id {
        return Err(BackendError::forbidden("Cannot act on behalf of another user"));
    }
    Ok(())
}

/// GET /v1/users/{userId}/friends
pub async fn get_friends(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(user_id): Path<i64>,
) -> BackendResult<Json<Vec<User>>> {
    Ok(Json(db::friends_of(state.db()?, user_id).await?))
}

/// GET /v1/users/{userId}/friends/count
pub async fn count_friends(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(user_id): Path<i64>,
) -> BackendResult<Json<CountResponse>> {
    let count = db::count_friends(state.db()?, user_id).await?;
    Ok(Json(CountResponse { count }))
}

/// POST /v1/users/{userId}/friends/check
pub async fn check_friend(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(user_id): Path<i64>,
    Json(request): Json<FriendIdRequest>,
) -> BackendResult<Json<IsFriendResponse>> {
    let is_friend = db::is_friend(state.db()?, user_id, request.friend_id).await?;
    Ok(Json(IsFriendResponse { is_friend }))
}

/// DELETE /v1/users/{userId}/friends/{friendId}
pub async fn remove_friend(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((user_id, friend_id)): Path<(i64, i64)>,
) -> BackendResult<StatusCode> {
    ensure_self(&user, user_id)?;
    let removed = db::remove_friendship(state.db()?, user_id, friend_id).await?;
    if removed == 0 {
        return Err(BackendError::not_found("Friend not found"));
    }
    tracing::info!("[Friends] User {} removed friend {}", user_id, friend_id);
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/users/{userId}/friendRequests?status=
pub async fn get_friend_requests(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<i64>,
    Query(query): Query<StatusQuery>,
) -> BackendResult<Json<Vec<FriendRequest>>> {
    ensure_self(&user, user_id)?;
    let status = match query.status.as_deref() {
        None => FriendRequestStatus::Pending,
        Some(raw) => FriendRequestStatus::parse(raw)
            .ok_or_else(|| BackendError::invalid_input(format!("Unknown status '{}'", raw)))?,
    };
    Ok(Json(db::received_requests(state.db()?, user_id, status).await?))
}

/// GET /v1/users/{userId}/friendRequests/count
pub async fn count_friend_requests(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<i64>,
) -> BackendResult<Json<CountResponse>> {
    ensure_self(&user, user_id)?;
    let count = db::count_pending_received(state.db()?, user_id).await?;
    Ok(Json(CountResponse { count }))
}

/// POST /v1/users/{userId}/friendRequests
pub async fn send_friend_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<i64>,
    Json(request): Json<FriendIdRequest>,
) -> BackendResult<(StatusCode, Json<FriendRequest>)> {
    ensure_self(&user, user_id)?;
    let sent = service::send_request(state.db()?, user_id, request.friend_id).await?;
    Ok((StatusCode::CREATED, Json(sent)))
}

/// PATCH /v1/users/{userId}/friendRequests
pub async fn respond_to_friend_request(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<i64>,
    Json(request): Json<RespondRequest>,
) -> BackendResult<Json<FriendRequest>> {
    ensure_self(&user, user_id)?;
    let answered = service::respond_to_request(state.db()?, user_id, request.request_id, request.action).await?;
    Ok(Json(answered))
}
