/**
 * Notification Handlers
 *
 * The `/v1/users/{userId}/notifications/{id}` routes only serve the
 * caller's own notifications.
 */

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use super::db::{self, Notification};
use super::service;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::middleware::{AuthUser, AuthenticatedUser};
use crate::backend::server::state::AppState;

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateNotificationRequest {
    pub title: String,
    pub content: String,
}

fn ensure_self(user: &AuthenticatedUser, user_id: i64) -> BackendResult<()> {
    if user.user_id != user_id {
        return Err(BackendError::forbidden("Cannot access another user's notifications"));
    }
    Ok(())
}

/// GET /v1/notifications
pub async fn get_notifications(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> BackendResult<Json<Vec<Notification>>> {
    Ok(Json(db::notifications_for_user(state.db()?, user.user_id).await?))
}

/// POST /v1/notifications
pub async fn create_notification(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateNotificationRequest>,
) -> BackendResult<Json<Notification>> {
    let notification = service::dispatch(
        state.db()?,
        &state.publisher,
        user.user_id,
        &request.title,
        &request.content,
    )
    .await?;
    Ok(Json(notification))
}

/// GET /v1/users/{userId}/notifications/{id}
pub async fn get_notification(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((user_id, id)): Path<(i64, i64)>,
) -> BackendResult<Json<Notification>> {
    ensure_self(&user, user_id)?;
    db::get_notification(state.db()?, user_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| BackendError::not_found("Notification not found"))
}

/// PATCH /v1/users/{userId}/notifications/{id}
pub async fn mark_notification_read(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path((user_id, id)): Path<(i64, i64)>,
) -> BackendResult<Json<Notification>> {
    ensure_self(&user, user_id)?;
    db::mark_read(state.db()?, user_id, id)
        .await?
        .map(Json)
        .ok_or_else(|| BackendError::not_found("Notification not found"))
}
