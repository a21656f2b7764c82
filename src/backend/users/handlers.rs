/**
 * User Handlers
 *
 * `GET /v1/users/{userId}` is open to any signed-in user. `PATCH` and
 * `DELETE` only act on the caller's own account.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::backend::auth::users::{self, User};
use crate::backend::error::{is_unique_violation, BackendError, BackendResult};
use crate::backend::middleware::AuthUser;
use crate::backend::server::state::AppState;

/// `{field, value}` body of `PATCH /v1/users/{userId}`
#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateUserRequest {
    pub field: String,
    pub value: serde_json::Value,
}

/// A validated user mutation
#[derive(Debug, Clone, PartialEq)]
pub enum UserUpdate {
    Username(String),
    Online(bool),
}

impl TryFrom<UpdateUserRequest> for UserUpdate {
    type Error = BackendError;

    fn try_from(request: UpdateUserRequest) -> Result<Self, Self::Error> {
        match request.field.as_str() {
            "username" => {
                let username = request
                    .value
                    .as_str()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| BackendError::invalid_input("username must be a non-empty string"))?;
                Ok(UserUpdate::Username(username.to_string()))
            }
            "isOnline" => request
                .value
                .as_bool()
                .map(UserUpdate::Online)
                .ok_or_else(|| BackendError::invalid_input("isOnline must be a boolean")),
            other => Err(BackendError::invalid_input(format!("Field '{}' cannot be updated", other))),
        }
    }
}

/// GET /v1/users/{userId}
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_user): AuthUser,
    Path(user_id): Path<i64>,
) -> BackendResult<Json<User>> {
    users::get_user_by_id(state.db()?, user_id)
        .await?
        .map(Json)
        .ok_or_else(|| BackendError::not_found("User not found"))
}

/// PATCH /v1/users/{userId}
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<i64>,
    Json(request): Json<UpdateUserRequest>,
) -> BackendResult<Json<User>> {
    if user.user_id != user_id {
        return Err(BackendError::forbidden("Cannot update another user"));
    }
    let pool = state.db()?;
    let updated = match UserUpdate::try_from(request)? {
        UserUpdate::Username(username) => users::update_username(pool, user_id, &username)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    BackendError::conflict("Username already taken")
                } else {
                    e.into()
                }
            })?,
        UserUpdate::Online(online) => users::set_online(pool, user_id, online).await?,
    };
    Ok(Json(updated))
}

/// DELETE /v1/users/{userId}
///
/// A user still referenced by rooms, bills or transactions cannot be
/// removed; the foreign key violation surfaces as a conflict.
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(user_id): Path<i64>,
) -> BackendResult<StatusCode> {
    if user.user_id != user_id {
        return Err(BackendError::forbidden("Cannot delete another user"));
    }
    if !users::delete_user(state.db()?, user_id).await? {
        return Err(BackendError::not_found("User not found"));
    }
    tracing::info!("[Users] User {} deleted", user_id);
    Ok(StatusCode::NO_CONTENT)
}
