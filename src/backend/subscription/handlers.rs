/**
 * Push Subscription Handlers
 *
 * Stores browser push subscriptions. Delivery over the Web Push protocol
 * is not performed here.
 */

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};

use super::db::{self, Subscription};
use crate::backend::error::{is_unique_violation, BackendError, BackendResult};
use crate::backend::middleware::AuthUser;
use crate::backend::notifications::service::dispatch;
use crate::backend::server::state::AppState;
use crate::shared::ids::parse_id;

pub const WELCOME_TITLE: &str = "Welcome";
pub const WELCOME_CONTENT: &str = "Notifications are now enabled on this device";

#[derive(Debug, Deserialize, Serialize)]
pub struct CreateSubscriptionRequest {
    pub endpoint: String,
    pub auth: String,
    pub p256dh: String,
}

/// GET /v1/subscriptions/{endpoint}
///
/// `endpoint` arrives URL-encoded and is decoded by the path extractor.
pub async fn get_subscription(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(endpoint): Path<String>,
) -> BackendResult<Json<Subscription>> {
    match db::get_by_endpoint(state.db()?, &endpoint).await? {
        Some(subscription) if subscription.user_id == user.user_id => Ok(Json(subscription)),
        _ => Err(BackendError::not_found("Subscription not found")),
    }
}

/// POST /v1/subscriptions
pub async fn create_subscription(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<CreateSubscriptionRequest>,
) -> BackendResult<(StatusCode, Json<Subscription>)> {
    if request.endpoint.trim().is_empty() {
        return Err(BackendError::invalid_input("endpoint is required"));
    }
    let pool = state.db()?;
    let subscription = db::insert_subscription(pool, user.user_id, &request.endpoint, &request.auth, &request.p256dh)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BackendError::conflict("Subscription already exists")
            } else {
                e.into()
            }
        })?;

    if let Err(e) = dispatch(pool, &state.publisher, user.user_id, WELCOME_TITLE, WELCOME_CONTENT).await {
        tracing::warn!("[Subscriptions] Welcome notification for user {} failed: {}", user.user_id, e);
    }
    Ok((StatusCode::CREATED, Json(subscription)))
}

/// DELETE /v1/subscriptions/{subId}
pub async fn delete_subscription(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(sub_id): Path<String>,
) -> BackendResult<StatusCode> {
    let sub_id = parse_id(&sub_id)?;
    let pool = state.db()?;
    let subscription = db::get_by_id(pool, sub_id)
        .await?
        .ok_or_else(|| BackendError::not_found("Subscription not found"))?;
    if subscription.user_id != user.user_id {
        return Err(BackendError::forbidden("Cannot delete another user's subscription"));
    }
    db::delete_subscription(pool, sub_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
