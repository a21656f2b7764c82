/**
 * Login Handler
 *
 * POST /v1/auth
 *
 * # Authentication Process
 *
 * 1. Look up the user by username, or by email when the value has an `@`
 * 2. Verify the password with bcrypt
 * 3. Mark the user online
 * 4. Ensure the user's broker topic on a detached task
 * 5. Return a JWT and the user
 *
 * Unknown users and wrong passwords both answer 401 with the same message.
 */

use axum::{extract::State, response::Json};
use bcrypt::verify;

use crate::backend::auth::handlers::types::{AuthResponse, LoginRequest};
use crate::backend::auth::sessions::create_token;
use crate::backend::auth::users::{get_user_by_email, get_user_by_username, set_online};
use crate::backend::broker::Publisher;
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::server::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Create the user's topic without holding up the login response
pub fn spawn_ensure_user_topic(publisher: Publisher, user_id: i64) {
    tokio::spawn(async move {
        if let Err(e) = publisher.ensure_user_topic(user_id).await {
            tracing::warn!("Could not ensure topic for user {}: {}", user_id, e);
        }
    });
}

/// Login handler
///
/// # Errors
///
/// * `401 Unauthorized` - unknown user or wrong password
/// * `503 Service Unavailable` - database not configured
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> BackendResult<Json<AuthResponse>> {
    let pool = state.db()?;
    tracing::info!("Login request for: {}", request.username);

    let user = if request.username.contains('@') {
        get_user_by_email(pool, &request.username).await?
    } else {
        get_user_by_username(pool, &request.username).await?
    };
    let user = user.ok_or_else(|| {
        tracing::warn!("User not found: {}", request.username);
        BackendError::unauthorized(INVALID_CREDENTIALS)
    })?;

    let valid = verify(&request.password, &user.password_hash).map_err(|e| {
        tracing::error!("Password verification error: {:?}", e);
        BackendError::internal("Password verification failed")
    })?;
    if !valid {
        tracing::warn!("Invalid password for user: {}", request.username);
        return Err(BackendError::unauthorized(INVALID_CREDENTIALS));
    }

    let token = create_token(state.jwt_secret(), user.id, &user.username, &user.email).map_err(|e| {
        tracing::error!("Failed to create token: {:?}", e);
        BackendError::internal("Failed to create token")
    })?;

    let user = set_online(pool, user.id, true).await?;
    spawn_ensure_user_topic(state.publisher.clone(), user.id);

    tracing::info!("User logged in successfully: {} ({})", user.username, user.email);
    Ok(Json(AuthResponse { token, user }))
}
