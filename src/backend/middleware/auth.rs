/**
 * Authentication Middleware
 *
 * Extracts and verifies the JWT from the `Authorization` header and makes
 * the caller available to handlers through the `AuthUser` extractor.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::backend::auth::sessions::{bearer_token, verify_token};
use crate::backend::auth::users::user_exists;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Authenticated user data extracted from JWT token
#[derive(Clone, Debug)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub username: String,
    pub email: String,
}

/// Authentication middleware
///
/// 1. Extracts the bearer token
/// 2. Verifies it with the configured secret
/// 3. Checks that the user still exists (when a database is configured)
/// 4. Attaches `AuthenticatedUser` to the request extensions
///
/// Returns 401 Unauthorized if the token is missing or invalid.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            tracing::warn!("Missing Authorization header");
            BackendError::unauthorized("Missing or malformed JWT")
        })?;

    let token = bearer_token(header).ok_or_else(|| {
        tracing::warn!("Invalid Authorization header format");
        BackendError::unauthorized("Missing or malformed JWT")
    })?;

    let claims = verify_token(app_state.jwt_secret(), token).map_err(|e| {
        tracing::warn!("Invalid token: {:?}", e);
        BackendError::unauthorized("Invalid or expired JWT")
    })?;

    let user_id = claims
        .user_id()
        .ok_or_else(|| BackendError::unauthorized("Invalid user ID in token"))?;

    if let Some(pool) = &app_state.db_pool {
        if !user_exists(pool, user_id).await? {
            tracing::warn!("Token for deleted user {}", user_id);
            return Err(BackendError::unauthorized("User no longer exists"));
        }
    }

    request.extensions_mut().insert(AuthenticatedUser {
        user_id,
        username: claims.username,
        email: claims.email,
    });

    Ok(next.run(request).await)
}

/// Extract authenticated user from request extensions
pub fn extract_authenticated_user(request: &Request) -> Result<AuthenticatedUser, BackendError> {
    request
        .extensions()
        .get::<AuthenticatedUser>()
        .cloned()
        .ok_or_else(|| {
            tracing::warn!("AuthenticatedUser not found in request extensions");
            BackendError::unauthorized("Not authenticated")
        })
}

/// Axum extractor for authenticated user
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("AuthenticatedUser not found in request extensions");
                BackendError::unauthorized("Not authenticated")
            })?;
        Ok(AuthUser(user))
    }
}
