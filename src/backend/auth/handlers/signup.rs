/**
 * Signup Handler
 *
 * POST /v1/auth/signup
 *
 * # Registration Process
 *
 * 1. Validate username, email and password
 * 2. Hash the password with bcrypt
 * 3. Create the user with an unverified email
 * 4. Issue a `verify-email` code into the OTP store
 *
 * Duplicate usernames or emails are rejected with 409, whether caught by
 * the lookups or by the unique constraints.
 */

use axum::{extract::State, http::StatusCode, response::Json};
use bcrypt::{hash, DEFAULT_COST};

use crate::backend::auth::handlers::types::SignupRequest;
use crate::backend::auth::otp::OtpPurpose;
use crate::backend::auth::users::{create_user, get_user_by_email, get_user_by_username, User};
use crate::backend::error::{is_unique_violation, BackendError, BackendResult};
use crate::backend::server::state::AppState;

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 8;

/// Validate username format
///
/// Usernames must be:
/// - 3-30 characters long
/// - Contain only alphanumeric characters and underscores
/// - Start with a letter
pub fn is_valid_username(username: &str) -> bool {
    if username.len() < 3 || username.len() > 30 {
        return false;
    }

    let mut chars = username.chars();

    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Basic shape check; real verification happens through the OTP
pub fn is_valid_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}

/// Sign up handler
///
/// # Errors
///
/// * `400 Bad Request` - invalid username, email or password
/// * `409 Conflict` - username or email already registered
/// * `503 Service Unavailable` - database not configured
pub async fn signup(
    State(state): State<AppState>,
    Json(request): Json<SignupRequest>,
) -> BackendResult<(StatusCode, Json<User>)> {
    let pool = state.db()?;
    tracing::info!("Signup request for username: {}, email: {}", request.username, request.email);

    if !is_valid_username(&request.username) {
        return Err(BackendError::invalid_input(
            "Username must be 3-30 chars, start with a letter, and contain only letters, numbers, and underscores",
        ));
    }
    if !is_valid_email(&request.email) {
        return Err(BackendError::invalid_input("Invalid email format"));
    }
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(BackendError::invalid_input("Password must be at least 8 characters"));
    }

    if get_user_by_username(pool, &request.username).await?.is_some() {
        tracing::warn!("Username already exists: {}", request.username);
        return Err(BackendError::conflict("Username already taken"));
    }
    if get_user_by_email(pool, &request.email).await?.is_some() {
        tracing::warn!("Email already exists: {}", request.email);
        return Err(BackendError::conflict("Email already registered"));
    }

    let password_hash = hash(&request.password, DEFAULT_COST).map_err(|e| {
        tracing::error!("Failed to hash password: {:?}", e);
        BackendError::internal("Failed to hash password")
    })?;

    let user = create_user(pool, &request.username, &request.email, &password_hash)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                BackendError::conflict("Username or email already registered")
            } else {
                e.into()
            }
        })?;

    let code = state.otp_store.issue(OtpPurpose::VerifyEmail, &user.email).await;
    tracing::debug!("Verification code for {}: {}", user.email, code);
    tracing::info!("User created successfully: {} ({})", user.username, user.email);

    Ok((StatusCode::CREATED, Json(user)))
}
