/**
 * One-Time Code Handlers
 *
 * Codes are kept in the in-memory `OtpStore`. Sending the code to the user
 * is not done here; it is written to the debug log.
 */

use axum::{extract::State, response::Json};
use bcrypt::{hash, DEFAULT_COST};

use crate::backend::auth::handlers::signup::MIN_PASSWORD_LEN;
use crate::backend::auth::handlers::types::{
    MessageResponse, ResetPasswordRequest, SendOtpRequest, VerifyOtpRequest,
};
use crate::backend::auth::otp::{OtpError, OtpPurpose};
use crate::backend::auth::users::{get_user_by_email, mark_email_verified, update_password};
use crate::backend::error::{BackendError, BackendResult};
use crate::backend::server::state::AppState;

impl From<OtpError> for BackendError {
    fn from(error: OtpError) -> Self {
        match error {
            OtpError::Missing => BackendError::not_found(error.to_string()),
            OtpError::Mismatch => BackendError::invalid_input(error.to_string()),
        }
    }
}

/// POST /v1/auth/otp
pub async fn send_otp(
    State(state): State<AppState>,
    Json(request): Json<SendOtpRequest>,
) -> BackendResult<Json<MessageResponse>> {
    let user = get_user_by_email(state.db()?, &request.email)
        .await?
        .ok_or_else(|| BackendError::not_found("User not found"))?;

    if request.purpose == OtpPurpose::VerifyEmail && user.is_email_valid {
        return Err(BackendError::conflict("Email already verified"));
    }

    let code = state.otp_store.issue(request.purpose, &user.email).await;
    tracing::debug!("OTP for {} ({:?}): {}", user.email, request.purpose, code);
    Ok(Json(MessageResponse::new("OTP sent")))
}

/// POST /v1/auth/verify
pub async fn verify_otp(
    State(state): State<AppState>,
    Json(request): Json<VerifyOtpRequest>,
) -> BackendResult<Json<MessageResponse>> {
    let pool = state.db()?;
    state
        .otp_store
        .consume(OtpPurpose::VerifyEmail, &request.email, &request.otp)
        .await?;
    if !mark_email_verified(pool, &request.email).await? {
        return Err(BackendError::not_found("User not found"));
    }
    tracing::info!("Email verified: {}", request.email);
    Ok(Json(MessageResponse::new("Email verified")))
}

/// PATCH /v1/auth/reset
pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> BackendResult<Json<MessageResponse>> {
    let pool = state.db()?;
    if request.password.len() < MIN_PASSWORD_LEN {
        return Err(BackendError::invalid_input("Password must be at least 8 characters"));
    }
    state
        .otp_store
        .consume(OtpPurpose::ResetPassword, &request.email, &request.otp)
        .await?;

    let password_hash = hash(&request.password, DEFAULT_COST).map_err(|e| {
        tracing::error!("Failed to hash password: {:?}", e);
        BackendError::internal("Failed to hash password")
    })?;
    if !update_password(pool, &request.email, &password_hash).await? {
        return Err(BackendError::not_found("User not found"));
    }
    tracing::info!("Password reset for {}", request.email);
    Ok(Json(MessageResponse::new("Password updated")))
}
