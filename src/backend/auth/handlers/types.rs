/**
 * Authentication Handler Types
 *
 * Request and response bodies shared by the signup, login and OTP
 * handlers.
 */

use serde::{Deserialize, Serialize};

use crate::backend::auth::otp::OtpPurpose;
use crate::backend::auth::users::User;

/// Sign up request
#[derive(Deserialize, Serialize, Debug)]
pub struct SignupRequest {
    /// 3-30 chars, starts with a letter, then letters, digits or underscores
    pub username: String,
    pub email: String,
    /// Plain password, hashed before storage
    pub password: String,
}

/// Login request
///
/// `username` may also hold an email address.
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Returned by login
#[derive(Serialize, Debug)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SendOtpRequest {
    pub email: String,
    pub purpose: OtpPurpose,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct ResetPasswordRequest {
    pub email: String,
    pub otp: String,
    pub password: String,
}

/// Plain acknowledgement body
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}
