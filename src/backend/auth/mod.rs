//! Authentication Module
//!
//! This module handles user registration, login and one-time codes. It
//! owns the user model and JWT handling used by the auth middleware.
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── users.rs        - User model and database operations
//! ├── sessions.rs     - JWT token management
//! ├── otp.rs          - Bounded TTL store for one-time codes
//! └── handlers/       - HTTP handlers
//! ```
//!
//! # Authentication Flow
//!
//! 1. **Signup**: username, email and password → user created, verification code issued
//! 2. **Verify**: email and code → email marked verified
//! 3. **Login**: username (or email) and password → JWT returned, user marked online
//!
//! # Security
//!
//! - Passwords are hashed using bcrypt before storage
//! - Tokens are HS256 JWTs that expire after 72 hours
//! - Invalid credentials return 401 without saying which part was wrong

/// User data model and database operations
pub mod users;

/// JWT token generation and validation
pub mod sessions;

/// One-time code store
pub mod otp;

/// HTTP handlers for authentication endpoints
pub mod handlers;

pub use handlers::types::{AuthResponse, LoginRequest, SignupRequest};
pub use handlers::{login, reset_password, send_otp, signup, verify_otp};
