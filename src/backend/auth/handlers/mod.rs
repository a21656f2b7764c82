//! Authentication Handlers Module
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs      - Module exports and documentation
//! ├── types.rs    - Request and response types
//! ├── signup.rs   - User registration handler
//! ├── login.rs    - User authentication handler
//! └── otp.rs      - One-time code issue, verification and password reset
//! ```
//!
//! # Handlers
//!
//! - **`signup`** - POST /v1/auth/signup
//! - **`login`** - POST /v1/auth
//! - **`send_otp`** - POST /v1/auth/otp
//! - **`verify_otp`** - POST /v1/auth/verify
//! - **`reset_password`** - PATCH /v1/auth/reset

/// Request and response types
pub mod types;

/// Signup handler
pub mod signup;

/// Login handler
pub mod login;

/// One-time code handlers
pub mod otp;

pub use types::{AuthResponse, LoginRequest, SignupRequest};

pub use login::login;
pub use otp::{reset_password, send_otp, verify_otp};
pub use signup::signup;
