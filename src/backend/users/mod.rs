//! Users Module
//!
//! Profile reads and self-service account updates. The user model and its
//! queries live in `auth::users`.

pub mod handlers;
