//! Backend Error Module
//!
//! Error types returned by HTTP handlers and services of the API process.
//!
//! # Module Structure
//!
//! ```text
//! error/
//! ├── mod.rs        - Module exports and documentation
//! ├── types.rs      - Error type definitions
//! └── conversion.rs - IntoResponse and sqlx mapping
//! ```
//!
//! # Error Kinds
//!
//! | Variant        | Status |
//! |----------------|--------|
//! | `InvalidInput` | 400    |
//! | `Unauthorized` | 401    |
//! | `Forbidden`    | 403    |
//! | `NotFound`     | 404    |
//! | `Conflict`     | 409    |
//! | `Internal`     | 500    |
//! | `Unavailable`  | 503    |
//!
//! Wrapped `sqlx`, broker and serialization errors map onto the same table.
//!
//! # Example
//!
//! ```rust,no_run
//! use justjio::backend::error::BackendError;
//!
//! fn check_amount(cents: i64) -> Result<(), BackendError> {
//!     if cents <= 0 {
//!         return Err(BackendError::invalid_input("amount must be positive"));
//!     }
//!     Ok(())
//! }
//! ```

/// Error type definitions
pub mod types;

/// Error conversion implementations
pub mod conversion;

// Re-export commonly used types
pub use types::BackendError;
pub(crate) use types::{is_foreign_key_violation, is_unique_violation};

/// Result alias for handlers and services
pub type BackendResult<T> = Result<T, BackendError>;
