/**
 * Backend Error Types
 *
 * One variant per error kind the API reports, plus transparent wrappers for
 * the libraries underneath (sqlx, the broker, serde).
 *
 * # Error Categories
 *
 * ## Client errors
 *
 * - invalid input (bad body, bad amount, empty content)
 * - unauthorized (missing or invalid token)
 * - forbidden (not the host, not the payer, not a room member)
 * - not found
 * - conflict (duplicates, already settled, unconsolidated bills)
 *
 * ## Server errors
 *
 * - internal (database or broker I/O)
 * - unavailable (no database configured)
 */

use axum::http::StatusCode;
use thiserror::Error;

use crate::backend::broker::BrokerError;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// # Usage
///
/// ```rust
/// use justjio::backend::error::BackendError;
///
/// let err = BackendError::conflict("Transaction already settled");
/// assert_eq!(err.status_code().as_u16(), 409);
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal failure; the message is logged, never sent to the client
    #[error("Internal error: {0}")]
    Internal(String),

    /// A required service (the database) is not configured
    #[error("Service unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl BackendError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Error returned by handlers when the server started without a database
    pub fn database_unavailable() -> Self {
        Self::Unavailable("Database not configured".to_string())
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `Database` - 404 for `RowNotFound`, 409 for unique and foreign key
    ///   violations, 500 otherwise
    /// - `Broker` - 500
    /// - `SharedError` - 400 for validation, 500 for serialization
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(err) => match err {
                sqlx::Error::RowNotFound => StatusCode::NOT_FOUND,
                err if is_unique_violation(err) || is_foreign_key_violation(err) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Broker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::SharedError(err) => match err {
                SharedError::ValidationError { .. } => StatusCode::BAD_REQUEST,
                SharedError::SerializationError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to the client
    ///
    /// Server-side failures are reduced to a generic message.
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput(message)
            | Self::Unauthorized(message)
            | Self::Forbidden(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Unavailable(message) => message.clone(),
            Self::Database(sqlx::Error::RowNotFound) => "Resource not found".to_string(),
            Self::Database(err) if is_unique_violation(err) => "Resource already exists".to_string(),
            Self::Database(err) if is_foreign_key_violation(err) => "Resource is still referenced".to_string(),
            Self::SharedError(err @ SharedError::ValidationError { .. }) => err.to_string(),
            _ => "Internal server error".to_string(),
        }
    }

    /// Whether this error is a server-side failure worth logging in full
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

fn has_sqlstate(err: &sqlx::Error, code: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some(code),
        _ => false,
    }
}

/// Postgres unique_violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    has_sqlstate(err, "23505")
}

/// Postgres foreign_key_violation
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    has_sqlstate(err, "23503")
}
