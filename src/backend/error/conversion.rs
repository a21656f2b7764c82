/**
 * Error Conversion
 *
 * Turns a `BackendError` into an HTTP response. Server errors are logged
 * here with their full detail, once, before the generic message is sent.
 *
 * # Response Format
 *
 * ```json
 * {
 *   "error": "Error message",
 *   "status": 409
 * }
 * ```
 */

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("[API] {} ({})", self, status.as_u16());
        } else {
            tracing::debug!("[API] {} ({})", self, status.as_u16());
        }

        let body = serde_json::json!({
            "error": self.message(),
            "status": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

/// Fallback for unmatched routes
pub async fn not_found_fallback() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "code": 404,
            "message": "404: Endpoint Not Found",
        })),
    )
}
