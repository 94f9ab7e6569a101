//! Error types for web handlers.
//!
//! Bridges domain errors to HTTP responses via Axum's `IntoResponse`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rollcall_core::{CheckinError, QrError, token::SignError};
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Wraps domain errors with an HTTP status, a stable machine-readable
/// code and a user-facing message.
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
        }
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 401 Unauthorized error.
    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            message.into(),
            "UNAUTHORIZED".to_string(),
        )
    }

    /// Create a 403 Forbidden error.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::FORBIDDEN,
            message.into(),
            "FORBIDDEN".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {}

/// Map a check-in validation outcome to its HTTP shape.
///
/// Validation errors carry the status and code promised by the API
/// contract: bad token / mismatch / duplicate are 400, a missing or
/// inactive event is 404. Storage faults become opaque 500s.
impl From<CheckinError> for AppError {
    fn from(err: CheckinError) -> Self {
        let (status, code) = match &err {
            CheckinError::InvalidToken => (StatusCode::BAD_REQUEST, "INVALID_TOKEN"),
            CheckinError::TokenEventMismatch => (StatusCode::BAD_REQUEST, "TOKEN_EVENT_MISMATCH"),
            CheckinError::AlreadyCheckedIn => (StatusCode::BAD_REQUEST, "ALREADY_CHECKED_IN"),
            CheckinError::EventNotActive => (StatusCode::NOT_FOUND, "EVENT_NOT_ACTIVE"),
            CheckinError::Storage(detail) => {
                tracing::error!(error = %detail, "Storage error during request");
                return Self::internal("An internal error occurred");
            }
        };
        Self::new(status, err.to_string(), code.to_string())
    }
}

impl From<QrError> for AppError {
    fn from(err: QrError) -> Self {
        tracing::error!(error = %err, "QR rendering failed");
        Self::internal("Failed to generate QR code")
    }
}

impl From<SignError> for AppError {
    fn from(err: SignError) -> Self {
        tracing::error!(error = %err, "Token signing failed");
        Self::internal("Failed to generate QR code")
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                code = %self.code,
                message = %self.message,
                "Internal server error"
            );
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_includes_code() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn checkin_validation_errors_map_to_400() {
        for err in [
            CheckinError::InvalidToken,
            CheckinError::TokenEventMismatch,
            CheckinError::AlreadyCheckedIn,
        ] {
            let app: AppError = err.into();
            assert_eq!(app.status, StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn inactive_event_maps_to_404() {
        let app: AppError = CheckinError::EventNotActive.into();
        assert_eq!(app.status, StatusCode::NOT_FOUND);
        assert_eq!(app.code, "EVENT_NOT_ACTIVE");
    }

    #[test]
    fn storage_errors_are_opaque_500s() {
        let app: AppError = CheckinError::Storage("pg down".into()).into();
        assert_eq!(app.status, StatusCode::INTERNAL_SERVER_ERROR);
        // The storage detail must not leak to the client.
        assert!(!app.message.contains("pg down"));
    }
}
