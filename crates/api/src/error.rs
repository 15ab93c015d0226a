//! Mapping of domain and request failures onto JSON error responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pocketbank_core::LedgerError;
use pocketbank_shared::JwtError;
use serde::Serialize;
use tracing::error;

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable kind, e.g. `INSUFFICIENT_FUNDS`.
    pub error: &'static str,
    /// Human-readable message.
    pub message: String,
}

/// An error leaving a handler.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    error: &'static str,
    message: String,
}

impl ApiError {
    /// Builds an error from its parts.
    #[must_use]
    pub fn new(status: StatusCode, error: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            error,
            message: message.into(),
        }
    }

    /// 401 with the given kind.
    #[must_use]
    pub fn unauthorized(error: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, error, message)
    }

    /// 400 `VALIDATION_ERROR`.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    /// Response status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        self.error
    }
}

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let status = StatusCode::from_u16(err.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let message = match &err {
            LedgerError::Storage(_) | LedgerError::Internal(_) => {
                error!(error = %err, "request failed");
                "An internal error occurred".to_string()
            }
            _ => err.to_string(),
        };
        Self::new(status, err.error_code(), message)
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => Self::unauthorized("TOKEN_EXPIRED", "Token has expired"),
            _ => Self::unauthorized("INVALID_TOKEN", "Invalid or malformed token"),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), "VALIDATION_ERROR", rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorBody {
                error: self.error,
                message: self.message,
            }),
        )
            .into_response()
    }
}
