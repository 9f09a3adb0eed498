//! API error types.

use crate::core::{FetchError, ReportError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body could not be decoded.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Report generation failed.
    #[error(transparent)]
    Report(#[from] ReportError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        self.status_and_code().0
    }

    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Report(ReportError::NoInstruments) => {
                (StatusCode::BAD_REQUEST, "NO_INSTRUMENTS")
            }
            ApiError::Report(ReportError::DivisionByZero) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "DIVISION_BY_ZERO")
            }
            ApiError::Report(ReportError::Fetch(FetchError::Panicked { .. })) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
            ApiError::Report(ReportError::Fetch(_)) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            ApiError::Report(ReportError::NoData { .. }) => (StatusCode::BAD_GATEWAY, "NO_DATA"),
            ApiError::Report(ReportError::Timeout { .. }) => {
                (StatusCode::GATEWAY_TIMEOUT, "TIMEOUT")
            }
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        warn!(status = %status, error = %self, "Fund request failed");

        let body = Json(ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message: self.to_string(),
            },
        });

        (status, body).into_response()
    }
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;
