//! Error types for the swap gateway

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::swap::ValidationError;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error
#[derive(Debug, Error)]
pub enum AppError {
    /// Client supplied an image that failed validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Client sent a request body that could not be read
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The `settings` form field was not a valid settings object
    #[error("Malformed settings: {0}")]
    MalformedSettings(#[from] serde_json::Error),

    /// The model host credential is not configured
    #[error("Model host is not configured: {0}")]
    NotConfigured(String),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Model host answered with a non-success status
    #[error("Backend error: {0}")]
    Backend(String),

    /// Model host answered with a body we could not interpret
    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    /// Prediction reached a terminal state other than succeeded
    #[error("Prediction {id} {status}: {message}")]
    PredictionFailed {
        id: String,
        status: String,
        message: String,
    },

    #[error("Model call timed out after {0} ms")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::HttpClient(_)
            | AppError::Backend(_)
            | AppError::MalformedResponse(_)
            | AppError::PredictionFailed { .. } => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::MalformedSettings(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Attach the development flag that decides whether internal detail is exposed
    pub fn with_details(self, expose_details: bool) -> BoundaryError {
        BoundaryError {
            error: self,
            expose_details,
        }
    }
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// An [`AppError`] on its way out of a handler.
///
/// Internal faults are answered with a generic message; the underlying
/// detail is attached only when `expose_details` is set (development).
#[derive(Debug)]
pub struct BoundaryError {
    error: AppError,
    expose_details: bool,
}

impl From<AppError> for BoundaryError {
    fn from(error: AppError) -> Self {
        error.with_details(false)
    }
}

impl IntoResponse for BoundaryError {
    fn into_response(self) -> Response {
        let status = self.error.status_code();

        let body = match &self.error {
            AppError::Validation(v) => ErrorBody {
                error: v.to_string(),
                reason: Some(v.reason()),
                details: None,
            },
            e if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!(error = %e, "Internal server error");
                ErrorBody {
                    error: "Internal server error".to_string(),
                    reason: None,
                    details: self.expose_details.then(|| e.to_string()),
                }
            }
            e => ErrorBody {
                error: e.to_string(),
                reason: None,
                details: None,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        BoundaryError::from(self).into_response()
    }
}
