//! Error types: the pipeline taxonomy and its HTTP mapping.

use axum::{
    Json,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::infrastructure::provider::ProviderError;
use crate::infrastructure::store::StoreError;

/// Errors raised by pipeline components.
///
/// Rate-limit exhaustion and lock contention are not errors: they are
/// ordinary outcomes reported by the worker.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The backing store could not be reached or rejected the operation.
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    /// Search or download against the upstream provider failed.
    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    /// The downloaded payload is not a usable image.
    #[error("invalid image content: {0}")]
    InvalidContent(String),

    /// A value read from the store could not be decoded.
    #[error("corrupt store payload: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The vocabulary database could not be read.
    #[error("vocabulary source error: {0}")]
    Vocabulary(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<sqlx::Error> for PipelineError {
    fn from(e: sqlx::Error) -> Self {
        PipelineError::Vocabulary(e.to_string())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorInfo,
}

/// Error payload embedded in JSON responses.
#[derive(Debug, Serialize)]
pub struct ErrorInfo {
    pub code: &'static str,
    pub message: String,
    pub details: Value,
}

/// Errors surfaced at the HTTP boundary.
#[derive(Debug)]
pub enum AppError {
    Validation { message: String, details: Value },
    NotFound { message: String, details: Value },
    Unauthorized { message: String, details: Value },
    Unavailable { message: String, details: Value },
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }
    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }
    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }
    pub fn unavailable(message: impl Into<String>, details: Value) -> Self {
        Self::Unavailable {
            message: message.into(),
            details,
        }
    }
    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    fn parts(self) -> (StatusCode, &'static str, String, Value) {
        match self {
            AppError::Validation { message, details } => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                message,
                details,
            ),
            AppError::NotFound { message, details } => {
                (StatusCode::NOT_FOUND, "not_found", message, details)
            }
            AppError::Unauthorized { message, details } => {
                (StatusCode::UNAUTHORIZED, "unauthorized", message, details)
            }
            AppError::Unavailable { message, details } => (
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
                message,
                details,
            ),
            AppError::Internal { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                message,
                details,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let unauthorized = matches!(self, AppError::Unauthorized { .. });
        let (status, code, message, details) = self.parts();

        let body = ErrorBody {
            error: ErrorInfo {
                code,
                message,
                details,
            },
        };

        if unauthorized {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], Json(body)).into_response()
        } else {
            (status, Json(body)).into_response()
        }
    }
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::StoreUnavailable(inner) => {
                tracing::error!("Store error: {}", inner);
                AppError::unavailable("Image store unavailable", json!({}))
            }
            PipelineError::InvalidInput(reason) => {
                AppError::bad_request("Invalid input", json!({ "reason": reason }))
            }
            other => {
                tracing::error!("Pipeline error: {}", other);
                AppError::internal("Internal error", json!({}))
            }
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        AppError::bad_request("Validation failed", json!(e))
    }
}
