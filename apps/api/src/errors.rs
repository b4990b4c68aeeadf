use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::ingest::IngestError;
use crate::screening::QuotaExceeded;
use crate::sessions::models::InvalidDecision;
use crate::sessions::store::StoreError;

/// Shown to the recruiter whenever the provider quota is exhausted.
pub const QUOTA_GUIDANCE: &str = "The language-model provider quota has been exceeded. \
    Please wait for it to reset (free-tier quotas reset daily) \
    or set FORCE_FALLBACK=true to screen with deterministic results.";

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Content too large: {0}")]
    ContentTooLarge(String),

    #[error("Provider quota exceeded")]
    QuotaExceeded,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<QuotaExceeded> for AppError {
    fn from(_: QuotaExceeded) -> Self {
        AppError::QuotaExceeded
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::NotFound(err.to_string())
    }
}

impl From<InvalidDecision> for AppError {
    fn from(err: InvalidDecision) -> Self {
        AppError::InvalidArgument(err.to_string())
    }
}

impl From<IngestError> for AppError {
    fn from(err: IngestError) -> Self {
        match err {
            IngestError::ContentTooLarge { .. } => AppError::ContentTooLarge(err.to_string()),
            IngestError::UnsupportedFormat(_)
            | IngestError::Unreadable { .. }
            | IngestError::Empty(_) => AppError::UnsupportedFormat(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::InvalidArgument(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_ARGUMENT", msg.clone())
            }
            AppError::UnsupportedFormat(msg) => {
                (StatusCode::BAD_REQUEST, "UNSUPPORTED_FORMAT", msg.clone())
            }
            AppError::ContentTooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "CONTENT_TOO_LARGE",
                msg.clone(),
            ),
            AppError::QuotaExceeded => {
                tracing::warn!("Provider quota exceeded; request aborted");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "QUOTA_EXCEEDED",
                    QUOTA_GUIDANCE.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
