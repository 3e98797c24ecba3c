//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`. Maps
//! validation, lookup, throttling, and pipeline failures to HTTP status
//! codes with JSON bodies. Internal error details are never exposed to
//! clients.
//!
//! Pipeline failures use a dedicated envelope carrying the verification id:
//! the error verdict was persisted before the response, so callers (and the
//! oracle's retry) can fetch it later from the status endpoint.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use veritrade_core::ValidationError;
use veritrade_engine::PipelineError;

/// Structured JSON error response body used by all non-pipeline errors.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Envelope returned when the verification pipeline itself failed. The
/// referenced verdict is persisted and retrievable from the status endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerificationFailureBody {
    pub message: String,
    pub verification_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (400). Input errors never persist a
    /// verdict, so a 400 with this code means nothing was recorded.
    #[error("validation error: {0}")]
    Validation(String),

    /// Request-rate ceiling exceeded (429).
    #[error("rate limit exceeded")]
    RateLimited,

    /// Internal server error (500). Message is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),

    /// The verification pipeline failed (400). A persisted error verdict
    /// exists under `verification_id`.
    #[error("verification {verification_id} failed")]
    VerificationFailed {
        message: String,
        verification_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            Self::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            Self::VerificationFailed { .. } => {
                (StatusCode::BAD_REQUEST, "VERIFICATION_FAILED")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            // Pipeline failures carry their own envelope shape.
            Self::VerificationFailed {
                message,
                verification_id,
                timestamp,
            } => {
                let body = VerificationFailureBody {
                    message,
                    verification_id,
                    timestamp,
                };
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            other => {
                let (status, code) = other.status_and_code();

                // Never expose internal error messages to clients.
                let message = match &other {
                    Self::Internal(_) => "An internal error occurred".to_string(),
                    err => err.to_string(),
                };

                match &other {
                    Self::Internal(_) => {
                        tracing::error!(error = %other, "internal server error");
                    }
                    Self::RateLimited => tracing::debug!("request rejected by rate limiter"),
                    _ => {}
                }

                let body = ErrorBody {
                    error: ErrorDetail {
                        code: code.to_string(),
                        message,
                    },
                };
                (status, Json(body)).into_response()
            }
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Failed {
                verification_id, ..
            } => Self::VerificationFailed {
                message: "Verification service temporarily unavailable".to_string(),
                verification_id,
                timestamp: Utc::now(),
            },
            PipelineError::Persistence(e) => {
                Self::Internal(format!("audit persistence failed: {e}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn response_parts(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        (status, body)
    }

    #[tokio::test]
    async fn not_found_is_404() {
        let (status, body) = response_parts(AppError::NotFound("verification x".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn validation_is_400() {
        let (status, body) = response_parts(AppError::Validation("bad field".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
        assert!(body["error"]["message"].as_str().unwrap().contains("bad field"));
    }

    #[tokio::test]
    async fn rate_limited_is_429() {
        let (status, body) = response_parts(AppError::RateLimited).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["code"], "RATE_LIMITED");
    }

    #[tokio::test]
    async fn internal_hides_details() {
        let (status, body) =
            response_parts(AppError::Internal("db connection refused".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "An internal error occurred");
        assert!(!body.to_string().contains("db connection"));
    }

    #[tokio::test]
    async fn verification_failed_uses_envelope() {
        let id = Uuid::new_v4();
        let (status, body) = response_parts(AppError::VerificationFailed {
            message: "Verification service temporarily unavailable".into(),
            verification_id: id,
            timestamp: Utc::now(),
        })
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["verificationId"], id.to_string());
        assert!(body.get("message").is_some());
        assert!(body.get("timestamp").is_some());
        // The envelope, not the generic error body.
        assert!(body.get("error").is_none());
    }

    #[test]
    fn validation_error_converts() {
        let core_err = ValidationError::EmptyField("invoiceId");
        let app_err = AppError::from(core_err);
        assert!(matches!(app_err, AppError::Validation(_)));
    }
}
