//! # Verification API Endpoints
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | `POST` | `/verification/verify-documents` | `verify_documents` |
//! | `GET` | `/verification/status/:verification_id` | `verification_status` |
//! | `GET` | `/verification/history/:invoice_id` | `verification_history` |
//! | `POST` | `/verification/test-verify` | `test_verification` |
//! | `GET` | `/verification/stats` | `verification_stats` |
//!
//! The verify endpoint is fire-and-audit: the pipeline runs on its own task
//! so an abandoned client connection cannot cancel persistence mid-run —
//! the verdict still lands in the audit store for history and the oracle's
//! retry.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use veritrade_core::{VerificationRequest, VerificationVerdict};
use veritrade_engine::{smoke_test_request, PipelineError};

use crate::error::AppError;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Wire shape of a verification request, for the OpenAPI document. The
/// handler deserializes into [`VerificationRequest`] directly.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyDocumentsBody {
    pub invoice_id: String,
    pub document_hash: String,
    #[schema(value_type = Object)]
    pub invoice_details: serde_json::Value,
    #[schema(value_type = Object)]
    pub metadata: serde_json::Value,
}

/// Verdict plus the caller-side processing-time annotation.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerdictResponse {
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub verdict: VerificationVerdict,
    /// Wall-clock handler time, e.g. "12ms".
    pub processing_time: String,
}

impl VerdictResponse {
    fn new(verdict: VerificationVerdict, started: Instant) -> Self {
        Self {
            verdict,
            processing_time: format!("{}ms", started.elapsed().as_millis()),
        }
    }
}

/// Verification history for one invoice, newest-first.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryResponse {
    pub invoice_id: String,
    #[schema(value_type = Vec<Object>)]
    pub verdicts: Vec<VerificationVerdict>,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Build the verification router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/verification/verify-documents", post(verify_documents))
        .route("/verification/status/:verification_id", get(verification_status))
        .route("/verification/history/:invoice_id", get(verification_history))
        .route("/verification/test-verify", post(test_verification))
        .route("/verification/stats", get(verification_stats))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /verification/verify-documents — Verify a trade-finance invoice.
#[utoipa::path(
    post,
    path = "/verification/verify-documents",
    request_body = VerifyDocumentsBody,
    responses(
        (status = 200, description = "Verification completed", body = VerdictResponse),
        (status = 400, description = "Invalid request, or pipeline failure (see envelope)", body = crate::error::VerificationFailureBody),
        (status = 429, description = "Rate limit exceeded", body = crate::error::ErrorBody),
    ),
    tag = "verification"
)]
async fn verify_documents(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<VerificationRequest>,
) -> Result<impl IntoResponse, AppError> {
    let started = Instant::now();
    request.validate()?;
    tracing::info!(invoice_id = %request.invoice_id, "document verification request");

    run_pipeline(&state, request, started).await
}

/// POST /verification/test-verify — Run the pipeline against the fixed
/// synthetic fixture invoice, for smoke-testing.
#[utoipa::path(
    post,
    path = "/verification/test-verify",
    responses(
        (status = 200, description = "Smoke-test verification completed", body = VerdictResponse),
    ),
    tag = "verification"
)]
async fn test_verification(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let started = Instant::now();
    tracing::info!("smoke-test verification request");
    run_pipeline(&state, smoke_test_request(), started).await
}

/// Run the pipeline on a detached task and shape the response. Both the
/// success and the failure verdict seed the response cache — either way the
/// record is immutable and queryable.
async fn run_pipeline(
    state: &AppState,
    request: VerificationRequest,
    started: Instant,
) -> Result<Json<VerdictResponse>, AppError> {
    let pipeline = Arc::clone(&state.pipeline);
    let handle = tokio::spawn(async move { pipeline.verify(request).await });

    let verdict = match handle.await {
        Err(join_err) => {
            return Err(AppError::Internal(format!(
                "verification task failed: {join_err}"
            )));
        }
        Ok(Ok(verdict)) => verdict,
        Ok(Err(PipelineError::Failed {
            verification_id,
            verdict,
            ..
        })) => {
            state.verdict_cache.insert(*verdict);
            return Err(AppError::VerificationFailed {
                message: "Verification service temporarily unavailable".to_string(),
                verification_id,
                timestamp: Utc::now(),
            });
        }
        Ok(Err(PipelineError::Persistence(e))) => {
            return Err(AppError::Internal(format!("audit persistence failed: {e}")));
        }
    };

    state.verdict_cache.insert(verdict.clone());
    Ok(Json(VerdictResponse::new(verdict, started)))
}

/// GET /verification/status/:verification_id — Fetch a persisted verdict.
#[utoipa::path(
    get,
    path = "/verification/status/{verification_id}",
    params(("verification_id" = Uuid, Path, description = "Verification UUID")),
    responses(
        (status = 200, description = "Persisted verdict"),
        (status = 404, description = "Unknown verification id", body = crate::error::ErrorBody),
    ),
    tag = "verification"
)]
async fn verification_status(
    State(state): State<AppState>,
    Path(verification_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    // Verdicts are immutable, so a cache hit is always current.
    if let Some(verdict) = state.verdict_cache.get(&verification_id) {
        tracing::debug!(%verification_id, "verdict served from cache");
        return Ok(Json(verdict));
    }

    let verdict = state
        .store
        .find_verdict(verification_id)
        .await
        .map_err(|e| AppError::Internal(format!("audit store lookup failed: {e}")))?
        .ok_or_else(|| {
            AppError::NotFound(format!("verification record not found: {verification_id}"))
        })?;

    state.verdict_cache.insert(verdict.clone());
    Ok(Json(verdict))
}

/// GET /verification/history/:invoice_id — All verdicts for an invoice.
#[utoipa::path(
    get,
    path = "/verification/history/{invoice_id}",
    params(("invoice_id" = String, Path, description = "External invoice identifier")),
    responses(
        (status = 200, description = "Verdicts newest-first", body = HistoryResponse),
    ),
    tag = "verification"
)]
async fn verification_history(
    State(state): State<AppState>,
    Path(invoice_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let verdicts = state
        .store
        .find_history(&invoice_id)
        .await
        .map_err(|e| AppError::Internal(format!("audit store lookup failed: {e}")))?;

    let total = verdicts.len();
    Ok(Json(HistoryResponse {
        invoice_id,
        verdicts,
        total,
    }))
}

/// GET /verification/stats — Aggregate analytics over all verdicts.
#[utoipa::path(
    get,
    path = "/verification/stats",
    responses(
        (status = 200, description = "Aggregate verification statistics"),
    ),
    tag = "verification"
)]
async fn verification_stats(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let stats = state
        .store
        .stats()
        .await
        .map_err(|e| AppError::Internal(format!("audit store aggregation failed: {e}")))?;
    Ok(Json(stats))
}
