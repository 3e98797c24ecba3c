//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented verification routes into a single
//! OpenAPI spec served at `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

/// Assembled OpenAPI spec for the verification surface.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Veritrade Verification API",
        version = "0.3.2",
        description = "Deterministic trade-finance invoice verification for tokenized investment.\n\nProvides:\n- **Document verification** with sanctions screening, fraud heuristics, and commodity/corridor/amount risk assessment\n- **Immutable audit trail** of every verification attempt, with per-invoice history\n- **Aggregate analytics** over all verdicts\n\nVerdicts are deterministic for a fixed policy version: identical invoice inputs yield identical validity, risk score, and credit rating across repeated calls, as required by the consuming oracle network.",
        license(name = "BUSL-1.1")
    ),
    servers(
        (url = "http://localhost:3001", description = "Local development server"),
    ),
    paths(
        crate::routes::verification::verify_documents,
        crate::routes::verification::verification_status,
        crate::routes::verification::verification_history,
        crate::routes::verification::test_verification,
        crate::routes::verification::verification_stats,
    ),
    components(schemas(
        crate::routes::verification::VerifyDocumentsBody,
        crate::routes::verification::VerdictResponse,
        crate::routes::verification::HistoryResponse,
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::error::VerificationFailureBody,
    )),
    tags(
        (name = "verification", description = "Invoice verification pipeline and audit trail"),
    )
)]
pub struct ApiDoc;

/// Router serving the OpenAPI document.
pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(serve_openapi))
}

async fn serve_openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
