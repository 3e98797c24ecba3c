//! # veritrade-api — HTTP Surface for Invoice Verification
//!
//! Axum service exposing the verification pipeline to callers (humans and
//! the oracle's compute job).
//!
//! ## API Surface
//!
//! | Prefix | Module | Domain |
//! |--------|--------|--------|
//! | `/verification/*` | [`routes::verification`] | Pipeline, audit trail, analytics |
//! | `/health/*` | liveness / readiness probes | Operations |
//! | `/openapi.json` | [`openapi`] | Spec |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → RateLimitMiddleware → Handler
//! ```
//!
//! Health probes and the OpenAPI document are mounted outside the rate
//! limiter so operations tooling is never throttled.

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::extract::{DefaultBodyLimit, State};
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::middleware::rate_limit::RateLimiter;
use crate::state::AppState;

/// Assemble the full application router.
///
/// Body size limit: 256 KiB — verification requests are small; the bounded
/// metadata bag cannot legitimately approach this.
pub fn app(state: AppState) -> Router {
    let limiter = RateLimiter::new(state.config.rate_limit.clone());

    let api = routes::verification::router()
        .layer(DefaultBodyLimit::max(256 * 1024))
        .layer(from_fn(middleware::rate_limit::rate_limit_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(limiter))
        .with_state(state.clone());

    // Health probes and the OpenAPI document stay outside the rate limiter.
    let unlimited = Router::new()
        .route("/health/liveness", get(liveness))
        .route("/health/readiness", get(readiness))
        .merge(openapi::router())
        .with_state(state);

    Router::new().merge(unlimited).merge(api)
}

/// Liveness probe — always returns 200 if the process is running.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe — verifies the audit store answers a cheap aggregate
/// query (covers database connectivity when Postgres is configured).
async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.store.stats().await {
        Ok(_) => (StatusCode::OK, "ready").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "audit store health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "audit store unreachable").into_response()
        }
    }
}
