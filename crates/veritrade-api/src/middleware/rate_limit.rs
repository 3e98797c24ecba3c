//! # Request-Rate Limiting
//!
//! Sliding-window limiter keyed per client. Applied to the verification
//! routes; health probes and the OpenAPI document stay outside it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Extension;
use dashmap::DashMap;

use crate::error::AppError;

/// Rate limiter configuration.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window per client.
    pub max_requests: u32,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 10,
            window: Duration::from_secs(60),
        }
    }
}

/// Sliding-window request counter per client key.
#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<DashMap<String, Vec<Instant>>>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            buckets: Arc::new(DashMap::new()),
            config,
        }
    }

    /// Record a request for `key`. Returns `false` when the client is over
    /// its ceiling for the current window.
    pub fn check(&self, key: &str) -> bool {
        let now = Instant::now();
        let mut window = self.buckets.entry(key.to_string()).or_default();
        window.retain(|seen| now.duration_since(*seen) < self.config.window);
        if window.len() as u32 >= self.config.max_requests {
            return false;
        }
        window.push(now);
        true
    }
}

/// Axum middleware enforcing the rate limit.
pub async fn rate_limit_middleware(
    Extension(limiter): Extension<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let key = client_key(&request);
    if !limiter.check(&key) {
        tracing::debug!(client = %key, "rate limit exceeded");
        return AppError::RateLimited.into_response();
    }
    next.run(request).await
}

/// Client key: first `X-Forwarded-For` hop, else the peer address, else a
/// shared bucket.
fn client_key(request: &Request) -> String {
    if let Some(forwarded) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    if let Some(ConnectInfo(addr)) = request.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    "unknown".to_string()
}
