//! HTTP middleware: request-rate limiting and the immutable-verdict
//! response cache.

pub mod cache;
pub mod rate_limit;
