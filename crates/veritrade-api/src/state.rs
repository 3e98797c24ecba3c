//! # Application State
//!
//! Shared state handed to every handler: the verification pipeline, the
//! audit store it writes through, the immutable-verdict response cache, and
//! the service configuration.

use std::sync::Arc;

use veritrade_audit::{AuditStore, MemoryAuditStore};
use veritrade_engine::VerificationPipeline;
use veritrade_policy::PolicyPack;

use crate::middleware::cache::VerdictCache;
use crate::middleware::rate_limit::RateLimitConfig;

/// Service configuration.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub rate_limit: RateLimitConfig,
}

/// Shared application state. Cheap to clone: everything is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<VerificationPipeline>,
    pub store: Arc<dyn AuditStore>,
    pub verdict_cache: VerdictCache,
    pub config: AppConfig,
}

impl AppState {
    /// Build state over a store and policy pack.
    pub fn new(store: Arc<dyn AuditStore>, policy: &PolicyPack, config: AppConfig) -> Self {
        let pipeline = Arc::new(VerificationPipeline::new(Arc::clone(&store), policy));
        Self {
            pipeline,
            store,
            verdict_cache: VerdictCache::default(),
            config,
        }
    }

    /// In-memory state with the builtin policy pack, for development and
    /// tests.
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryAuditStore::new()),
            &PolicyPack::builtin(),
            AppConfig::default(),
        )
    }
}
