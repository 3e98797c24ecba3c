//! # Verdict Response Cache
//!
//! Verdicts are immutable once persisted, so cached entries never need
//! invalidation — the status endpoint can serve a cached verdict for as
//! long as the process lives. The cache is bounded: once full, new entries
//! are skipped rather than evicting (lookups past the bound fall through to
//! the audit store).

use std::sync::Arc;

use dashmap::DashMap;
use uuid::Uuid;

use veritrade_core::VerificationVerdict;

/// Upper bound on cached verdicts.
const MAX_CACHED_VERDICTS: usize = 10_000;

/// Bounded map of verification id → immutable verdict.
#[derive(Clone, Default)]
pub struct VerdictCache {
    entries: Arc<DashMap<Uuid, VerificationVerdict>>,
}

impl VerdictCache {
    pub fn get(&self, verification_id: &Uuid) -> Option<VerificationVerdict> {
        self.entries.get(verification_id).map(|v| v.clone())
    }

    pub fn insert(&self, verdict: VerificationVerdict) {
        if self.entries.len() >= MAX_CACHED_VERDICTS
            && !self.entries.contains_key(&verdict.verification_id)
        {
            tracing::debug!(
                verification_id = %verdict.verification_id,
                "verdict cache full, skipping insert"
            );
            return;
        }
        self.entries.insert(verdict.verification_id, verdict);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
