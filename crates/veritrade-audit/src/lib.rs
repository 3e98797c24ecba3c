//! # veritrade-audit — Append-Only Audit Persistence
//!
//! One immutable [`InvoiceSnapshot`] and one immutable
//! [`VerificationVerdict`] per verification attempt. The store exposes no
//! update or delete operations: re-verifying an invoice appends a new
//! verdict, and the full history stays queryable newest-first.
//!
//! ## Backends
//!
//! - [`MemoryAuditStore`] — in-process, for development and tests.
//! - [`PgAuditStore`] — PostgreSQL via SQLx with embedded migrations.
//!
//! The API binary picks Postgres when a database URL is configured and
//! falls back to memory otherwise.

pub mod memory;
pub mod postgres;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use veritrade_core::{InvoiceSnapshot, VerificationVerdict};

pub use memory::MemoryAuditStore;
pub use postgres::PgAuditStore;

/// Errors arising from audit persistence.
#[derive(Error, Debug)]
pub enum AuditError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("record serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Append-only guard: a verdict with this id already exists.
    #[error("verdict {0} already persisted")]
    DuplicateVerdict(Uuid),
}

/// Aggregate analytics over all persisted verdicts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationStats {
    pub total: u64,
    pub valid_count: u64,
    pub invalid_count: u64,
    /// Percentage of valid verdicts, 0.0 when no verdicts exist.
    pub validation_rate: f64,
    /// Mean risk score, 0.0 when no verdicts exist.
    pub average_risk_score: f64,
    /// Verdict count per credit rating label.
    pub rating_distribution: BTreeMap<String, u64>,
}

impl VerificationStats {
    /// Stats for an empty store.
    pub fn empty() -> Self {
        Self {
            total: 0,
            valid_count: 0,
            invalid_count: 0,
            validation_rate: 0.0,
            average_risk_score: 0.0,
            rating_distribution: BTreeMap::new(),
        }
    }
}

/// Append-only audit store.
///
/// Implementations must guarantee that `save_verdict` is the only write per
/// verdict (write-after-aggregate): the orchestrator never writes partial
/// check results, so a failure mid-pipeline can never leave duplicate or
/// torn verdict rows.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Persist an invoice snapshot. Snapshots are never deduplicated.
    async fn save_snapshot(&self, snapshot: &InvoiceSnapshot) -> Result<(), AuditError>;

    /// Persist a verdict. Fails with [`AuditError::DuplicateVerdict`] if the
    /// verification id was already written.
    async fn save_verdict(&self, verdict: &VerificationVerdict) -> Result<(), AuditError>;

    /// Look up a verdict by verification id.
    async fn find_verdict(
        &self,
        verification_id: Uuid,
    ) -> Result<Option<VerificationVerdict>, AuditError>;

    /// All verdicts for an invoice, sorted by `verified_at` descending.
    async fn find_history(&self, invoice_id: &str) -> Result<Vec<VerificationVerdict>, AuditError>;

    /// Aggregate analytics over every persisted verdict.
    async fn stats(&self) -> Result<VerificationStats, AuditError>;
}
