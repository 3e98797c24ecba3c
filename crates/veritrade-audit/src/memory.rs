//! In-memory audit store for development and tests.

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use veritrade_core::{InvoiceSnapshot, VerificationVerdict};

use crate::{AuditError, AuditStore, VerificationStats};

/// Vec-backed audit store. Rows are only ever pushed, mirroring the
/// append-only contract of the Postgres backend.
#[derive(Debug, Default)]
pub struct MemoryAuditStore {
    snapshots: RwLock<Vec<InvoiceSnapshot>>,
    verdicts: RwLock<Vec<VerificationVerdict>>,
}

impl MemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted snapshots (test helper).
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.read().len()
    }

    /// Number of persisted verdicts (test helper).
    pub fn verdict_count(&self) -> usize {
        self.verdicts.read().len()
    }
}

#[async_trait]
impl AuditStore for MemoryAuditStore {
    async fn save_snapshot(&self, snapshot: &InvoiceSnapshot) -> Result<(), AuditError> {
        self.snapshots.write().push(snapshot.clone());
        Ok(())
    }

    async fn save_verdict(&self, verdict: &VerificationVerdict) -> Result<(), AuditError> {
        let mut verdicts = self.verdicts.write();
        if verdicts
            .iter()
            .any(|v| v.verification_id == verdict.verification_id)
        {
            return Err(AuditError::DuplicateVerdict(verdict.verification_id));
        }
        verdicts.push(verdict.clone());
        Ok(())
    }

    async fn find_verdict(
        &self,
        verification_id: Uuid,
    ) -> Result<Option<VerificationVerdict>, AuditError> {
        Ok(self
            .verdicts
            .read()
            .iter()
            .find(|v| v.verification_id == verification_id)
            .cloned())
    }

    async fn find_history(&self, invoice_id: &str) -> Result<Vec<VerificationVerdict>, AuditError> {
        let mut history: Vec<VerificationVerdict> = self
            .verdicts
            .read()
            .iter()
            .filter(|v| v.invoice_id == invoice_id)
            .cloned()
            .collect();
        history.sort_by(|a, b| b.verified_at.cmp(&a.verified_at));
        Ok(history)
    }

    async fn stats(&self) -> Result<VerificationStats, AuditError> {
        let verdicts = self.verdicts.read();
        if verdicts.is_empty() {
            return Ok(VerificationStats::empty());
        }
        let total = verdicts.len() as u64;
        let valid_count = verdicts.iter().filter(|v| v.is_valid).count() as u64;
        let score_sum: u64 = verdicts.iter().map(|v| u64::from(v.risk_score)).sum();
        let mut rating_distribution: BTreeMap<String, u64> = BTreeMap::new();
        for verdict in verdicts.iter() {
            *rating_distribution
                .entry(verdict.credit_rating.as_str().to_string())
                .or_default() += 1;
        }
        Ok(VerificationStats {
            total,
            valid_count,
            invalid_count: total - valid_count,
            validation_rate: valid_count as f64 * 100.0 / total as f64,
            average_risk_score: score_sum as f64 / total as f64,
            rating_distribution,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use veritrade_core::{CreditRating, VerificationChecks};

    fn verdict(invoice_id: &str, score: u32, offset_secs: i64) -> VerificationVerdict {
        VerificationVerdict {
            verification_id: Uuid::new_v4(),
            invoice_id: invoice_id.to_string(),
            document_hash: "0x1234567890abcdef".to_string(),
            is_valid: score < 80,
            risk_score: score,
            credit_rating: CreditRating::from_score(score),
            checks: VerificationChecks::passing(),
            details: vec![],
            recommendations: vec![],
            processing_time_ms: 1,
            verified_at: Utc::now() + Duration::seconds(offset_secs),
        }
    }

    #[tokio::test]
    async fn verdict_round_trip() {
        let store = MemoryAuditStore::new();
        let v = verdict("INV-1", 20, 0);
        store.save_verdict(&v).await.unwrap();
        let found = store.find_verdict(v.verification_id).await.unwrap();
        assert_eq!(found, Some(v));
    }

    #[tokio::test]
    async fn unknown_verdict_is_none() {
        let store = MemoryAuditStore::new();
        assert_eq!(store.find_verdict(Uuid::new_v4()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_verdict_rejected() {
        let store = MemoryAuditStore::new();
        let v = verdict("INV-1", 20, 0);
        store.save_verdict(&v).await.unwrap();
        assert!(matches!(
            store.save_verdict(&v).await,
            Err(AuditError::DuplicateVerdict(_))
        ));
        assert_eq!(store.verdict_count(), 1);
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let store = MemoryAuditStore::new();
        // Insert out of chronological order.
        store.save_verdict(&verdict("INV-1", 20, 10)).await.unwrap();
        store.save_verdict(&verdict("INV-1", 30, 30)).await.unwrap();
        store.save_verdict(&verdict("INV-1", 25, 20)).await.unwrap();
        store.save_verdict(&verdict("INV-2", 99, 40)).await.unwrap();

        let history = store.find_history("INV-1").await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history
            .windows(2)
            .all(|pair| pair[0].verified_at >= pair[1].verified_at));
        assert!(history.iter().all(|v| v.invoice_id == "INV-1"));
    }

    #[tokio::test]
    async fn history_for_unknown_invoice_is_empty() {
        let store = MemoryAuditStore::new();
        assert!(store.find_history("NOPE").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stats_aggregate() {
        let store = MemoryAuditStore::new();
        store.save_verdict(&verdict("INV-1", 20, 0)).await.unwrap();
        store.save_verdict(&verdict("INV-2", 20, 1)).await.unwrap();
        store.save_verdict(&verdict("INV-3", 95, 2)).await.unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.valid_count, 2);
        assert_eq!(stats.invalid_count, 1);
        assert!((stats.average_risk_score - 45.0).abs() < f64::EPSILON);
        assert!((stats.validation_rate - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(stats.rating_distribution["AA"], 2);
        assert_eq!(stats.rating_distribution["D"], 1);
    }

    #[tokio::test]
    async fn stats_on_empty_store() {
        let store = MemoryAuditStore::new();
        assert_eq!(store.stats().await.unwrap(), VerificationStats::empty());
    }

    #[tokio::test]
    async fn snapshots_are_never_deduplicated() {
        let store = MemoryAuditStore::new();
        let snapshot = InvoiceSnapshot {
            invoice_id: "INV-1".to_string(),
            document_hash: "0xabc123def4567890".to_string(),
            commodity: "Electronics".to_string(),
            amount: "50000000".to_string(),
            supplier_country: "Singapore".to_string(),
            buyer_country: "United States".to_string(),
            exporter_name: "Test Exports Ltd".to_string(),
            buyer_name: "Test Corp USA".to_string(),
            metadata: Default::default(),
            created_at: Utc::now(),
        };
        store.save_snapshot(&snapshot).await.unwrap();
        store.save_snapshot(&snapshot).await.unwrap();
        assert_eq!(store.snapshot_count(), 2);
    }
}
