//! # Verification Pipeline
//!
//! Orchestrates one verification run through its stages:
//!
//! ```text
//! RECEIVED → SNAPSHOT_STORED → CHECKS_RUNNING → AGGREGATED → PERSISTED → RESPONDED
//!                 │                  │
//!                 └──────────────────┴──────────────→ FAILED
//! ```
//!
//! The four checks fan out as blocking tasks joined before aggregation, each
//! bounded by the configured time budget. A check that returns an error or
//! times out resolves to its `ERROR` status plus a fixed penalty without
//! aborting its siblings; a panicked check task or a snapshot-persistence
//! failure moves the run to `FAILED`, which synthesizes an error verdict
//! (risk 99, rating ERROR) that is still persisted and surfaced — a failed
//! verification is always observable and auditable, never silently dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use thiserror::Error;
use tokio::task::JoinError;
use tokio::time::error::Elapsed;
use tokio::time::timeout;
use uuid::Uuid;

use veritrade_audit::{AuditError, AuditStore};
use veritrade_core::{
    CommodityStatus, CreditRating, FraudStatus, InvoiceSnapshot, Metadata, SanctionsStatus,
    VerificationChecks, VerificationRequest, VerificationVerdict, BASELINE_RISK_SCORE,
    ERROR_RISK_SCORE, INVALID_RISK_THRESHOLD,
};
use veritrade_policy::PolicyPack;

use crate::checks::document::{DocumentCheck, HashReferenceChecker};
use crate::checks::fraud::{FraudCheck, FraudInput, HeuristicFraudCheck};
use crate::checks::risk::{RiskCheck, RiskInput, TableRiskAssessor};
use crate::checks::sanctions::{PolicySanctionsScreen, SanctionsCheck, ScreeningInput};
use crate::checks::{CheckError, CheckOutcome, CHECK_ERROR_PENALTY};

/// Default per-check execution budget.
pub const DEFAULT_CHECK_BUDGET: Duration = Duration::from_secs(2);

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

/// Pipeline run stages, logged as each transition happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Received,
    SnapshotStored,
    ChecksRunning,
    Aggregated,
    Persisted,
    Responded,
    Failed,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Received => "RECEIVED",
            PipelineStage::SnapshotStored => "SNAPSHOT_STORED",
            PipelineStage::ChecksRunning => "CHECKS_RUNNING",
            PipelineStage::Aggregated => "AGGREGATED",
            PipelineStage::Persisted => "PERSISTED",
            PipelineStage::Responded => "RESPONDED",
            PipelineStage::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Errors and configuration
// ---------------------------------------------------------------------------

/// Pipeline-level failures surfaced to the HTTP layer.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The run reached `FAILED`; the synthesized error verdict was persisted
    /// and is carried here for the caller's error envelope.
    #[error("verification {verification_id} failed: {reason}")]
    Failed {
        verification_id: Uuid,
        reason: String,
        verdict: Box<VerificationVerdict>,
    },

    /// The verdict could not be persisted even after retry. No verdict is
    /// final without a durable audit row.
    #[error("audit persistence failed: {0}")]
    Persistence(#[from] AuditError),
}

/// Pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-check execution budget; a check past it resolves to `ERROR`.
    pub check_budget: Duration,
    /// Version of the policy pack the checks were built from.
    pub policy_version: String,
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The verification orchestrator. Stateless between calls: every run writes
/// freshly generated identifiers, so concurrent calls need no coordination
/// beyond the shared audit store.
pub struct VerificationPipeline {
    store: Arc<dyn AuditStore>,
    document: Arc<dyn DocumentCheck>,
    sanctions: Arc<dyn SanctionsCheck>,
    fraud: Arc<dyn FraudCheck>,
    risk: Arc<dyn RiskCheck>,
    config: PipelineConfig,
}

impl VerificationPipeline {
    /// Build the pipeline with the default policy-backed checks.
    pub fn new(store: Arc<dyn AuditStore>, policy: &PolicyPack) -> Self {
        Self::with_checks(
            store,
            Arc::new(HashReferenceChecker::new()),
            Arc::new(PolicySanctionsScreen::new(&policy.sanctions)),
            Arc::new(HeuristicFraudCheck::new(policy.fraud.clone())),
            Arc::new(TableRiskAssessor::new(policy.risk.clone())),
            PipelineConfig {
                check_budget: DEFAULT_CHECK_BUDGET,
                policy_version: policy.version.clone(),
            },
        )
    }

    /// Build the pipeline from explicit check implementations.
    pub fn with_checks(
        store: Arc<dyn AuditStore>,
        document: Arc<dyn DocumentCheck>,
        sanctions: Arc<dyn SanctionsCheck>,
        fraud: Arc<dyn FraudCheck>,
        risk: Arc<dyn RiskCheck>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            store,
            document,
            sanctions,
            fraud,
            risk,
            config,
        }
    }

    pub fn policy_version(&self) -> &str {
        &self.config.policy_version
    }

    /// Run one verification. The request must already be validated; input
    /// errors belong to the HTTP layer and never reach the pipeline.
    pub async fn verify(
        &self,
        request: VerificationRequest,
    ) -> Result<VerificationVerdict, PipelineError> {
        let started = Instant::now();
        let verification_id = Uuid::new_v4();
        tracing::info!(
            verification_id = %verification_id,
            invoice_id = %request.invoice_id,
            stage = %PipelineStage::Received,
            "verification started"
        );

        // Validation guarantees a parseable amount; a failure here means the
        // caller bypassed it, which is a pipeline fault, not an input error.
        let amount = match request.parsed_amount() {
            Ok(amount) => amount,
            Err(e) => {
                return self
                    .fail(verification_id, &request, started, format!("unvalidated amount: {e}"))
                    .await;
            }
        };

        let snapshot = InvoiceSnapshot::from_request(&request);
        if let Err(e) = self.store.save_snapshot(&snapshot).await {
            return self
                .fail(
                    verification_id,
                    &request,
                    started,
                    format!("snapshot persistence failed: {e}"),
                )
                .await;
        }
        tracing::debug!(
            verification_id = %verification_id,
            stage = %PipelineStage::SnapshotStored,
            "invoice snapshot persisted"
        );

        // Fan out the four checks as bounded blocking tasks. They have no
        // data dependency on one another; aggregation waits for all four.
        tracing::debug!(
            verification_id = %verification_id,
            stage = %PipelineStage::ChecksRunning,
            budget_ms = self.config.check_budget.as_millis() as u64,
            "running checks"
        );
        let budget = self.config.check_budget;

        let document = {
            let check = Arc::clone(&self.document);
            let hash = request.document_hash.clone();
            timeout(budget, tokio::task::spawn_blocking(move || check.verify(&hash)))
        };
        let sanctions = {
            let check = Arc::clone(&self.sanctions);
            let input = ScreeningInput {
                exporter_name: request.invoice_details.exporter_name.clone(),
                buyer_name: request.invoice_details.buyer_name.clone(),
                supplier_country: request.invoice_details.supplier_country.clone(),
                buyer_country: request.invoice_details.buyer_country.clone(),
            };
            timeout(budget, tokio::task::spawn_blocking(move || check.screen(&input)))
        };
        let fraud = {
            let check = Arc::clone(&self.fraud);
            let input = FraudInput {
                exporter_name: request.invoice_details.exporter_name.clone(),
                buyer_name: request.invoice_details.buyer_name.clone(),
                amount,
                commodity: request.invoice_details.commodity.clone(),
            };
            timeout(budget, tokio::task::spawn_blocking(move || check.evaluate(&input)))
        };
        let risk = {
            let check = Arc::clone(&self.risk);
            let input = RiskInput {
                commodity: request.invoice_details.commodity.clone(),
                amount,
                supplier_country: request.invoice_details.supplier_country.clone(),
                buyer_country: request.invoice_details.buyer_country.clone(),
            };
            timeout(budget, tokio::task::spawn_blocking(move || check.assess(&input)))
        };

        let (document, sanctions, fraud, risk) = tokio::join!(document, sanctions, fraud, risk);
        let document = resolve("document", document);
        let sanctions = resolve("sanctions", sanctions);
        let fraud = resolve("fraud", fraud);
        let risk = resolve("risk", risk);

        // A panicked or cancelled check task is fatal to the run.
        let (document, sanctions, fraud, risk) = match (document, sanctions, fraud, risk) {
            (Ok(d), Ok(s), Ok(f), Ok(r)) => (d, s, f, r),
            (Err(reason), ..)
            | (_, Err(reason), ..)
            | (_, _, Err(reason), _)
            | (.., Err(reason)) => {
                return self.fail(verification_id, &request, started, reason).await;
            }
        };

        // Aggregate in fixed component order so the details list — not just
        // the score triple — is reproducible across calls.
        let mut checks = VerificationChecks::passing();
        let mut details: Vec<String> = Vec::new();
        let mut recommendations: Vec<String> = Vec::new();
        let mut risk_score = BASELINE_RISK_SCORE;

        match document {
            Ok(report) => {
                checks.document_integrity = report.is_valid;
                absorb(report.outcome, &mut details, &mut recommendations, &mut risk_score);
            }
            Err(message) => {
                checks.document_integrity = false;
                details.push(message);
                risk_score += CHECK_ERROR_PENALTY;
            }
        }
        match sanctions {
            Ok(report) => {
                checks.sanctions_check = report.status;
                absorb(report.outcome, &mut details, &mut recommendations, &mut risk_score);
            }
            Err(message) => {
                checks.sanctions_check = SanctionsStatus::Error;
                details.push(message);
                risk_score += CHECK_ERROR_PENALTY;
            }
        }
        match fraud {
            Ok(report) => {
                checks.fraud_check = report.status;
                absorb(report.outcome, &mut details, &mut recommendations, &mut risk_score);
            }
            Err(message) => {
                checks.fraud_check = FraudStatus::Error;
                details.push(message);
                risk_score += CHECK_ERROR_PENALTY;
            }
        }
        match risk {
            Ok(report) => {
                checks.commodity_check = report.commodity_status;
                absorb(report.outcome, &mut details, &mut recommendations, &mut risk_score);
            }
            Err(message) => {
                checks.commodity_check = CommodityStatus::Error;
                details.push(message);
                risk_score += CHECK_ERROR_PENALTY;
            }
        }

        // Invalidation rules: the two hard triggers plus the score threshold,
        // all evaluated after every check has contributed.
        let mut is_valid = checks.sanctions_check != SanctionsStatus::Flagged
            && checks.fraud_check != FraudStatus::Failed;
        if risk_score >= INVALID_RISK_THRESHOLD {
            is_valid = false;
            details.push("Transaction rejected due to high risk score".to_string());
        }
        details.push(format!("Policy version {}", self.config.policy_version));

        let credit_rating = CreditRating::from_score(risk_score);
        tracing::debug!(
            verification_id = %verification_id,
            stage = %PipelineStage::Aggregated,
            risk_score,
            credit_rating = %credit_rating,
            is_valid,
            "checks aggregated"
        );

        let verdict = VerificationVerdict {
            verification_id,
            invoice_id: request.invoice_id.clone(),
            document_hash: request.document_hash.clone(),
            is_valid,
            risk_score,
            credit_rating,
            checks,
            details,
            recommendations,
            processing_time_ms: elapsed_ms(started),
            verified_at: Utc::now(),
        };

        self.persist_verdict(&verdict).await?;
        tracing::debug!(
            verification_id = %verification_id,
            stage = %PipelineStage::Persisted,
            "verdict persisted"
        );

        tracing::info!(
            verification_id = %verification_id,
            invoice_id = %verdict.invoice_id,
            stage = %PipelineStage::Responded,
            is_valid = verdict.is_valid,
            risk_score = verdict.risk_score,
            credit_rating = %verdict.credit_rating,
            "verification completed"
        );
        Ok(verdict)
    }

    /// Persist a verdict with one bounded retry. Duplicate ids are an
    /// append-only violation and are never retried.
    async fn persist_verdict(&self, verdict: &VerificationVerdict) -> Result<(), AuditError> {
        match self.store.save_verdict(verdict).await {
            Ok(()) => Ok(()),
            Err(e @ AuditError::DuplicateVerdict(_)) => Err(e),
            Err(first) => {
                tracing::warn!(
                    verification_id = %verdict.verification_id,
                    error = %first,
                    "verdict persistence failed, retrying once"
                );
                self.store.save_verdict(verdict).await.map_err(|e| {
                    tracing::error!(
                        verification_id = %verdict.verification_id,
                        error = %e,
                        "verdict persistence retry failed"
                    );
                    e
                })
            }
        }
    }

    /// Move the run to `FAILED`: synthesize the error verdict, persist it,
    /// and surface the failure with the persisted verdict attached.
    async fn fail(
        &self,
        verification_id: Uuid,
        request: &VerificationRequest,
        started: Instant,
        reason: String,
    ) -> Result<VerificationVerdict, PipelineError> {
        tracing::error!(
            verification_id = %verification_id,
            invoice_id = %request.invoice_id,
            stage = %PipelineStage::Failed,
            reason = %reason,
            "verification pipeline failed"
        );
        let verdict = VerificationVerdict {
            verification_id,
            invoice_id: request.invoice_id.clone(),
            document_hash: request.document_hash.clone(),
            is_valid: false,
            risk_score: ERROR_RISK_SCORE,
            credit_rating: CreditRating::Error,
            checks: VerificationChecks::all_error(),
            details: vec![format!("Verification service error: {reason}")],
            recommendations: vec!["Manual review required".to_string()],
            processing_time_ms: elapsed_ms(started),
            verified_at: Utc::now(),
        };
        self.persist_verdict(&verdict).await?;
        Err(PipelineError::Failed {
            verification_id,
            reason,
            verdict: Box::new(verdict),
        })
    }
}

/// Collapse the timeout/join/check result layers: `Err(reason)` is fatal to
/// the run, `Ok(Err(message))` is a contained component error, `Ok(Ok(t))`
/// is a report.
#[allow(clippy::type_complexity)]
fn resolve<T>(
    name: &str,
    result: Result<Result<Result<T, CheckError>, JoinError>, Elapsed>,
) -> Result<Result<T, String>, String> {
    match result {
        Err(_) => Ok(Err(format!("{name} check exceeded its time budget"))),
        Ok(Err(join_err)) if join_err.is_panic() => Err(format!("{name} check panicked")),
        Ok(Err(_)) => Err(format!("{name} check task was cancelled")),
        Ok(Ok(Err(e))) => Ok(Err(format!("{name} check error: {e}"))),
        Ok(Ok(Ok(report))) => Ok(Ok(report)),
    }
}

/// Fold one check outcome into the aggregation accumulators.
fn absorb(
    outcome: CheckOutcome,
    details: &mut Vec<String>,
    recommendations: &mut Vec<String>,
    risk_score: &mut u32,
) {
    details.extend(outcome.details);
    recommendations.extend(outcome.recommendations);
    *risk_score += outcome.risk_impact;
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// The fixed synthetic invoice used by the smoke-test endpoint.
pub fn smoke_test_request() -> VerificationRequest {
    let mut metadata = Metadata::new();
    metadata.insert("test".to_string(), serde_json::Value::Bool(true));
    VerificationRequest {
        invoice_id: "TEST-001".to_string(),
        document_hash: "0x1234567890abcdef".to_string(),
        invoice_details: veritrade_core::InvoiceDetails {
            commodity: "Electronics".to_string(),
            amount: "50000000".to_string(),
            supplier_country: "Singapore".to_string(),
            buyer_country: "United States".to_string(),
            exporter_name: "Test Exports Ltd".to_string(),
            buyer_name: "Test Corp USA".to_string(),
        },
        metadata,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use veritrade_audit::{MemoryAuditStore, VerificationStats};
    use veritrade_core::InvoiceDetails;

    use crate::checks::document::DocumentReport;
    use crate::checks::fraud::FraudReport;
    use crate::checks::sanctions::SanctionsReport;

    fn pipeline_with_store(store: Arc<dyn AuditStore>) -> VerificationPipeline {
        VerificationPipeline::new(store, &PolicyPack::builtin())
    }

    fn request(
        invoice_id: &str,
        exporter: &str,
        commodity: &str,
        amount: &str,
        supplier: &str,
        buyer_country: &str,
    ) -> VerificationRequest {
        VerificationRequest {
            invoice_id: invoice_id.to_string(),
            document_hash: "0x1234567890abcdef".to_string(),
            invoice_details: InvoiceDetails {
                commodity: commodity.to_string(),
                amount: amount.to_string(),
                supplier_country: supplier.to_string(),
                buyer_country: buyer_country.to_string(),
                exporter_name: exporter.to_string(),
                buyer_name: "Test Corp USA".to_string(),
            },
            metadata: Metadata::new(),
        }
    }

    /// Synthetic persistence failure, without reaching into a real backend.
    fn audit_failure() -> AuditError {
        match serde_json::from_str::<u32>("not a number") {
            Err(e) => AuditError::Serialization(e),
            Ok(_) => unreachable!("parse must fail"),
        }
    }

    // -- Store fakes ---------------------------------------------------------

    /// Fails every snapshot write; verdict writes pass through.
    struct FailingSnapshotStore {
        inner: MemoryAuditStore,
    }

    #[async_trait]
    impl AuditStore for FailingSnapshotStore {
        async fn save_snapshot(&self, _snapshot: &InvoiceSnapshot) -> Result<(), AuditError> {
            Err(audit_failure())
        }
        async fn save_verdict(&self, verdict: &VerificationVerdict) -> Result<(), AuditError> {
            self.inner.save_verdict(verdict).await
        }
        async fn find_verdict(
            &self,
            verification_id: Uuid,
        ) -> Result<Option<VerificationVerdict>, AuditError> {
            self.inner.find_verdict(verification_id).await
        }
        async fn find_history(
            &self,
            invoice_id: &str,
        ) -> Result<Vec<VerificationVerdict>, AuditError> {
            self.inner.find_history(invoice_id).await
        }
        async fn stats(&self) -> Result<VerificationStats, AuditError> {
            self.inner.stats().await
        }
    }

    /// Fails every verdict write.
    struct FailingVerdictStore {
        inner: MemoryAuditStore,
    }

    #[async_trait]
    impl AuditStore for FailingVerdictStore {
        async fn save_snapshot(&self, snapshot: &InvoiceSnapshot) -> Result<(), AuditError> {
            self.inner.save_snapshot(snapshot).await
        }
        async fn save_verdict(&self, _verdict: &VerificationVerdict) -> Result<(), AuditError> {
            Err(audit_failure())
        }
        async fn find_verdict(
            &self,
            verification_id: Uuid,
        ) -> Result<Option<VerificationVerdict>, AuditError> {
            self.inner.find_verdict(verification_id).await
        }
        async fn find_history(
            &self,
            invoice_id: &str,
        ) -> Result<Vec<VerificationVerdict>, AuditError> {
            self.inner.find_history(invoice_id).await
        }
        async fn stats(&self) -> Result<VerificationStats, AuditError> {
            self.inner.stats().await
        }
    }

    // -- Check fakes ---------------------------------------------------------

    struct PanickingDocument;
    impl DocumentCheck for PanickingDocument {
        fn verify(&self, _document_hash: &str) -> Result<DocumentReport, CheckError> {
            panic!("document backend corrupted");
        }
    }

    struct ErroringSanctions;
    impl SanctionsCheck for ErroringSanctions {
        fn screen(&self, _input: &ScreeningInput) -> Result<SanctionsReport, CheckError> {
            Err(CheckError::Failed("sanctions feed unavailable".to_string()))
        }
    }

    struct SlowFraud;
    impl FraudCheck for SlowFraud {
        fn evaluate(&self, _input: &FraudInput) -> Result<FraudReport, CheckError> {
            std::thread::sleep(Duration::from_millis(300));
            Ok(FraudReport {
                status: FraudStatus::Passed,
                outcome: CheckOutcome::note("too late"),
            })
        }
    }

    /// Pipeline with one check swapped for a fake.
    fn pipeline_with(
        store: Arc<dyn AuditStore>,
        document: Option<Arc<dyn DocumentCheck>>,
        sanctions: Option<Arc<dyn SanctionsCheck>>,
        fraud: Option<Arc<dyn FraudCheck>>,
        budget: Duration,
    ) -> VerificationPipeline {
        let policy = PolicyPack::builtin();
        VerificationPipeline::with_checks(
            store,
            document.unwrap_or_else(|| Arc::new(HashReferenceChecker::new())),
            sanctions.unwrap_or_else(|| Arc::new(PolicySanctionsScreen::new(&policy.sanctions))),
            fraud.unwrap_or_else(|| Arc::new(HeuristicFraudCheck::new(policy.fraud.clone()))),
            Arc::new(TableRiskAssessor::new(policy.risk.clone())),
            PipelineConfig {
                check_budget: budget,
                policy_version: policy.version.clone(),
            },
        )
    }

    // -- Scenarios -----------------------------------------------------------

    #[tokio::test]
    async fn fixture_invoice_is_valid_and_highly_rated() {
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = pipeline_with_store(store.clone());

        let verdict = pipeline.verify(smoke_test_request()).await.unwrap();

        assert!(verdict.is_valid);
        assert_eq!(verdict.risk_score, 20);
        assert_eq!(verdict.credit_rating, CreditRating::Aa);
        assert_eq!(verdict.checks, VerificationChecks::passing());
        assert!(verdict
            .details
            .iter()
            .any(|d| d.contains("Policy version builtin-2026.08")));
        assert_eq!(store.snapshot_count(), 1);
        assert_eq!(store.verdict_count(), 1);
    }

    #[tokio::test]
    async fn repeated_runs_are_deterministic_with_fresh_ids() {
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = pipeline_with_store(store.clone());

        let first = pipeline.verify(smoke_test_request()).await.unwrap();
        let second = pipeline.verify(smoke_test_request()).await.unwrap();

        assert_ne!(first.verification_id, second.verification_id);
        assert_eq!(first.is_valid, second.is_valid);
        assert_eq!(first.risk_score, second.risk_score);
        assert_eq!(first.credit_rating, second.credit_rating);
        assert_eq!(first.details, second.details);
        assert_eq!(store.verdict_count(), 2);
        assert_eq!(store.snapshot_count(), 2);
    }

    #[tokio::test]
    async fn sanctioned_exporter_invalidates_regardless_of_score() {
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = pipeline_with_store(store);

        let verdict = pipeline
            .verify(request(
                "INV-SANC",
                "Vostok Energy Trading",
                "Electronics",
                "50000000",
                "Singapore",
                "United States",
            ))
            .await
            .unwrap();

        assert_eq!(verdict.checks.sanctions_check, SanctionsStatus::Flagged);
        assert!(!verdict.is_valid);
        // Low score elsewhere does not rescue a flagged transaction.
        assert!(verdict.risk_score < INVALID_RISK_THRESHOLD);
    }

    #[tokio::test]
    async fn shell_exporter_fails_fraud_and_invalidates() {
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = pipeline_with_store(store);

        let verdict = pipeline
            .verify(request(
                "INV-FRAUD",
                "Pacific Shell Holdings",
                "Electronics",
                "50000000",
                "Singapore",
                "United States",
            ))
            .await
            .unwrap();

        assert_eq!(verdict.checks.fraud_check, FraudStatus::Failed);
        assert_eq!(verdict.checks.sanctions_check, SanctionsStatus::Clear);
        assert!(!verdict.is_valid);
        assert!(verdict.risk_score < INVALID_RISK_THRESHOLD);
    }

    #[tokio::test]
    async fn score_threshold_invalidates_even_when_checks_pass() {
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = pipeline_with_store(store);

        // Prohibited commodity + high-risk corridor + huge odd amount over
        // the plausibility cap: no hard trigger fires, the score does.
        let verdict = pipeline
            .verify(request(
                "INV-RISK",
                "Test Exports Ltd",
                "Arms",
                "2000000000001",
                "Russia",
                "Venezuela",
            ))
            .await
            .unwrap();

        assert_eq!(verdict.checks.sanctions_check, SanctionsStatus::Clear);
        assert_eq!(verdict.checks.fraud_check, FraudStatus::Passed);
        assert_eq!(verdict.checks.commodity_check, CommodityStatus::Rejected);
        assert_eq!(verdict.risk_score, 105);
        assert_eq!(verdict.credit_rating, CreditRating::D);
        assert!(!verdict.is_valid);
        assert!(verdict
            .details
            .iter()
            .any(|d| d == "Transaction rejected due to high risk score"));
        assert!(!verdict.recommendations.is_empty());
    }

    #[tokio::test]
    async fn malformed_document_hash_scores_without_failing() {
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = pipeline_with_store(store);

        let mut req = smoke_test_request();
        req.document_hash = "not-a-hash".to_string();
        let verdict = pipeline.verify(req).await.unwrap();

        assert!(!verdict.checks.document_integrity);
        // Invalid document raises risk but is not a hard trigger.
        assert!(verdict.is_valid);
        assert_eq!(verdict.risk_score, 40);
        assert_eq!(verdict.credit_rating, CreditRating::A);
    }

    #[tokio::test]
    async fn erroring_check_resolves_to_error_status_with_penalty() {
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = pipeline_with(
            store.clone(),
            None,
            Some(Arc::new(ErroringSanctions)),
            None,
            DEFAULT_CHECK_BUDGET,
        );

        let verdict = pipeline.verify(smoke_test_request()).await.unwrap();

        assert_eq!(verdict.checks.sanctions_check, SanctionsStatus::Error);
        // Baseline 10 + penalty 25 + commodity 5 + amount 5.
        assert_eq!(verdict.risk_score, 45);
        // Sibling checks still contributed.
        assert!(verdict.checks.document_integrity);
        assert_eq!(verdict.checks.fraud_check, FraudStatus::Passed);
        assert!(verdict
            .details
            .iter()
            .any(|d| d.contains("sanctions feed unavailable")));
        assert_eq!(store.verdict_count(), 1);
    }

    #[tokio::test]
    async fn slow_check_exceeds_budget_and_resolves_to_error() {
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = pipeline_with(
            store,
            None,
            None,
            Some(Arc::new(SlowFraud)),
            Duration::from_millis(50),
        );

        let verdict = pipeline.verify(smoke_test_request()).await.unwrap();

        assert_eq!(verdict.checks.fraud_check, FraudStatus::Error);
        assert!(verdict
            .details
            .iter()
            .any(|d| d.contains("exceeded its time budget")));
        assert_eq!(verdict.risk_score, 20 + CHECK_ERROR_PENALTY);
    }

    #[tokio::test]
    async fn panicking_check_fails_pipeline_with_persisted_error_verdict() {
        let store = Arc::new(MemoryAuditStore::new());
        let pipeline = pipeline_with(
            store.clone(),
            Some(Arc::new(PanickingDocument)),
            None,
            None,
            DEFAULT_CHECK_BUDGET,
        );

        let err = pipeline.verify(smoke_test_request()).await.unwrap_err();
        let PipelineError::Failed {
            verification_id,
            verdict,
            ..
        } = err
        else {
            panic!("expected Failed");
        };

        assert_eq!(verdict.risk_score, ERROR_RISK_SCORE);
        assert_eq!(verdict.credit_rating, CreditRating::Error);
        assert_eq!(verdict.checks, VerificationChecks::all_error());
        assert!(!verdict.is_valid);
        assert_eq!(verdict.recommendations, vec!["Manual review required"]);

        // The failure verdict is durably recorded and retrievable.
        let persisted = store.find_verdict(verification_id).await.unwrap();
        assert_eq!(persisted.as_ref(), Some(verdict.as_ref()));
    }

    #[tokio::test]
    async fn snapshot_persistence_failure_fails_pipeline() {
        let store = Arc::new(FailingSnapshotStore {
            inner: MemoryAuditStore::new(),
        });
        let pipeline = pipeline_with_store(store.clone());

        let err = pipeline.verify(smoke_test_request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Failed { .. }));
        // The error verdict still landed in the store.
        assert_eq!(store.inner.verdict_count(), 1);
        assert_eq!(store.inner.snapshot_count(), 0);
    }

    #[tokio::test]
    async fn verdict_persistence_failure_escalates() {
        let store = Arc::new(FailingVerdictStore {
            inner: MemoryAuditStore::new(),
        });
        let pipeline = pipeline_with_store(store);

        let err = pipeline.verify(smoke_test_request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Persistence(_)));
    }
}
