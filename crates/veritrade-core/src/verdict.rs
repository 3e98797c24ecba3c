//! # Verification Verdict
//!
//! The complete output of one pipeline run: validity, risk score, credit
//! rating, per-check statuses, ordered findings, and advisory
//! recommendations. Verdicts are append-only audit records — never updated
//! or deleted, and `verification_id` is never reused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::digest::sha256_hex;
use crate::rating::CreditRating;

/// Every run starts from this score before any check contributes.
pub const BASELINE_RISK_SCORE: u32 = 10;
/// Final scores at or above this threshold invalidate the verdict.
pub const INVALID_RISK_THRESHOLD: u32 = 80;
/// Score assigned to a synthesized pipeline-failure verdict.
pub const ERROR_RISK_SCORE: u32 = 99;

// ---------------------------------------------------------------------------
// Check statuses
// ---------------------------------------------------------------------------

/// Sanctions screening outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SanctionsStatus {
    Clear,
    Flagged,
    Error,
}

/// Fraud heuristics outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FraudStatus {
    Passed,
    Failed,
    Error,
}

/// Commodity risk outcome. `Rejected` raises risk but does not by itself
/// invalidate the verdict — only the score threshold and the two hard
/// triggers (sanctions, fraud) do.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommodityStatus {
    Approved,
    Rejected,
    Error,
}

/// Entity verification outcome.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityStatus {
    Verified,
    Error,
}

impl SanctionsStatus {
    /// Wire representation, identical to the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            SanctionsStatus::Clear => "CLEAR",
            SanctionsStatus::Flagged => "FLAGGED",
            SanctionsStatus::Error => "ERROR",
        }
    }
}

impl FraudStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FraudStatus::Passed => "PASSED",
            FraudStatus::Failed => "FAILED",
            FraudStatus::Error => "ERROR",
        }
    }
}

impl CommodityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommodityStatus::Approved => "APPROVED",
            CommodityStatus::Rejected => "REJECTED",
            CommodityStatus::Error => "ERROR",
        }
    }
}

impl EntityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityStatus::Verified => "VERIFIED",
            EntityStatus::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for SanctionsStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for FraudStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for CommodityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::fmt::Display for EntityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Checks struct
// ---------------------------------------------------------------------------

/// Per-check statuses carried in every verdict.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationChecks {
    pub document_integrity: bool,
    pub sanctions_check: SanctionsStatus,
    pub fraud_check: FraudStatus,
    pub commodity_check: CommodityStatus,
    pub entity_verification: EntityStatus,
}

impl VerificationChecks {
    /// All checks at their passing defaults.
    pub fn passing() -> Self {
        Self {
            document_integrity: true,
            sanctions_check: SanctionsStatus::Clear,
            fraud_check: FraudStatus::Passed,
            commodity_check: CommodityStatus::Approved,
            entity_verification: EntityStatus::Verified,
        }
    }

    /// All checks in their error state, for a synthesized failure verdict.
    pub fn all_error() -> Self {
        Self {
            document_integrity: false,
            sanctions_check: SanctionsStatus::Error,
            fraud_check: FraudStatus::Error,
            commodity_check: CommodityStatus::Error,
            entity_verification: EntityStatus::Error,
        }
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// The output of one verification pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationVerdict {
    /// Globally unique, generated fresh per call.
    pub verification_id: Uuid,
    pub invoice_id: String,
    pub document_hash: String,
    pub is_valid: bool,
    /// Monotonically accumulated from [`BASELINE_RISK_SCORE`]; unbounded
    /// upward. Clamping happens only in the on-chain payload codec.
    pub risk_score: u32,
    pub credit_rating: CreditRating,
    pub checks: VerificationChecks,
    /// Ordered human-readable findings, append-only during the run.
    pub details: Vec<String>,
    /// Advisory only; never affects validity.
    pub recommendations: Vec<String>,
    pub processing_time_ms: u64,
    pub verified_at: DateTime<Utc>,
}

impl VerificationVerdict {
    /// Whether the final score alone forces invalidity.
    pub fn exceeds_risk_threshold(&self) -> bool {
        self.risk_score >= INVALID_RISK_THRESHOLD
    }

    /// SHA-256 hex digest of the verdict's canonical JSON encoding.
    ///
    /// Stored alongside the record so downstream consumers can verify the
    /// audit row was not altered after the fact.
    pub fn content_digest(&self) -> Result<String, serde_json::Error> {
        let canonical = serde_json::to_vec(self)?;
        Ok(sha256_hex(&canonical))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
