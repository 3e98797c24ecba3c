//! # Fraud Heuristics Check
//!
//! Combines structural red flags into a PASSED/FAILED verdict plus
//! incremental risk: shell-entity name patterns (a hard failure on their
//! own), round-number amounts at extreme magnitude, and commodity/amount
//! plausibility mismatches. FAILED is a hard invalidation trigger applied by
//! the pipeline.

use veritrade_core::FraudStatus;
use veritrade_policy::FraudPolicy;

use crate::checks::{CheckError, CheckOutcome};

/// Inputs to the fraud heuristics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FraudInput {
    pub exporter_name: String,
    pub buyer_name: String,
    /// Amount in smallest units.
    pub amount: u64,
    pub commodity: String,
}

/// Result of the fraud heuristics.
#[derive(Debug, Clone, PartialEq)]
pub struct FraudReport {
    /// `Passed` or `Failed`; `Error` is assigned by the pipeline when the
    /// check itself fails.
    pub status: FraudStatus,
    pub outcome: CheckOutcome,
}

/// Fraud heuristics seam.
pub trait FraudCheck: Send + Sync {
    fn evaluate(&self, input: &FraudInput) -> Result<FraudReport, CheckError>;
}

/// Default implementation over the injected [`FraudPolicy`].
pub struct HeuristicFraudCheck {
    policy: FraudPolicy,
}

impl HeuristicFraudCheck {
    pub fn new(policy: FraudPolicy) -> Self {
        Self { policy }
    }
}

impl FraudCheck for HeuristicFraudCheck {
    fn evaluate(&self, input: &FraudInput) -> Result<FraudReport, CheckError> {
        let mut outcome = CheckOutcome::default();
        let mut shell_hit = false;
        let mut structural_flags = 0u32;

        for (role, name) in [
            ("exporter", &input.exporter_name),
            ("buyer", &input.buyer_name),
        ] {
            if self.policy.is_shell_name(name) {
                shell_hit = true;
                outcome.details.push(format!(
                    "Fraud indicator: {role} name '{name}' matches a shell-entity pattern"
                ));
                outcome.risk_impact += self.policy.shell_name_impact;
            }
        }

        if self.policy.is_round_extreme_amount(input.amount) {
            structural_flags += 1;
            outcome.details.push(format!(
                "Fraud indicator: round-number amount {} at extreme magnitude",
                input.amount
            ));
            outcome.risk_impact += self.policy.round_amount_impact;
        }

        let cap = self.policy.amount_cap(&input.commodity);
        if input.amount > cap {
            structural_flags += 1;
            outcome.details.push(format!(
                "Fraud indicator: amount {} exceeds plausibility cap {cap} for commodity '{}'",
                input.amount, input.commodity
            ));
            outcome.risk_impact += self.policy.mismatch_impact;
        }

        let status = if shell_hit || structural_flags >= self.policy.structural_flag_limit {
            FraudStatus::Failed
        } else {
            if outcome.details.is_empty() {
                outcome
                    .details
                    .push("Fraud heuristics passed: no structural red flags".to_string());
            }
            FraudStatus::Passed
        };

        Ok(FraudReport { status, outcome })
    }
}
