//! # veritrade-engine — Invoice Verification Engine
//!
//! The four check components (document integrity, sanctions screening, fraud
//! heuristics, risk assessment) behind trait seams, and the
//! [`VerificationPipeline`] that fans them out as parallel tasks, aggregates
//! their risk impacts, applies the invalidation rules, derives the credit
//! rating, and persists the verdict through the audit store.
//!
//! Checks are constructed from an injected [`veritrade_policy::PolicyPack`]
//! and are pure functions of their inputs, so repeated runs over the same
//! invoice under the same policy version produce the same score triple —
//! the property the oracle network's consensus depends on.

pub mod checks;
pub mod pipeline;

pub use checks::document::{DocumentCheck, DocumentReport, HashReferenceChecker};
pub use checks::fraud::{FraudCheck, FraudInput, FraudReport, HeuristicFraudCheck};
pub use checks::risk::{RiskCheck, RiskInput, RiskReport, TableRiskAssessor};
pub use checks::sanctions::{
    PolicySanctionsScreen, SanctionsCheck, SanctionsReport, ScreeningInput,
};
pub use checks::{CheckError, CheckOutcome, CHECK_ERROR_PENALTY};
pub use pipeline::{
    smoke_test_request, PipelineConfig, PipelineError, PipelineStage, VerificationPipeline,
    DEFAULT_CHECK_BUDGET,
};
