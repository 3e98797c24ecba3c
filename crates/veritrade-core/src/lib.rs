//! # veritrade-core — Domain Types for Invoice Verification
//!
//! Shared vocabulary for the verification pipeline: the immutable
//! [`InvoiceSnapshot`] recorded per verification attempt, the
//! [`VerificationVerdict`] produced by one pipeline run, the credit rating
//! table, request validation, and the compact on-chain payload codec consumed
//! by the oracle.
//!
//! Everything here is deterministic: for a fixed policy version, identical
//! invoice inputs must map to identical validity, score, and rating, because
//! the oracle network aggregates responses from independent callers and has
//! to reach byte agreement. Only `verification_id` and `verified_at` vary
//! between repeated calls.

pub mod digest;
pub mod invoice;
pub mod payload;
pub mod rating;
pub mod verdict;

pub use digest::sha256_hex;
pub use invoice::{
    InvoiceDetails, InvoiceSnapshot, Metadata, ValidationError, VerificationRequest,
    METADATA_MAX_ENTRIES, METADATA_MAX_KEY_LEN, METADATA_MAX_VALUE_LEN,
};
pub use payload::{OnchainPayload, MAX_PAYLOAD_BYTES};
pub use rating::CreditRating;
pub use verdict::{
    CommodityStatus, EntityStatus, FraudStatus, SanctionsStatus, VerificationChecks,
    VerificationVerdict, BASELINE_RISK_SCORE, ERROR_RISK_SCORE, INVALID_RISK_THRESHOLD,
};
