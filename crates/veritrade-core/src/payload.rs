//! # Compact On-Chain Payload
//!
//! The oracle consumer encodes a reduced verdict on-chain: validity, score,
//! rating, one detail string, and the verification timestamp. The encoded
//! form must stay within a small fixed byte budget, so the score saturates
//! at `u8::MAX` here (and only here — the audit store always records the
//! unclamped value) and the detail string is truncated to fit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rating::CreditRating;
use crate::verdict::VerificationVerdict;

/// Hard upper bound on the encoded payload size.
pub const MAX_PAYLOAD_BYTES: usize = 192;

/// Field separator for the pipe-delimited encoding. Stripped from the
/// detail string so the encoding stays unambiguous.
const SEPARATOR: char = '|';

/// Reduced verdict subset written on-chain by the oracle consumer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OnchainPayload {
    pub is_valid: bool,
    /// Saturated at 255 for the fixed-width encoding.
    pub risk_score: u8,
    pub credit_rating: CreditRating,
    /// First finding from the verdict, truncated to the byte budget.
    pub detail: String,
    pub verified_at: DateTime<Utc>,
}

impl OnchainPayload {
    /// Project a full verdict down to its on-chain subset.
    pub fn from_verdict(verdict: &VerificationVerdict) -> Self {
        let detail = verdict
            .details
            .first()
            .cloned()
            .unwrap_or_else(|| "No findings recorded".to_string());
        let mut payload = Self {
            is_valid: verdict.is_valid,
            risk_score: u8::try_from(verdict.risk_score).unwrap_or(u8::MAX),
            credit_rating: verdict.credit_rating,
            detail,
            verified_at: verdict.verified_at,
        };
        payload.fit_to_budget();
        payload
    }

    /// Encode as pipe-delimited bytes: `valid|score|rating|detail|unix_ts`.
    ///
    /// The result is guaranteed to be at most [`MAX_PAYLOAD_BYTES`] long.
    pub fn encode(&self) -> Vec<u8> {
        format!(
            "{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}{SEPARATOR}{}",
            u8::from(self.is_valid),
            self.risk_score,
            self.credit_rating,
            self.detail,
            self.verified_at.timestamp(),
        )
        .into_bytes()
    }

    /// Truncate the detail string until the encoded form fits the budget.
    fn fit_to_budget(&mut self) {
        self.detail = self
            .detail
            .chars()
            .filter(|c| *c != SEPARATOR)
            .collect::<String>();
        let overhead = self.encode().len() - self.detail.len();
        let allowed = MAX_PAYLOAD_BYTES.saturating_sub(overhead);
        if self.detail.len() > allowed {
            // Truncate on a char boundary.
            let mut cut = allowed;
            while cut > 0 && !self.detail.is_char_boundary(cut) {
                cut -= 1;
            }
            self.detail.truncate(cut);
        }
    }
}
