//! # Document Integrity Check
//!
//! Validates the submitted document hash reference. Contract: never fails
//! for malformed input — a bad reference yields `is_valid = false` with an
//! explanatory finding and a positive risk impact. Side-effect free.

use crate::checks::{CheckError, CheckOutcome};

/// Risk impact of an invalid document reference.
const INVALID_REFERENCE_IMPACT: u32 = 20;

/// Minimum number of hex digits after the `0x` prefix.
const MIN_HEX_DIGITS: usize = 16;

/// Result of the document integrity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentReport {
    pub is_valid: bool,
    pub outcome: CheckOutcome,
}

/// Document integrity check seam.
pub trait DocumentCheck: Send + Sync {
    fn verify(&self, document_hash: &str) -> Result<DocumentReport, CheckError>;
}

/// Default checker: accepts `0x`-prefixed hex references of at least
/// [`MIN_HEX_DIGITS`] digits, the shape produced by the document pipeline's
/// content digests.
#[derive(Debug, Default)]
pub struct HashReferenceChecker;

impl HashReferenceChecker {
    pub fn new() -> Self {
        Self
    }

    fn reject(reason: &str) -> DocumentReport {
        DocumentReport {
            is_valid: false,
            outcome: CheckOutcome {
                details: vec![format!("Document integrity failed: {reason}")],
                risk_impact: INVALID_REFERENCE_IMPACT,
                recommendations: vec!["Resubmit with a valid document hash".to_string()],
            },
        }
    }
}

impl DocumentCheck for HashReferenceChecker {
    fn verify(&self, document_hash: &str) -> Result<DocumentReport, CheckError> {
        let trimmed = document_hash.trim();

        let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        else {
            return Ok(Self::reject("hash reference must start with 0x"));
        };
        if hex.len() < MIN_HEX_DIGITS {
            return Ok(Self::reject(&format!(
                "hash reference has {} hex digits, minimum is {MIN_HEX_DIGITS}",
                hex.len()
            )));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Ok(Self::reject("hash reference contains non-hex characters"));
        }

        Ok(DocumentReport {
            is_valid: true,
            outcome: CheckOutcome::note("Document hash reference verified"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_hash_passes() {
        let report = HashReferenceChecker::new()
            .verify("0x1234567890abcdef")
            .unwrap();
        assert!(report.is_valid);
        assert_eq!(report.outcome.risk_impact, 0);
    }

    #[test]
    fn uppercase_prefix_and_digits_accepted() {
        let report = HashReferenceChecker::new()
            .verify("0XABCDEF0123456789")
            .unwrap();
        assert!(report.is_valid);
    }

    #[test]
    fn missing_prefix_rejected_without_error() {
        let report = HashReferenceChecker::new()
            .verify("1234567890abcdef")
            .unwrap();
        assert!(!report.is_valid);
        assert_eq!(report.outcome.risk_impact, INVALID_REFERENCE_IMPACT);
        assert!(report.outcome.details[0].contains("0x"));
    }

    #[test]
    fn short_hash_rejected() {
        let report = HashReferenceChecker::new().verify("0xabc").unwrap();
        assert!(!report.is_valid);
    }

    #[test]
    fn non_hex_rejected() {
        let report = HashReferenceChecker::new()
            .verify("0x12345678zzzzzzzz")
            .unwrap();
        assert!(!report.is_valid);
        assert!(report.outcome.details[0].contains("non-hex"));
    }

    #[test]
    fn garbage_never_errors() {
        for input in ["", "   ", "0x", "\u{1F600}", "null"] {
            let report = HashReferenceChecker::new().verify(input).unwrap();
            assert!(!report.is_valid, "input {input:?} should be invalid");
        }
    }
}
