//! # Credit Rating Derivation
//!
//! The rating is a pure function of the final risk score over fixed
//! threshold bands. The oracle network compares ratings byte-for-byte across
//! independent callers, so the band edges are load-bearing: a score of 15 is
//! AAA, 16 is AA, and so on down the table.

use serde::{Deserialize, Serialize};

/// Coarse-grained letter grade derived from the final risk score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CreditRating {
    #[serde(rename = "AAA")]
    Aaa,
    #[serde(rename = "AA")]
    Aa,
    #[serde(rename = "A")]
    A,
    #[serde(rename = "BBB")]
    Bbb,
    #[serde(rename = "BB")]
    Bb,
    #[serde(rename = "B")]
    B,
    #[serde(rename = "D")]
    D,
    /// Forced on pipeline-level failure, regardless of score.
    #[serde(rename = "ERROR")]
    Error,
}

/// Inclusive upper score bound per rating band; scores above the last band
/// are rated D.
const RATING_BANDS: &[(u32, CreditRating)] = &[
    (15, CreditRating::Aaa),
    (25, CreditRating::Aa),
    (40, CreditRating::A),
    (55, CreditRating::Bbb),
    (70, CreditRating::Bb),
    (85, CreditRating::B),
];

impl CreditRating {
    /// Derive the rating for a final risk score.
    pub fn from_score(score: u32) -> Self {
        for &(ceiling, rating) in RATING_BANDS {
            if score <= ceiling {
                return rating;
            }
        }
        CreditRating::D
    }

    /// Wire representation, identical to the serde rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            CreditRating::Aaa => "AAA",
            CreditRating::Aa => "AA",
            CreditRating::A => "A",
            CreditRating::Bbb => "BBB",
            CreditRating::Bb => "BB",
            CreditRating::B => "B",
            CreditRating::D => "D",
            CreditRating::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for CreditRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
