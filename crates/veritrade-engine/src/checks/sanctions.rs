//! # Sanctions Screening Check
//!
//! Screens both party names and both corridor countries against the
//! injected sanctions policy. Any hit flags the transaction — FLAGGED is a
//! hard invalidation trigger applied by the pipeline during aggregation.

use veritrade_core::SanctionsStatus;
use veritrade_policy::{MatchType, SanctionsPolicy, SanctionsScreener};

use crate::checks::{CheckError, CheckOutcome};

/// Parties and countries submitted for screening.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScreeningInput {
    pub exporter_name: String,
    pub buyer_name: String,
    pub supplier_country: String,
    pub buyer_country: String,
}

/// Result of sanctions screening.
#[derive(Debug, Clone, PartialEq)]
pub struct SanctionsReport {
    /// `Clear` or `Flagged`; the `Error` status is assigned by the pipeline
    /// when the check itself fails.
    pub status: SanctionsStatus,
    pub outcome: CheckOutcome,
}

/// Sanctions screening seam.
pub trait SanctionsCheck: Send + Sync {
    fn screen(&self, input: &ScreeningInput) -> Result<SanctionsReport, CheckError>;
}

/// Default implementation backed by a [`SanctionsScreener`].
pub struct PolicySanctionsScreen {
    screener: SanctionsScreener,
    name_hit_impact: u32,
    country_hit_impact: u32,
}

impl PolicySanctionsScreen {
    pub fn new(policy: &SanctionsPolicy) -> Self {
        Self {
            screener: SanctionsScreener::new(policy),
            name_hit_impact: policy.name_hit_impact,
            country_hit_impact: policy.country_hit_impact,
        }
    }

    fn screen_party(&self, role: &str, name: &str, outcome: &mut CheckOutcome) -> bool {
        match self.screener.screen_name(name) {
            Some(hit) => {
                let kind = match hit.match_type {
                    MatchType::ExactName => "exact",
                    MatchType::FuzzyName => "fuzzy",
                };
                outcome.details.push(format!(
                    "Sanctions hit: {role} '{name}' matches listed entity '{}' ({kind}, score {:.2})",
                    hit.listed_name, hit.score
                ));
                outcome.risk_impact += self.name_hit_impact;
                true
            }
            None => false,
        }
    }

    fn screen_corridor_country(
        &self,
        role: &str,
        country: &str,
        outcome: &mut CheckOutcome,
    ) -> bool {
        if self.screener.screen_country(country) {
            outcome
                .details
                .push(format!("Sanctions hit: {role} '{country}' is embargoed"));
            outcome.risk_impact += self.country_hit_impact;
            true
        } else {
            false
        }
    }
}

impl SanctionsCheck for PolicySanctionsScreen {
    fn screen(&self, input: &ScreeningInput) -> Result<SanctionsReport, CheckError> {
        let mut outcome = CheckOutcome::default();
        let mut flagged = false;

        flagged |= self.screen_party("exporter", &input.exporter_name, &mut outcome);
        flagged |= self.screen_party("buyer", &input.buyer_name, &mut outcome);
        flagged |=
            self.screen_corridor_country("supplier country", &input.supplier_country, &mut outcome);
        flagged |=
            self.screen_corridor_country("buyer country", &input.buyer_country, &mut outcome);

        let status = if flagged {
            SanctionsStatus::Flagged
        } else {
            outcome
                .details
                .push("Sanctions screening clear: no list matches".to_string());
            SanctionsStatus::Clear
        };

        Ok(SanctionsReport { status, outcome })
    }
}
