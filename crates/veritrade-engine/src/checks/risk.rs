//! # Risk Assessment Check
//!
//! Three independent sub-assessments over the injected risk tables:
//! commodity (with an APPROVED/REJECTED status), geographic corridor, and
//! amount magnitude. REJECTED raises risk but does not by itself invalidate
//! a verdict — only the score threshold and the two hard triggers do.

use veritrade_core::CommodityStatus;
use veritrade_policy::RiskTables;

use crate::checks::{CheckError, CheckOutcome};

/// Inputs to the risk assessment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskInput {
    pub commodity: String,
    /// Amount in smallest units.
    pub amount: u64,
    pub supplier_country: String,
    pub buyer_country: String,
}

/// Combined result of the three sub-assessments.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskReport {
    /// `Approved` or `Rejected`; `Error` is assigned by the pipeline when
    /// the check itself fails.
    pub commodity_status: CommodityStatus,
    pub outcome: CheckOutcome,
}

/// Risk assessment seam.
pub trait RiskCheck: Send + Sync {
    fn assess(&self, input: &RiskInput) -> Result<RiskReport, CheckError>;
}

/// Default implementation over the injected [`RiskTables`].
pub struct TableRiskAssessor {
    tables: RiskTables,
}

impl TableRiskAssessor {
    pub fn new(tables: RiskTables) -> Self {
        Self { tables }
    }

    /// Commodity sub-assessment.
    pub fn assess_commodity(&self, commodity: &str) -> (CommodityStatus, CheckOutcome) {
        if self.tables.is_prohibited_commodity(commodity) {
            let outcome = CheckOutcome {
                details: vec![format!("Commodity '{commodity}' is on the prohibited list")],
                risk_impact: self.tables.prohibited_commodity_impact,
                recommendations: vec![
                    "Confirm export licensing before any investment decision".to_string(),
                ],
            };
            return (CommodityStatus::Rejected, outcome);
        }
        let impact = self.tables.commodity_impact(commodity);
        let outcome = CheckOutcome {
            details: vec![format!("Commodity risk for '{commodity}': +{impact}")],
            risk_impact: impact,
            recommendations: Vec::new(),
        };
        (CommodityStatus::Approved, outcome)
    }

    /// Geographic corridor sub-assessment: the corridor impact is the sum of
    /// both endpoint country tiers.
    pub fn assess_corridor(&self, supplier_country: &str, buyer_country: &str) -> CheckOutcome {
        let supplier = self.tables.country_impact(supplier_country);
        let buyer = self.tables.country_impact(buyer_country);
        CheckOutcome {
            details: vec![format!(
                "Corridor risk {supplier_country} -> {buyer_country}: +{}",
                supplier + buyer
            )],
            risk_impact: supplier + buyer,
            recommendations: Vec::new(),
        }
    }

    /// Amount magnitude sub-assessment.
    pub fn assess_amount(&self, amount: u64) -> CheckOutcome {
        let band = self.tables.amount_band(amount);
        let mut outcome = CheckOutcome {
            details: vec![format!("Amount band risk for {amount}: +{}", band.impact)],
            risk_impact: band.impact,
            recommendations: Vec::new(),
        };
        if band.recommend_review {
            outcome
                .recommendations
                .push("Manual review recommended for high-value transaction".to_string());
        }
        outcome
    }
}

impl RiskCheck for TableRiskAssessor {
    fn assess(&self, input: &RiskInput) -> Result<RiskReport, CheckError> {
        let (commodity_status, mut outcome) = self.assess_commodity(&input.commodity);
        outcome.absorb(self.assess_corridor(&input.supplier_country, &input.buyer_country));
        outcome.absorb(self.assess_amount(input.amount));
        Ok(RiskReport {
            commodity_status,
            outcome,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assessor() -> TableRiskAssessor {
        TableRiskAssessor::new(RiskTables::builtin())
    }

    #[test]
    fn fixture_corridor_scores_low() {
        let report = assessor()
            .assess(&RiskInput {
                commodity: "Electronics".to_string(),
                amount: 50_000_000,
                supplier_country: "Singapore".to_string(),
                buyer_country: "United States".to_string(),
            })
            .unwrap();
        assert_eq!(report.commodity_status, CommodityStatus::Approved);
        // Electronics +5, corridor +0, amount band +5.
        assert_eq!(report.outcome.risk_impact, 10);
        assert_eq!(report.outcome.details.len(), 3);
        assert!(report.outcome.recommendations.is_empty());
    }

    #[test]
    fn prohibited_commodity_rejected_but_only_scored() {
        let (status, outcome) = assessor().assess_commodity("Arms");
        assert_eq!(status, CommodityStatus::Rejected);
        assert_eq!(outcome.risk_impact, 30);
        assert!(!outcome.recommendations.is_empty());
    }

    #[test]
    fn unknown_commodity_takes_default_impact() {
        let (status, outcome) = assessor().assess_commodity("Rare Earths");
        assert_eq!(status, CommodityStatus::Approved);
        assert_eq!(outcome.risk_impact, 12);
    }

    #[test]
    fn corridor_sums_both_endpoints() {
        let outcome = assessor().assess_corridor("Russia", "Venezuela");
        assert_eq!(outcome.risk_impact, 30);
        let outcome = assessor().assess_corridor("Singapore", "Japan");
        assert_eq!(outcome.risk_impact, 0);
    }

    #[test]
    fn large_amount_recommends_review() {
        let outcome = assessor().assess_amount(500_000_000);
        assert_eq!(outcome.risk_impact, 10);
        assert_eq!(outcome.recommendations.len(), 1);

        let outcome = assessor().assess_amount(5_000_000_000);
        assert_eq!(outcome.risk_impact, 20);
        assert_eq!(outcome.recommendations.len(), 1);
    }

    #[test]
    fn small_amount_no_recommendation() {
        let outcome = assessor().assess_amount(500_000);
        assert_eq!(outcome.risk_impact, 0);
        assert!(outcome.recommendations.is_empty());
    }
}
