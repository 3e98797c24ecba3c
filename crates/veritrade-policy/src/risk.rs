//! # Risk Tables
//!
//! Commodity tiers, geographic corridor tiers, and amount bands consulted by
//! the risk assessment check. All impacts are integers so score aggregation
//! stays exact across independent oracle callers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sanctions::normalize;

fn default_unknown_commodity_impact() -> u32 {
    12
}

fn default_prohibited_commodity_impact() -> u32 {
    30
}

fn default_unknown_country_impact() -> u32 {
    6
}

/// One amount band: amounts at or below `ceiling` take `impact`. The final
/// band has no ceiling and catches everything above the previous one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AmountBand {
    /// Inclusive upper bound in smallest units; `None` for the open band.
    pub ceiling: Option<u64>,
    pub impact: u32,
    /// Whether amounts in this band warrant a manual-review recommendation.
    #[serde(default)]
    pub recommend_review: bool,
}

/// Commodity, corridor, and amount risk tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskTables {
    /// Risk impact per normalized commodity name.
    pub commodity_impacts: BTreeMap<String, u32>,
    /// Commodities the policy rejects outright (REJECTED status).
    pub prohibited_commodities: Vec<String>,
    #[serde(default = "default_prohibited_commodity_impact")]
    pub prohibited_commodity_impact: u32,
    /// Impact applied to commodities absent from the table.
    #[serde(default = "default_unknown_commodity_impact")]
    pub unknown_commodity_impact: u32,
    /// Risk impact per normalized country name.
    pub country_impacts: BTreeMap<String, u32>,
    /// Impact applied to countries absent from the table.
    #[serde(default = "default_unknown_country_impact")]
    pub unknown_country_impact: u32,
    /// Ascending amount bands; the last must be the open band.
    pub amount_bands: Vec<AmountBand>,
}

impl RiskTables {
    /// Development fixture tables.
    pub fn builtin() -> Self {
        let commodities: &[(&str, u32)] = &[
            ("electronics", 5),
            ("textiles", 5),
            ("machinery", 5),
            ("agriculture", 8),
            ("metals", 10),
            ("chemicals", 12),
            ("tobacco", 15),
            ("crude oil", 18),
            ("precious metals", 20),
        ];
        let countries: &[(&str, u32)] = &[
            ("singapore", 0),
            ("united states", 0),
            ("germany", 0),
            ("japan", 0),
            ("united kingdom", 0),
            ("south korea", 0),
            ("australia", 2),
            ("india", 4),
            ("united arab emirates", 5),
            ("vietnam", 5),
            ("bangladesh", 8),
            ("pakistan", 8),
            ("nigeria", 10),
            ("venezuela", 15),
            ("russia", 15),
            ("myanmar", 18),
        ];
        Self {
            commodity_impacts: commodities
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            prohibited_commodities: vec![
                "arms".to_string(),
                "weapons".to_string(),
                "narcotics".to_string(),
            ],
            prohibited_commodity_impact: default_prohibited_commodity_impact(),
            unknown_commodity_impact: default_unknown_commodity_impact(),
            country_impacts: countries.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            unknown_country_impact: default_unknown_country_impact(),
            amount_bands: vec![
                AmountBand {
                    ceiling: Some(1_000_000),
                    impact: 0,
                    recommend_review: false,
                },
                AmountBand {
                    ceiling: Some(100_000_000),
                    impact: 5,
                    recommend_review: false,
                },
                AmountBand {
                    ceiling: Some(1_000_000_000),
                    impact: 10,
                    recommend_review: true,
                },
                AmountBand {
                    ceiling: None,
                    impact: 20,
                    recommend_review: true,
                },
            ],
        }
    }

    /// Structural validation: bands non-empty, ceilings strictly ascending,
    /// exactly the last band open.
    pub fn validate(&self) -> Result<(), String> {
        if self.amount_bands.is_empty() {
            return Err("risk.amount_bands must not be empty".to_string());
        }
        let mut previous: Option<u64> = None;
        for (i, band) in self.amount_bands.iter().enumerate() {
            let last = i == self.amount_bands.len() - 1;
            match (band.ceiling, last) {
                (None, false) => {
                    return Err(format!("risk.amount_bands[{i}]: only the last band may be open"));
                }
                (Some(_), true) => {
                    return Err("risk.amount_bands: the last band must be open".to_string());
                }
                (Some(ceiling), false) => {
                    if previous.is_some_and(|p| ceiling <= p) {
                        return Err(format!(
                            "risk.amount_bands[{i}]: ceilings must be strictly ascending"
                        ));
                    }
                    previous = Some(ceiling);
                }
                (None, true) => {}
            }
        }
        Ok(())
    }

    /// Whether the commodity is on the prohibited list.
    pub fn is_prohibited_commodity(&self, commodity: &str) -> bool {
        let norm = normalize(commodity);
        self.prohibited_commodities
            .iter()
            .any(|p| normalize(p) == norm)
    }

    /// Risk impact for a commodity not on the prohibited list.
    pub fn commodity_impact(&self, commodity: &str) -> u32 {
        self.commodity_impacts
            .get(&normalize(commodity))
            .copied()
            .unwrap_or(self.unknown_commodity_impact)
    }

    /// Risk impact for a single country.
    pub fn country_impact(&self, country: &str) -> u32 {
        self.country_impacts
            .get(&normalize(country))
            .copied()
            .unwrap_or(self.unknown_country_impact)
    }

    /// The band an amount falls in. `validate()` guarantees a trailing open
    /// band, so every amount lands somewhere; an (invalid) empty table maps
    /// to the open-band fallback.
    pub fn amount_band(&self, amount: u64) -> AmountBand {
        self.amount_bands
            .iter()
            .find(|band| match band.ceiling {
                Some(ceiling) => amount <= ceiling,
                None => true,
            })
            .cloned()
            .unwrap_or(AmountBand {
                ceiling: None,
                impact: 0,
                recommend_review: false,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_tables_validate() {
        assert!(RiskTables::builtin().validate().is_ok());
    }

    #[test]
    fn commodity_lookup_normalizes() {
        let tables = RiskTables::builtin();
        assert_eq!(tables.commodity_impact("Electronics"), 5);
        assert_eq!(tables.commodity_impact("CRUDE OIL"), 18);
        assert_eq!(
            tables.commodity_impact("Rare Earths"),
            tables.unknown_commodity_impact
        );
    }

    #[test]
    fn prohibited_commodities_match() {
        let tables = RiskTables::builtin();
        assert!(tables.is_prohibited_commodity("Arms"));
        assert!(tables.is_prohibited_commodity("narcotics"));
        assert!(!tables.is_prohibited_commodity("Electronics"));
    }

    #[test]
    fn corridor_impacts() {
        let tables = RiskTables::builtin();
        assert_eq!(tables.country_impact("Singapore"), 0);
        assert_eq!(tables.country_impact("united states"), 0);
        assert_eq!(tables.country_impact("Russia"), 15);
        assert_eq!(tables.country_impact("Atlantis"), tables.unknown_country_impact);
    }

    #[test]
    fn amount_band_edges() {
        let tables = RiskTables::builtin();
        assert_eq!(tables.amount_band(1_000_000).impact, 0);
        assert_eq!(tables.amount_band(1_000_001).impact, 5);
        assert_eq!(tables.amount_band(50_000_000).impact, 5);
        assert_eq!(tables.amount_band(100_000_001).impact, 10);
        assert!(tables.amount_band(100_000_001).recommend_review);
        assert_eq!(tables.amount_band(u64::MAX).impact, 20);
    }

    #[test]
    fn misordered_bands_rejected() {
        let mut tables = RiskTables::builtin();
        tables.amount_bands[1].ceiling = Some(100);
        assert!(tables.validate().is_err());
    }

    #[test]
    fn non_terminal_open_band_rejected() {
        let mut tables = RiskTables::builtin();
        tables.amount_bands[0].ceiling = None;
        assert!(tables.validate().is_err());
    }
}
