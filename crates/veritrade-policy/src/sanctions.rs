//! # Sanctions Policy and Screener
//!
//! Exact and fuzzy name screening against a sanctioned-entity list, plus
//! exact country screening against an embargo list. Screening is a pure
//! function of its inputs at a given policy version: the screener indexes
//! names in a `BTreeMap` so fuzzy iteration order — and therefore
//! tie-breaking between equal scores — is deterministic.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

/// Default minimum fuzzy match score.
const DEFAULT_FUZZY_THRESHOLD: f64 = 0.7;

fn default_fuzzy_threshold() -> f64 {
    DEFAULT_FUZZY_THRESHOLD
}

fn default_name_hit_impact() -> u32 {
    50
}

fn default_country_hit_impact() -> u32 {
    45
}

// ---------------------------------------------------------------------------
// Policy data
// ---------------------------------------------------------------------------

/// A single entry in the sanctioned-entity list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SanctionedEntity {
    /// Primary name of the sanctioned party.
    pub name: String,
    /// Known aliases.
    #[serde(default)]
    pub aliases: Vec<String>,
    /// Sanctions programs this entry is listed under.
    #[serde(default)]
    pub programs: Vec<String>,
}

/// Sanctions screening policy: parties, embargoed countries, and weights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SanctionsPolicy {
    pub entities: Vec<SanctionedEntity>,
    /// Embargoed countries matched exactly after normalization.
    pub countries: Vec<String>,
    /// Minimum fuzzy match score in (0.0, 1.0].
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,
    /// Risk impact of a party-name hit.
    #[serde(default = "default_name_hit_impact")]
    pub name_hit_impact: u32,
    /// Risk impact of an embargoed-country hit.
    #[serde(default = "default_country_hit_impact")]
    pub country_hit_impact: u32,
}

impl SanctionsPolicy {
    /// Development fixture list. Names are synthetic.
    pub fn builtin() -> Self {
        let entity = |name: &str, aliases: &[&str], program: &str| SanctionedEntity {
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            programs: vec![program.to_string()],
        };
        Self {
            entities: vec![
                entity(
                    "Vostok Energy Trading",
                    &["Vostok Energy Trading LLC"],
                    "ENERGY-EO",
                ),
                entity("Crimson Star Shipping", &["Crimson Star Lines"], "SHIP-2"),
                entity("Atlas Global Holdings", &[], "FIN-23"),
                entity("Meridian Petrochem FZE", &["Meridian Petrochem"], "ENERGY-EO"),
                entity("Golden Crescent Exports", &[], "NARCO-7"),
            ],
            countries: vec![
                "North Korea".to_string(),
                "Iran".to_string(),
                "Syria".to_string(),
                "Cuba".to_string(),
                "Sudan".to_string(),
            ],
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            name_hit_impact: default_name_hit_impact(),
            country_hit_impact: default_country_hit_impact(),
        }
    }
}

// ---------------------------------------------------------------------------
// Screening results
// ---------------------------------------------------------------------------

/// How a queried name matched a listed entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    ExactName,
    FuzzyName,
}

/// A match of a queried party name against the list.
#[derive(Debug, Clone, PartialEq)]
pub struct SanctionsHit {
    /// Listed primary name the query matched.
    pub listed_name: String,
    pub match_type: MatchType,
    /// Match confidence score (0.0 - 1.0).
    pub score: f64,
}

// ---------------------------------------------------------------------------
// Screener
// ---------------------------------------------------------------------------

/// Screens party names and countries against a [`SanctionsPolicy`].
///
/// Built once per policy pack; indexes normalized primary names and aliases
/// back to the listed primary name.
#[derive(Debug)]
pub struct SanctionsScreener {
    /// Normalized name or alias → listed primary name.
    name_index: BTreeMap<String, String>,
    /// Normalized embargoed countries.
    country_set: BTreeSet<String>,
    threshold: f64,
}

impl SanctionsScreener {
    /// Build a screener from policy data.
    ///
    /// The fuzzy threshold is clamped into (0.0, 1.0]: values at or below
    /// zero become 0.01, values above one become 1.0, NaN falls back to the
    /// default. False negatives are the dangerous direction for sanctions
    /// screening, so out-of-range configuration fails toward matching more.
    pub fn new(policy: &SanctionsPolicy) -> Self {
        let threshold = if policy.fuzzy_threshold.is_nan() {
            tracing::warn!("sanctions fuzzy_threshold is NaN, using default 0.7");
            DEFAULT_FUZZY_THRESHOLD
        } else if policy.fuzzy_threshold <= 0.0 {
            tracing::warn!(
                threshold = policy.fuzzy_threshold,
                "sanctions fuzzy_threshold <= 0.0, clamping to 0.01"
            );
            0.01
        } else if policy.fuzzy_threshold > 1.0 {
            tracing::warn!(
                threshold = policy.fuzzy_threshold,
                "sanctions fuzzy_threshold > 1.0, clamping to 1.0"
            );
            1.0
        } else {
            policy.fuzzy_threshold
        };

        let mut name_index = BTreeMap::new();
        for entity in &policy.entities {
            let norm = normalize(&entity.name);
            if !norm.is_empty() {
                name_index.insert(norm, entity.name.clone());
            }
            for alias in &entity.aliases {
                let norm_alias = normalize(alias);
                if !norm_alias.is_empty() {
                    name_index.entry(norm_alias).or_insert_with(|| entity.name.clone());
                }
            }
        }

        let country_set = policy.countries.iter().map(|c| normalize(c)).collect();

        Self {
            name_index,
            country_set,
            threshold,
        }
    }

    /// Screen a party name. Returns the best-scoring hit at or above the
    /// threshold, ties broken by normalized-name order.
    pub fn screen_name(&self, name: &str) -> Option<SanctionsHit> {
        let norm = normalize(name);
        if norm.is_empty() {
            return None;
        }

        // Exact match against any indexed name or alias.
        if let Some(listed) = self.name_index.get(&norm) {
            return Some(SanctionsHit {
                listed_name: listed.clone(),
                match_type: MatchType::ExactName,
                score: 1.0,
            });
        }

        // Fuzzy match. BTreeMap iteration keeps the best-hit selection
        // deterministic when two targets score equally.
        let mut best: Option<SanctionsHit> = None;
        for (norm_target, listed) in &self.name_index {
            let score = fuzzy_score(&norm, norm_target);
            if score >= self.threshold && best.as_ref().map_or(true, |b| score > b.score) {
                best = Some(SanctionsHit {
                    listed_name: listed.clone(),
                    match_type: MatchType::FuzzyName,
                    score,
                });
            }
        }
        best
    }

    /// Whether a country is on the embargo list (exact normalized match).
    pub fn screen_country(&self, country: &str) -> bool {
        self.country_set.contains(&normalize(country))
    }
}

/// Normalize a string for matching: lowercase, strip punctuation, collapse
/// whitespace.
pub fn normalize(s: &str) -> String {
    let lower = s.to_lowercase();
    let cleaned: String = lower
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Fuzzy match score between two normalized strings (0.0 - 1.0): exact 1.0,
/// meaningful substring 0.9, otherwise token-set Jaccard similarity.
fn fuzzy_score(query: &str, target: &str) -> f64 {
    if query.is_empty() || target.is_empty() {
        return 0.0;
    }
    if query == target {
        return 1.0;
    }
    if query.len() >= 3 && (target.contains(query) || query.contains(target)) {
        return 0.9;
    }
    let q_tokens: HashSet<&str> = query.split_whitespace().collect();
    let t_tokens: HashSet<&str> = target.split_whitespace().collect();
    if q_tokens.is_empty() || t_tokens.is_empty() {
        return 0.0;
    }
    let overlap = q_tokens.intersection(&t_tokens).count();
    let total = q_tokens.union(&t_tokens).count();
    overlap as f64 / total as f64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn screener() -> SanctionsScreener {
        SanctionsScreener::new(&SanctionsPolicy::builtin())
    }

    #[test]
    fn exact_name_matches() {
        let hit = screener().screen_name("Vostok Energy Trading").unwrap();
        assert_eq!(hit.match_type, MatchType::ExactName);
        assert_eq!(hit.score, 1.0);
        assert_eq!(hit.listed_name, "Vostok Energy Trading");
    }

    #[test]
    fn exact_match_is_case_and_punctuation_insensitive() {
        let hit = screener().screen_name("VOSTOK  ENERGY, TRADING.").unwrap();
        assert_eq!(hit.match_type, MatchType::ExactName);
    }

    #[test]
    fn alias_matches_back_to_primary_name() {
        let hit = screener().screen_name("Crimson Star Lines").unwrap();
        assert_eq!(hit.listed_name, "Crimson Star Shipping");
    }

    #[test]
    fn fuzzy_token_overlap_matches() {
        // Shares 3 of 4 tokens with "Vostok Energy Trading" via substring.
        let hit = screener().screen_name("Vostok Energy").unwrap();
        assert_eq!(hit.match_type, MatchType::FuzzyName);
        assert!(hit.score >= 0.7);
    }

    #[test]
    fn unrelated_name_is_clear() {
        assert!(screener().screen_name("Test Exports Ltd").is_none());
        assert!(screener().screen_name("Acme Industrial Supply").is_none());
    }

    #[test]
    fn empty_name_is_clear() {
        assert!(screener().screen_name("   ").is_none());
    }

    #[test]
    fn embargoed_country_matches() {
        assert!(screener().screen_country("North Korea"));
        assert!(screener().screen_country("north korea"));
        assert!(!screener().screen_country("Singapore"));
        assert!(!screener().screen_country("United States"));
    }

    #[test]
    fn screening_is_deterministic() {
        let s = screener();
        let a = s.screen_name("Vostok Energy");
        let b = s.screen_name("Vostok Energy");
        assert_eq!(a, b);
    }

    #[test]
    fn threshold_is_clamped() {
        let mut policy = SanctionsPolicy::builtin();
        policy.fuzzy_threshold = -2.0;
        let s = SanctionsScreener::new(&policy);
        // With a near-zero threshold even weak overlap matches.
        assert!(s.screen_name("Trading Company").is_some());

        policy.fuzzy_threshold = 5.0;
        let s = SanctionsScreener::new(&policy);
        // Clamped to exact-only.
        assert!(s.screen_name("Vostok Energy").is_none());
        assert!(s.screen_name("Vostok Energy Trading").is_some());
    }

    #[test]
    fn normalize_collapses_noise() {
        assert_eq!(normalize("  Atlas—Global   HOLDINGS! "), "atlas global holdings");
    }
}
