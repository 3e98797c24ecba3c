//! # Fraud Heuristics Policy
//!
//! Configuration for the structural red flags the fraud check combines:
//! shell-entity name tokens, round-number amounts at extreme magnitude, and
//! per-commodity amount plausibility caps. The evaluation itself lives in
//! the engine; this module holds the versioned data and the pure matching
//! helpers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::sanctions::normalize;

fn default_shell_name_impact() -> u32 {
    30
}

fn default_round_amount_impact() -> u32 {
    15
}

fn default_mismatch_impact() -> u32 {
    15
}

fn default_structural_flag_limit() -> u32 {
    2
}

/// Fraud heuristics configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FraudPolicy {
    /// Name tokens associated with shell-entity patterns. Matched as whole
    /// tokens of the normalized name, not substrings, so e.g. "Seashell
    /// Trading" does not trip the "shell" token.
    pub shell_name_tokens: Vec<String>,
    /// Amounts at or above this magnitude are "extreme" for the
    /// round-number heuristic.
    pub round_amount_floor: u64,
    /// An extreme amount divisible by this is a round-number red flag.
    pub round_amount_divisor: u64,
    /// Per-commodity plausible amount ceilings (normalized commodity name).
    pub commodity_amount_caps: BTreeMap<String, u64>,
    /// Ceiling applied to commodities without a specific cap.
    pub default_amount_cap: u64,
    /// Impact of a shell-entity name match. Also a hard FAILED trigger.
    #[serde(default = "default_shell_name_impact")]
    pub shell_name_impact: u32,
    /// Impact of the round-number red flag.
    #[serde(default = "default_round_amount_impact")]
    pub round_amount_impact: u32,
    /// Impact of a commodity/amount mismatch.
    #[serde(default = "default_mismatch_impact")]
    pub mismatch_impact: u32,
    /// Number of structural flags that together force FAILED.
    #[serde(default = "default_structural_flag_limit")]
    pub structural_flag_limit: u32,
}

impl FraudPolicy {
    /// Development fixture configuration.
    pub fn builtin() -> Self {
        let caps: &[(&str, u64)] = &[
            ("electronics", 5_000_000_000_000),
            ("machinery", 8_000_000_000_000),
            ("textiles", 1_000_000_000_000),
            ("agriculture", 2_000_000_000_000),
            ("chemicals", 3_000_000_000_000),
            ("precious metals", 500_000_000_000),
        ];
        Self {
            shell_name_tokens: vec![
                "shell".to_string(),
                "offshore".to_string(),
                "nominee".to_string(),
                "bearer".to_string(),
            ],
            round_amount_floor: 1_000_000_000,
            round_amount_divisor: 1_000_000,
            commodity_amount_caps: caps
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            default_amount_cap: 1_000_000_000_000,
            shell_name_impact: default_shell_name_impact(),
            round_amount_impact: default_round_amount_impact(),
            mismatch_impact: default_mismatch_impact(),
            structural_flag_limit: default_structural_flag_limit(),
        }
    }

    /// Structural validation.
    pub fn validate(&self) -> Result<(), String> {
        if self.round_amount_divisor == 0 {
            return Err("fraud.round_amount_divisor must be non-zero".to_string());
        }
        if self.structural_flag_limit == 0 {
            return Err("fraud.structural_flag_limit must be at least 1".to_string());
        }
        Ok(())
    }

    /// Whether a party name contains a shell-entity token.
    pub fn is_shell_name(&self, name: &str) -> bool {
        let norm = normalize(name);
        norm.split_whitespace()
            .any(|token| self.shell_name_tokens.iter().any(|t| t == token))
    }

    /// Whether an amount is a round number at extreme magnitude.
    pub fn is_round_extreme_amount(&self, amount: u64) -> bool {
        amount >= self.round_amount_floor && amount % self.round_amount_divisor == 0
    }

    /// Plausibility ceiling for a commodity.
    pub fn amount_cap(&self, commodity: &str) -> u64 {
        self.commodity_amount_caps
            .get(&normalize(commodity))
            .copied()
            .unwrap_or(self.default_amount_cap)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shell_token_matches_whole_tokens_only() {
        let policy = FraudPolicy::builtin();
        assert!(policy.is_shell_name("Pacific Shell Holdings"));
        assert!(policy.is_shell_name("OFFSHORE ventures ltd"));
        assert!(!policy.is_shell_name("Seashell Trading Co"));
        assert!(!policy.is_shell_name("Test Exports Ltd"));
    }

    #[test]
    fn round_extreme_amounts() {
        let policy = FraudPolicy::builtin();
        // 50,000,000 is round but below the extreme-magnitude floor.
        assert!(!policy.is_round_extreme_amount(50_000_000));
        assert!(policy.is_round_extreme_amount(2_000_000_000));
        // Extreme but not round.
        assert!(!policy.is_round_extreme_amount(2_000_000_001));
    }

    #[test]
    fn commodity_caps_fall_back_to_default() {
        let policy = FraudPolicy::builtin();
        assert_eq!(policy.amount_cap("Electronics"), 5_000_000_000_000);
        assert_eq!(policy.amount_cap("Unobtainium"), policy.default_amount_cap);
    }

    #[test]
    fn zero_divisor_rejected() {
        let mut policy = FraudPolicy::builtin();
        policy.round_amount_divisor = 0;
        assert!(policy.validate().is_err());
    }
}
