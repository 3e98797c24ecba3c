//! # veritrade-policy — Versioned Verification Policy
//!
//! All data the check components consult lives here: the sanctions list and
//! its screener, fraud heuristics configuration, and the commodity /
//! corridor / amount risk tables. A [`PolicyPack`] is loaded once at startup
//! (from a YAML file or the builtin default) and injected into each check at
//! construction — never read from ambient global state — so every verdict is
//! attributable to a specific policy version and reproducible for oracle
//! consensus.

pub mod fraud;
pub mod risk;
pub mod sanctions;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use fraud::FraudPolicy;
pub use risk::{AmountBand, RiskTables};
pub use sanctions::{MatchType, SanctionedEntity, SanctionsHit, SanctionsPolicy, SanctionsScreener};

/// Errors arising from policy pack loading and validation.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("failed to read policy pack: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse policy pack: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The pack parsed but its contents are unusable.
    #[error("invalid policy pack: {0}")]
    Invalid(String),
}

/// A complete, versioned policy pack.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PolicyPack {
    /// Policy version recorded against every verdict produced under it.
    pub version: String,
    pub sanctions: SanctionsPolicy,
    pub fraud: FraudPolicy,
    pub risk: RiskTables,
}

impl PolicyPack {
    /// Parse a pack from YAML text and validate it.
    pub fn from_yaml(text: &str) -> Result<Self, PolicyError> {
        let pack: Self = serde_yaml::from_str(text)?;
        pack.validate()?;
        Ok(pack)
    }

    /// Load a pack from a YAML file and validate it.
    pub fn load(path: &Path) -> Result<Self, PolicyError> {
        let text = std::fs::read_to_string(path)?;
        let pack = Self::from_yaml(&text)?;
        tracing::info!(version = %pack.version, path = %path.display(), "policy pack loaded");
        Ok(pack)
    }

    /// Structural validation beyond what serde enforces.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.version.trim().is_empty() {
            return Err(PolicyError::Invalid("version must not be empty".into()));
        }
        self.risk.validate().map_err(PolicyError::Invalid)?;
        self.fraud.validate().map_err(PolicyError::Invalid)?;
        Ok(())
    }

    /// The builtin default pack.
    ///
    /// List contents are development fixtures, not a real sanctions feed —
    /// production deployments load a pack built from consolidated list data.
    pub fn builtin() -> Self {
        Self {
            version: "builtin-2026.08".to_string(),
            sanctions: SanctionsPolicy::builtin(),
            fraud: FraudPolicy::builtin(),
            risk: RiskTables::builtin(),
        }
    }
}
