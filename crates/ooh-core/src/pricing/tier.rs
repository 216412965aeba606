//! Commission tiers.
//!
//! Tiers compound a ×1.25 step on the base rental. The commissioned value is
//! rounded to cents after every step, not once at the end; stored proposals
//! were priced that way and V3/V4 values differ at the cent level otherwise.

use serde::{Deserialize, Serialize};

use super::round2;

/// One compounding commission step.
pub const COMMISSION_STEP: f64 = 1.25;

/// Client-table multiplier used when seeding an item outside any tier.
pub const V0_MULTIPLIER: f64 = 2.0;

/// Commission level of a proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommissionTier {
    /// Client table (×2). Only a standalone default, not a proposal tier.
    #[serde(alias = "CLIENT")]
    V0,
    V2,
    V3,
    V4,
}

impl CommissionTier {
    /// Tiers a proposal may be created with.
    pub const SELECTABLE: [CommissionTier; 3] =
        [CommissionTier::V2, CommissionTier::V3, CommissionTier::V4];

    /// Number of ×1.25 steps; `None` for the flat V0 table.
    fn steps(&self) -> Option<u32> {
        match self {
            CommissionTier::V0 => None,
            CommissionTier::V2 => Some(1),
            CommissionTier::V3 => Some(2),
            CommissionTier::V4 => Some(3),
        }
    }

    pub fn is_selectable(&self) -> bool {
        self.steps().is_some()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CommissionTier::V0 => "V0",
            CommissionTier::V2 => "V2",
            CommissionTier::V3 => "V3",
            CommissionTier::V4 => "V4",
        }
    }
}

impl std::fmt::Display for CommissionTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CommissionTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "V0" | "CLIENT" => Ok(CommissionTier::V0),
            "V2" => Ok(CommissionTier::V2),
            "V3" => Ok(CommissionTier::V3),
            "V4" => Ok(CommissionTier::V4),
            other => Err(format!("unknown commission tier: {other}")),
        }
    }
}

/// Commissioned rental for `base`, rounding to cents after each step.
pub fn apply_commission(base: f64, tier: CommissionTier) -> f64 {
    match tier.steps() {
        None => round2(base * V0_MULTIPLIER),
        Some(steps) => (0..steps).fold(base, |value, _| round2(value * COMMISSION_STEP)),
    }
}

/// Multiplier of `tier` for display: the stepped chain applied to 1.0.
///
/// Not the factor pricing uses. [`apply_commission`] rounds the money value
/// at each step, so `round2(base * tier_multiplier(t))` can differ from it
/// for V3 and V4.
pub fn tier_multiplier(tier: CommissionTier) -> f64 {
    apply_commission(1.0, tier)
}
