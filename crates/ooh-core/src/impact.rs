//! Audience reach ("impactos") and cost per thousand impacts.
//!
//! Impacts use the literal number of days in the period, not the billing
//! cycle count used for pricing.

use crate::pricing::{compute_item_values, CommissionTier};
use crate::proposal::ProposalItem;

/// Inclusive days in the item period; 0 for an inverted range.
pub fn elapsed_days(item: &ProposalItem) -> i64 {
    ((item.period_end - item.period_start).num_days() + 1).max(0)
}

/// `daily_flow × elapsed_days`.
pub fn impacts(item: &ProposalItem) -> u64 {
    let days = u64::try_from(elapsed_days(item)).unwrap_or(0);
    item.daily_flow.saturating_mul(days)
}

/// Cost per mille: `investimento / impacts × 1000`, or 0 without impacts.
pub fn cpm(investimento: f64, impacts: u64) -> f64 {
    if impacts == 0 {
        return 0.0;
    }
    investimento / impacts as f64 * 1000.0
}

pub fn item_cpm(item: &ProposalItem, tier: CommissionTier) -> f64 {
    cpm(compute_item_values(item, tier).investimento, impacts(item))
}
