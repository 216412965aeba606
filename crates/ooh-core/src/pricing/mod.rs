//! Item and proposal pricing.
//!
//! Per item:
//!
//! ```text
//! locacao      = commissioned base rental (see tier)
//! papel        = round2(base_paper  × 1.25)
//! lona         = round2(base_canvas × 1.25)
//! investimento = (locacao + papel + lona) × quantity
//! ```
//!
//! `quantity` is the billing-cycle count from [`crate::period::quantity`].
//! Material markups do not depend on the commission tier.

pub mod tier;

pub use tier::{apply_commission, tier_multiplier, CommissionTier, COMMISSION_STEP, V0_MULTIPLIER};

use serde::{Deserialize, Serialize};

use crate::impact;
use crate::period::quantity;
use crate::proposal::{Proposal, ProposalItem};

/// Flat markup on paper and canvas production.
pub const MATERIAL_MARKUP: f64 = 1.25;

/// Round to cents, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Monetary breakdown of one item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemValues {
    pub locacao: f64,
    pub papel: f64,
    pub lona: f64,
    /// Billing cycles.
    pub quantity: u32,
    pub investimento: f64,
}

impl ItemValues {
    /// Price of one billing cycle.
    pub fn unit_total(&self) -> f64 {
        self.locacao + self.papel + self.lona
    }
}

pub fn compute_item_values(item: &ProposalItem, tier: CommissionTier) -> ItemValues {
    let locacao = apply_commission(item.base_rental, tier);
    let papel = round2(item.base_paper * MATERIAL_MARKUP);
    let lona = round2(item.base_canvas * MATERIAL_MARKUP);
    let qty = quantity(item.period_start, item.period_end, item.period_type);
    let investimento = (locacao + papel + lona) * f64::from(qty);

    ItemValues {
        locacao,
        papel,
        lona,
        quantity: qty,
        investimento,
    }
}

/// Totals over a whole proposal.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ProposalTotals {
    pub item_count: usize,
    pub total_investimento: f64,
    pub total_impactos: u64,
    /// Average cost per thousand impacts; 0 when there are no impacts.
    pub cpm_medio: f64,
}

/// Totals for `items` under `tier`.
pub fn aggregate_items<'a, I>(items: I, tier: CommissionTier) -> ProposalTotals
where
    I: IntoIterator<Item = &'a ProposalItem>,
{
    let mut totals = ProposalTotals::default();
    for item in items {
        totals.item_count += 1;
        totals.total_investimento += compute_item_values(item, tier).investimento;
        totals.total_impactos = totals.total_impactos.saturating_add(impact::impacts(item));
    }
    totals.cpm_medio = impact::cpm(totals.total_investimento, totals.total_impactos);
    totals
}

pub fn aggregate(proposal: &Proposal) -> ProposalTotals {
    aggregate_items(&proposal.items, proposal.commission_tier)
}

/// One priced line of a quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemQuote {
    pub item: ProposalItem,
    pub values: ItemValues,
    pub elapsed_days: i64,
    pub impactos: u64,
    pub cpm: f64,
}

/// Priced proposal, ready for display or export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalQuote {
    pub proposal_id: u64,
    pub name: String,
    pub commission_tier: CommissionTier,
    pub items: Vec<ItemQuote>,
    pub totals: ProposalTotals,
}

pub fn quote_item(item: &ProposalItem, tier: CommissionTier) -> ItemQuote {
    let values = compute_item_values(item, tier);
    let impactos = impact::impacts(item);
    ItemQuote {
        item: item.clone(),
        values,
        elapsed_days: impact::elapsed_days(item),
        impactos,
        cpm: impact::cpm(values.investimento, impactos),
    }
}

pub fn quote(proposal: &Proposal) -> ProposalQuote {
    let tier = proposal.commission_tier;
    ProposalQuote {
        proposal_id: proposal.id,
        name: proposal.name.clone(),
        commission_tier: tier,
        items: proposal.items.iter().map(|i| quote_item(i, tier)).collect(),
        totals: aggregate(proposal),
    }
}
