use std::path::PathBuf;

use clap::Args;
use ooh_core::{quote, CommissionTier, Config, Proposal};

#[derive(Args)]
pub struct QuoteArgs {
    /// Proposal JSON file (`nome`, `comissao`, `itens`); without `comissao`
    /// it is priced under pricing.default_tier
    pub file: PathBuf,
    /// Price under this tier (V2, V3 or V4) instead of the proposal's own
    #[arg(long)]
    pub tier: Option<CommissionTier>,
    /// Print only the totals
    #[arg(long)]
    pub totals: bool,
}

pub fn run(args: QuoteArgs) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(tier) = args.tier.filter(|t| !t.is_selectable()) {
        return Err(format!("{tier} is not a proposal tier; use one of V2, V3, V4").into());
    }
    let content = std::fs::read_to_string(&args.file)
        .map_err(|e| format!("cannot read {}: {e}", args.file.display()))?;
    let config = Config::load_or_default();
    let mut proposal = Proposal::from_json(&content, config.pricing.default_tier)?;
    if let Some(tier) = args.tier {
        proposal.commission_tier = tier;
    }

    let report = quote(&proposal);
    tracing::debug!(
        items = report.items.len(),
        total = report.totals.total_investimento,
        "proposal quoted"
    );
    if args.totals {
        println!("{}", serde_json::to_string_pretty(&report.totals)?);
    } else {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    Ok(())
}
