//! Cart subcommand: inspect and edit a proposal held by the remote API.
//!
//! Every edit loads the proposal, stages the change through the sync
//! coordinator and saves, so the same validation and replace-all write path
//! applies as in the interactive cart. Placements are looked up in the same
//! API's catalog.

use chrono::NaiveDate;
use clap::Subcommand;
use ooh_core::cart::{
    CartSyncCoordinator, HttpProposalStore, PlacementCatalog, PlacementProducts, ProposalStore,
    SaveOutcome,
};
use serde::Serialize;
use ooh_core::{
    quote, validate_selection, BiWeeklyGrid, CartError, Config, ItemPatch, MonthlyDuration,
    PeriodSelection,
};

use super::today;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show a proposal with its priced items
    Show {
        proposal_id: u64,
        /// Print only the totals
        #[arg(long)]
        totals: bool,
    },
    /// Remove an item from a proposal
    Remove { proposal_id: u64, item_id: u64 },
    /// Catalog values of a placement
    Placement { placement_id: u64 },
    /// Add a placement, booked on the next bi-weekly block
    Add {
        proposal_id: u64,
        placement_id: u64,
        /// Book from this date instead of today
        #[arg(long)]
        from: Option<NaiveDate>,
    },
    /// Edit values or the period of an item, then save
    Edit {
        proposal_id: u64,
        item_id: u64,
        /// Base rental value
        #[arg(long)]
        rental: Option<f64>,
        /// Base paper value
        #[arg(long)]
        paper: Option<f64>,
        /// Base canvas value
        #[arg(long)]
        canvas: Option<f64>,
        /// Daily flow (impacts per day)
        #[arg(long)]
        flow: Option<u64>,
        #[arg(long)]
        notes: Option<String>,
        /// Book these bi-weekly block ids
        #[arg(long, num_args = 1.., conflicts_with = "monthly")]
        biweekly: Vec<String>,
        /// Book a monthly period starting on this date
        #[arg(long)]
        monthly: Option<NaiveDate>,
        /// Monthly duration in months
        #[arg(long, requires = "monthly", conflicts_with = "end")]
        months: Option<u32>,
        /// Custom monthly end date
        #[arg(long, requires = "monthly")]
        end: Option<NaiveDate>,
        /// Print the edited quote without saving
        #[arg(long)]
        dry_run: bool,
    },
}

#[derive(Serialize)]
struct PlacementReport {
    #[serde(flatten)]
    products: PlacementProducts,
    /// Rental at the client table (V0)
    rental_preview: f64,
}

fn connect(config: &Config) -> Result<HttpProposalStore, Box<dyn std::error::Error>> {
    Ok(HttpProposalStore::new(
        &config.api.base_url,
        config.api_token(),
        config.timeout(),
    )?)
}

pub fn run(action: CartAction) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_async(action))
}

async fn run_async(action: CartAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let store = connect(&config)?;

    match action {
        CartAction::Show {
            proposal_id,
            totals,
        } => {
            let proposal = store.fetch_proposal(proposal_id).await?;
            let report = quote(&proposal);
            if totals {
                println!("{}", serde_json::to_string_pretty(&report.totals)?);
            } else {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
        }
        CartAction::Remove {
            proposal_id,
            item_id,
        } => {
            let proposal = store.fetch_proposal(proposal_id).await?;
            let cart = CartSyncCoordinator::new(store, proposal).with_grid(config.grid());
            cart.remove(item_id).await?;
            println!("removed item {item_id}; {} item(s) left", cart.proposal().items.len());
        }
        CartAction::Placement { placement_id } => {
            let products = store.get_placement_products(placement_id).await?;
            let report = PlacementReport {
                products,
                rental_preview: products.rental_preview(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        CartAction::Add {
            proposal_id,
            placement_id,
            from,
        } => {
            let catalog = store.clone();
            let proposal = store.fetch_proposal(proposal_id).await?;
            let cart = CartSyncCoordinator::new(store, proposal).with_grid(config.grid());
            let item_id = cart
                .add_placement(&catalog, placement_id, from.unwrap_or_else(today))
                .await?;
            match item_id {
                Some(id) => println!("added placement {placement_id} as item {id}"),
                None => println!("added placement {placement_id}"),
            }
        }
        CartAction::Edit {
            proposal_id,
            item_id,
            rental,
            paper,
            canvas,
            flow,
            notes,
            biweekly,
            monthly,
            months,
            end,
            dry_run,
        } => {
            let proposal = store.fetch_proposal(proposal_id).await?;
            let grid = config.grid();
            let cart = CartSyncCoordinator::new(store, proposal).with_grid(grid);

            let selection = match monthly {
                Some(start) => Some(PeriodSelection::Monthly {
                    start,
                    duration: match end {
                        Some(end) => MonthlyDuration::Custom(end),
                        None => MonthlyDuration::Months(months.unwrap_or(1)),
                    },
                }),
                None if !biweekly.is_empty() => Some(PeriodSelection::BiWeekly { ids: biweekly }),
                None => None,
            };
            let patch = ItemPatch {
                base_rental: rental,
                base_paper: paper,
                base_canvas: canvas,
                daily_flow: flow,
                notes,
                ..ItemPatch::default()
            };
            if let Err(e) = stage_edit(&cart, item_id, selection, &grid, patch) {
                if cart.needs_refresh() {
                    cart.refresh().await?;
                }
                return Err(e.into());
            }

            if dry_run {
                let report = quote(&cart.effective_proposal());
                println!("{}", serde_json::to_string_pretty(&report)?);
                return Ok(());
            }

            match cart.save().await? {
                SaveOutcome::NothingToSave => println!("nothing to save"),
                SaveOutcome::Saved { items } => {
                    let totals = cart.totals();
                    println!(
                        "saved {items} item(s); total {:.2}, cpm {:.2}",
                        totals.total_investimento, totals.cpm_medio
                    );
                }
            }
        }
    }
    Ok(())
}

fn stage_edit<S: ProposalStore>(
    cart: &CartSyncCoordinator<S>,
    item_id: u64,
    selection: Option<PeriodSelection>,
    grid: &BiWeeklyGrid,
    patch: ItemPatch,
) -> Result<(), CartError> {
    if let Some(selection) = selection {
        let period = validate_selection(grid, &selection)?;
        cart.set_period(item_id, period)?;
    }
    cart.edit(item_id, patch)
}
