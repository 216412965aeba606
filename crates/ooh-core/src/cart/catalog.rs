//! Placement catalog collaborator and item seeding.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{PersistenceError, ValidationError};
use crate::period::validator::default_biweekly_period;
use crate::period::BiWeeklyGrid;
use crate::pricing::{apply_commission, CommissionTier};
use crate::proposal::ProposalItem;

/// Catalog base values of one placement.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PlacementProducts {
    pub rental_base: f64,
    pub paper_base: f64,
    pub canvas_base: f64,
    pub daily_flow: u64,
}

/// A product row as exhibitors list it ("Papel", "Lona", "Locação bissemanal", ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub tipo: String,
    pub valor: f64,
}

impl PlacementProducts {
    /// Pick rental, paper and canvas prices out of a product list by type name.
    /// Missing products count as zero.
    pub fn from_products(products: &[CatalogProduct], daily_flow: u64) -> Self {
        Self {
            rental_base: price_of(products, &["locação", "locacao", "bissemanal", "mensal"]),
            paper_base: price_of(products, &["papel"]),
            canvas_base: price_of(products, &["lona"]),
            daily_flow,
        }
    }

    /// Rental at the standalone client table (V0), shown before a tier applies.
    pub fn rental_preview(&self) -> f64 {
        apply_commission(self.rental_base, CommissionTier::V0)
    }
}

/// Price of the first product whose type mentions any of `keywords`.
fn price_of(products: &[CatalogProduct], keywords: &[&str]) -> f64 {
    products
        .iter()
        .find(|p| {
            let tipo = p.tipo.to_lowercase();
            keywords.iter().any(|k| tipo.contains(k))
        })
        .map(|p| p.valor)
        .unwrap_or(0.0)
}

#[async_trait]
pub trait PlacementCatalog: Send + Sync {
    async fn get_placement_products(&self, placement_id: u64) -> Result<PlacementProducts, PersistenceError>;
}

/// Fixed catalog held in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
    placements: HashMap<u64, PlacementProducts>,
}

impl StaticCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placement(mut self, placement_id: u64, products: PlacementProducts) -> Self {
        self.placements.insert(placement_id, products);
        self
    }
}

#[async_trait]
impl PlacementCatalog for StaticCatalog {
    async fn get_placement_products(&self, placement_id: u64) -> Result<PlacementProducts, PersistenceError> {
        self.placements
            .get(&placement_id)
            .copied()
            .ok_or_else(|| PersistenceError::Rejected(format!("placement {placement_id} not in catalog")))
    }
}

/// New cart item for a placement, booked on the next bi-weekly block from `today`.
pub fn seed_item(
    placement_id: u64,
    products: &PlacementProducts,
    grid: &BiWeeklyGrid,
    today: NaiveDate,
) -> Result<ProposalItem, ValidationError> {
    let period = default_biweekly_period(grid, today).ok_or_else(|| ValidationError::InvalidValue {
        field: "period".into(),
        message: format!("no bi-weekly block available after {today}"),
    })?;
    Ok(ProposalItem {
        id: None,
        id_ooh: placement_id,
        period_start: period.start(),
        period_end: period.end(),
        period_type: period.period_type(),
        base_rental: products.rental_base,
        base_paper: products.paper_base,
        base_canvas: products.canvas_base,
        daily_flow: products.daily_flow,
        selected_period_ids: period.selected_period_ids().to_vec(),
        notes: String::new(),
    })
}
