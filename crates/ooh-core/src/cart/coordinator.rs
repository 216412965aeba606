//! Cart synchronization: a draft overlay on top of canonical proposal items.
//!
//! The coordinator holds two things: the canonical items as last fetched from
//! the store, and a draft of per-item edits. Reads go through the overlay.
//! Writes always send the full item list and always refetch afterwards, on
//! success and on failure alike. There is no partial merge of server state.
//!
//! Only one write (save, remove, add, refresh) runs at a time; a second one
//! started while the first is awaiting the store gets [`CartError::Busy`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use super::catalog::{seed_item, PlacementCatalog};
use super::observer::ProposalObserver;
use super::store::ProposalStore;
use crate::error::{CartError, PersistenceError, ValidationError};
use crate::period::validator::validate_item_period;
use crate::period::{BiWeeklyGrid, ValidatedPeriod};
use crate::pricing::{aggregate_items, ProposalTotals};
use crate::proposal::{FieldValue, ItemField, ItemPatch, Proposal, ProposalItem};

/// Result of [`CartSyncCoordinator::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Draft was empty, nothing was sent.
    NothingToSave,
    /// Draft was written and canonical state refetched.
    Saved { items: usize },
}

#[derive(Debug, Clone)]
struct DraftEntry {
    patch: ItemPatch,
    revision: u64,
}

#[derive(Debug)]
struct CartState {
    canonical: Proposal,
    draft: HashMap<u64, DraftEntry>,
    revision: u64,
}

impl CartState {
    fn effective_items(&self) -> Vec<ProposalItem> {
        self.canonical
            .items
            .iter()
            .map(|item| match item.id.and_then(|id| self.draft.get(&id)) {
                Some(entry) => entry.patch.apply_to(item),
                None => item.clone(),
            })
            .collect()
    }

    fn stage(&mut self, item_id: u64, patch: ItemPatch) {
        self.revision += 1;
        let revision = self.revision;
        self.draft
            .entry(item_id)
            .and_modify(|entry| {
                entry.patch.merge(patch.clone());
                entry.revision = revision;
            })
            .or_insert(DraftEntry { patch, revision });
    }

    /// Replace canonical items and drop draft entries for items that are gone.
    fn replace_canonical(&mut self, items: Vec<ProposalItem>) {
        self.canonical.items = items;
        let live: Vec<u64> = self.canonical.items.iter().filter_map(|i| i.id).collect();
        self.draft.retain(|id, _| live.contains(id));
    }
}

/// Clears the busy flag when the running action finishes, however it ends.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, CartError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| CartError::Busy)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct CartSyncCoordinator<S> {
    store: S,
    grid: BiWeeklyGrid,
    state: Mutex<CartState>,
    busy: AtomicBool,
    needs_refresh: AtomicBool,
    observers: Vec<Arc<dyn ProposalObserver>>,
}

impl<S: ProposalStore> CartSyncCoordinator<S> {
    /// Coordinator over `proposal`, treated as the canonical state.
    pub fn new(store: S, proposal: Proposal) -> Self {
        Self {
            store,
            grid: BiWeeklyGrid::default(),
            state: Mutex::new(CartState {
                canonical: proposal,
                draft: HashMap::new(),
                revision: 0,
            }),
            busy: AtomicBool::new(false),
            needs_refresh: AtomicBool::new(false),
            observers: Vec::new(),
        }
    }

    pub fn with_grid(mut self, grid: BiWeeklyGrid) -> Self {
        self.grid = grid;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ProposalObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    fn lock(&self) -> MutexGuard<'_, CartState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn proposal_id(&self) -> u64 {
        self.lock().canonical.id
    }

    fn notify(&self, snapshot: &Proposal) {
        for observer in &self.observers {
            observer.proposal_changed(snapshot);
        }
    }

    /// Canonical proposal, without draft edits.
    pub fn proposal(&self) -> Proposal {
        self.lock().canonical.clone()
    }

    /// Proposal as the user currently sees it, draft applied.
    pub fn effective_proposal(&self) -> Proposal {
        let state = self.lock();
        Proposal {
            items: state.effective_items(),
            ..state.canonical.clone()
        }
    }

    pub fn effective_items(&self) -> Vec<ProposalItem> {
        self.lock().effective_items()
    }

    /// Draft value of `field` if staged, else the canonical one.
    /// `None` when the item is not in canonical state.
    pub fn effective(&self, item_id: u64, field: ItemField) -> Option<FieldValue> {
        let state = self.lock();
        let item = state.canonical.item(item_id)?;
        state
            .draft
            .get(&item_id)
            .and_then(|entry| entry.patch.get(field))
            .or_else(|| Some(item.get(field)))
    }

    /// Totals over the effective items, so they follow unsaved edits.
    pub fn totals(&self) -> ProposalTotals {
        let state = self.lock();
        aggregate_items(&state.effective_items(), state.canonical.commission_tier)
    }

    pub fn has_pending_edits(&self) -> bool {
        !self.lock().draft.is_empty()
    }

    /// Set when a reconciling refetch itself failed; the next successful
    /// refetch clears it.
    pub fn needs_refresh(&self) -> bool {
        self.needs_refresh.load(Ordering::Acquire)
    }

    /// An edit aimed at an item canonical state no longer has. Staging does
    /// no I/O, so the cart is marked stale and the caller is expected to
    /// [`refresh`](Self::refresh).
    fn missing_item(&self, item_id: u64) -> CartError {
        self.needs_refresh.store(true, Ordering::Release);
        tracing::warn!(item_id, "edit target missing, state marked stale");
        CartError::NotFound { item_id }
    }

    /// Stage an edit. Period and money fields are checked before anything is
    /// staged; a rejected edit leaves the draft untouched.
    pub fn edit(&self, item_id: u64, patch: ItemPatch) -> Result<(), CartError> {
        if patch.is_empty() {
            return Ok(());
        }
        check_money("base_rental", patch.base_rental)?;
        check_money("base_paper", patch.base_paper)?;
        check_money("base_canvas", patch.base_canvas)?;

        let mut state = self.lock();
        let Some(item) = state.canonical.item(item_id) else {
            return Err(self.missing_item(item_id));
        };
        if patch.touches_period() {
            let mut merged = state
                .draft
                .get(&item_id)
                .map(|entry| entry.patch.clone())
                .unwrap_or_default();
            merged.merge(patch.clone());
            let candidate = merged.apply_to(item);
            validate_item_period(
                &self.grid,
                candidate.period_start,
                candidate.period_end,
                candidate.period_type,
            )?;
        }
        state.stage(item_id, patch);
        tracing::debug!(item_id, revision = state.revision, "staged item edit");
        Ok(())
    }

    /// Stage a period that already went through picker validation. It is
    /// checked once more against the stored-item rules before staging.
    pub fn set_period(&self, item_id: u64, period: ValidatedPeriod) -> Result<(), CartError> {
        validate_item_period(&self.grid, period.start(), period.end(), period.period_type())?;
        let mut state = self.lock();
        if state.canonical.item(item_id).is_none() {
            return Err(self.missing_item(item_id));
        }
        state.stage(item_id, period.into_patch());
        Ok(())
    }

    /// Write the effective items (replace-all) and refetch.
    ///
    /// On a failed write the draft is kept and canonical state is refetched.
    /// Edits staged while the write was in flight survive the draft clearing.
    pub async fn save(&self) -> Result<SaveOutcome, CartError> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        let (proposal_id, items, revision) = {
            let state = self.lock();
            if state.draft.is_empty() {
                return Ok(SaveOutcome::NothingToSave);
            }
            (state.canonical.id, state.effective_items(), state.revision)
        };

        if let Err(e) = self.store.replace_proposal_items(proposal_id, &items).await {
            tracing::warn!(proposal_id, error = %e, "save failed, draft kept");
            self.reconcile().await;
            return Err(e.into());
        }

        let fresh = match self.store.get_proposal_items(proposal_id).await {
            Ok(fresh) => fresh,
            Err(e) => {
                self.needs_refresh.store(true, Ordering::Release);
                tracing::warn!(proposal_id, error = %e, "refetch after save failed");
                return Err(e.into());
            }
        };
        let snapshot = {
            let mut state = self.lock();
            state.replace_canonical(fresh);
            state.draft.retain(|_, entry| entry.revision > revision);
            Proposal {
                items: state.effective_items(),
                ..state.canonical.clone()
            }
        };
        self.needs_refresh.store(false, Ordering::Release);
        tracing::info!(proposal_id, items = snapshot.items.len(), "proposal saved");
        self.notify(&snapshot);
        Ok(SaveOutcome::Saved {
            items: snapshot.items.len(),
        })
    }

    /// Drop an item optimistically and persist the remaining list.
    ///
    /// Observers see the shortened proposal before the store answers. Any
    /// failure is undone by refetching canonical state wholesale; unsaved
    /// edits of the item come back with it.
    pub async fn remove(&self, item_id: u64) -> Result<(), CartError> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        let present = self.lock().canonical.item(item_id).is_some();
        if !present {
            tracing::warn!(item_id, "remove target missing, refetching");
            self.reconcile().await;
            return Err(CartError::NotFound { item_id });
        }
        let (proposal_id, remaining, optimistic, pending) = {
            let mut state = self.lock();
            state.canonical.items.retain(|i| i.id != Some(item_id));
            let pending = state.draft.remove(&item_id);
            let optimistic = Proposal {
                items: state.effective_items(),
                ..state.canonical.clone()
            };
            (state.canonical.id, state.canonical.items.clone(), optimistic, pending)
        };
        self.notify(&optimistic);

        if let Err(e) = self.store.replace_proposal_items(proposal_id, &remaining).await {
            tracing::warn!(proposal_id, item_id, error = %e, "remove failed, restoring from store");
            if let Some(entry) = pending {
                self.lock().draft.insert(item_id, entry);
            }
            self.reconcile().await;
            return Err(e.into());
        }
        tracing::info!(proposal_id, item_id, "item removed");
        self.refetch().await.map_err(Into::into)
    }

    /// Add a placement seeded from the catalog with the next bi-weekly block.
    /// Returns the id the store assigned to the new item, if it reported one.
    pub async fn add_placement<C>(
        &self,
        catalog: &C,
        placement_id: u64,
        today: NaiveDate,
    ) -> Result<Option<u64>, CartError>
    where
        C: PlacementCatalog + ?Sized,
    {
        let _busy = BusyGuard::acquire(&self.busy)?;
        if self.lock().canonical.contains_placement(placement_id) {
            return Err(CartError::DuplicatePlacement { id_ooh: placement_id });
        }
        let products = catalog
            .get_placement_products(placement_id)
            .await
            .map_err(|e| CartError::Catalog(e.to_string()))?;
        let item = seed_item(placement_id, &products, &self.grid, today)?;

        let (proposal_id, items) = {
            let state = self.lock();
            let mut items = state.canonical.items.clone();
            items.push(item);
            (state.canonical.id, items)
        };
        if let Err(e) = self.store.replace_proposal_items(proposal_id, &items).await {
            tracing::warn!(proposal_id, placement_id, error = %e, "add failed, refetching");
            self.reconcile().await;
            return Err(e.into());
        }
        tracing::info!(proposal_id, placement_id, "placement added");
        self.refetch().await?;
        Ok(self
            .lock()
            .canonical
            .items
            .iter()
            .find(|i| i.id_ooh == placement_id)
            .and_then(|i| i.id))
    }

    /// Refetch canonical state on demand. The draft is kept.
    pub async fn refresh(&self) -> Result<(), CartError> {
        let _busy = BusyGuard::acquire(&self.busy)?;
        self.refetch().await.map_err(Into::into)
    }

    async fn refetch(&self) -> Result<(), PersistenceError> {
        let proposal_id = self.proposal_id();
        let result = self.store.get_proposal_items(proposal_id).await;
        let fresh = match result {
            Ok(fresh) => fresh,
            Err(e) => {
                self.needs_refresh.store(true, Ordering::Release);
                return Err(e);
            }
        };
        let snapshot = {
            let mut state = self.lock();
            state.replace_canonical(fresh);
            Proposal {
                items: state.effective_items(),
                ..state.canonical.clone()
            }
        };
        self.needs_refresh.store(false, Ordering::Release);
        tracing::debug!(proposal_id, items = snapshot.items.len(), "canonical state refetched");
        self.notify(&snapshot);
        Ok(())
    }

    /// Recovery path after a failed write: refetch, never replay.
    async fn reconcile(&self) {
        if let Err(e) = self.refetch().await {
            tracing::warn!(error = %e, "reconciling refetch failed, state marked stale");
        }
    }
}

fn check_money(field: &str, value: Option<f64>) -> Result<(), ValidationError> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => Err(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!("expected a non-negative amount, got {v}"),
        }),
        _ => Ok(()),
    }
}
