//! Persistence collaborator for proposal items.
//!
//! The store only knows two operations: fetch every item of a proposal, and
//! replace every item of a proposal. There is no partial update.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::PersistenceError;
use crate::proposal::ProposalItem;

#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Current items of `proposal_id`.
    async fn get_proposal_items(&self, proposal_id: u64) -> Result<Vec<ProposalItem>, PersistenceError>;

    /// Replace all items of `proposal_id` with `items`.
    async fn replace_proposal_items(
        &self,
        proposal_id: u64,
        items: &[ProposalItem],
    ) -> Result<(), PersistenceError>;
}

#[async_trait]
impl<T: ProposalStore + ?Sized> ProposalStore for Arc<T> {
    async fn get_proposal_items(&self, proposal_id: u64) -> Result<Vec<ProposalItem>, PersistenceError> {
        (**self).get_proposal_items(proposal_id).await
    }

    async fn replace_proposal_items(
        &self,
        proposal_id: u64,
        items: &[ProposalItem],
    ) -> Result<(), PersistenceError> {
        (**self).replace_proposal_items(proposal_id, items).await
    }
}

/// Process-local store with last-write-wins semantics.
///
/// Items without an id get one on write, like the remote store does. Reads
/// and writes can be made to fail on demand to exercise reconciliation.
#[derive(Debug, Default)]
pub struct InMemoryProposalStore {
    proposals: Mutex<HashMap<u64, Vec<ProposalItem>>>,
    next_item_id: AtomicU64,
    failing_reads: AtomicU32,
    failing_writes: AtomicU32,
    writes: AtomicU32,
}

impl InMemoryProposalStore {
    pub fn new() -> Self {
        Self {
            next_item_id: AtomicU64::new(1),
            ..Self::default()
        }
    }

    /// Seed a proposal, assigning ids where missing.
    pub fn with_items(self, proposal_id: u64, items: Vec<ProposalItem>) -> Self {
        let items = self.assign_ids(items);
        self.lock().insert(proposal_id, items);
        self
    }

    /// Fail the next `n` reads.
    pub fn fail_next_reads(&self, n: u32) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    /// Fail the next `n` writes.
    pub fn fail_next_writes(&self, n: u32) {
        self.failing_writes.store(n, Ordering::SeqCst);
    }

    /// Successful writes so far.
    pub fn write_count(&self) -> u32 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Items as currently stored, bypassing failure injection.
    pub fn snapshot(&self, proposal_id: u64) -> Vec<ProposalItem> {
        self.lock().get(&proposal_id).cloned().unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, Vec<ProposalItem>>> {
        self.proposals.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn assign_ids(&self, items: Vec<ProposalItem>) -> Vec<ProposalItem> {
        let floor = items.iter().filter_map(|i| i.id).max().unwrap_or(0) + 1;
        self.next_item_id.fetch_max(floor, Ordering::SeqCst);
        items
            .into_iter()
            .map(|mut item| {
                if item.id.is_none() {
                    item.id = Some(self.next_item_id.fetch_add(1, Ordering::SeqCst));
                }
                item
            })
            .collect()
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl ProposalStore for InMemoryProposalStore {
    async fn get_proposal_items(&self, proposal_id: u64) -> Result<Vec<ProposalItem>, PersistenceError> {
        if Self::take_failure(&self.failing_reads) {
            return Err(PersistenceError::Rejected(format!("read of proposal {proposal_id} failed")));
        }
        Ok(self.snapshot(proposal_id))
    }

    async fn replace_proposal_items(
        &self,
        proposal_id: u64,
        items: &[ProposalItem],
    ) -> Result<(), PersistenceError> {
        if Self::take_failure(&self.failing_writes) {
            return Err(PersistenceError::Rejected(format!("write of proposal {proposal_id} failed")));
        }
        let items = self.assign_ids(items.to_vec());
        self.lock().insert(proposal_id, items);
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal::PeriodType;
    use chrono::NaiveDate;

    fn item(id: Option<u64>, id_ooh: u64) -> ProposalItem {
        ProposalItem {
            id,
            id_ooh,
            period_start: NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
            period_end: NaiveDate::from_ymd_opt(2026, 1, 25).unwrap(),
            period_type: PeriodType::BiWeekly,
            base_rental: 100.0,
            base_paper: 0.0,
            base_canvas: 0.0,
            daily_flow: 0,
            selected_period_ids: vec![],
            notes: String::new(),
        }
    }

    #[tokio::test]
    async fn replace_assigns_ids_after_existing_ones() {
        let store = InMemoryProposalStore::new().with_items(1, vec![item(Some(10), 1)]);
        store
            .replace_proposal_items(1, &[item(Some(10), 1), item(None, 2)])
            .await
            .unwrap();
        let items = store.get_proposal_items(1).await.unwrap();
        assert_eq!(items[0].id, Some(10));
        assert_eq!(items[1].id, Some(11));
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let store = InMemoryProposalStore::new();
        store.fail_next_writes(1);
        assert!(store.replace_proposal_items(1, &[]).await.is_err());
        assert!(store.replace_proposal_items(1, &[]).await.is_ok());
        store.fail_next_reads(2);
        assert!(store.get_proposal_items(1).await.is_err());
        assert!(store.get_proposal_items(1).await.is_err());
        assert!(store.get_proposal_items(1).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_proposal_reads_empty() {
        let store = InMemoryProposalStore::new();
        assert!(store.get_proposal_items(99).await.unwrap().is_empty());
    }
}
