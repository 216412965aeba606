use std::sync::Mutex;

use crate::proposal::Proposal;

/// One-way listener for proposal snapshots (map markers, summaries).
///
/// Called synchronously after every refetch, and right away on an
/// optimistic removal. Observers never feed anything back.
pub trait ProposalObserver: Send + Sync {
    fn proposal_changed(&self, proposal: &Proposal);
}

/// Observer that keeps every snapshot it receives.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    snapshots: Mutex<Vec<Proposal>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<Proposal> {
        self.snapshots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn last(&self) -> Option<Proposal> {
        self.snapshots().pop()
    }
}

impl ProposalObserver for RecordingObserver {
    fn proposal_changed(&self, proposal: &Proposal) {
        self.snapshots
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(proposal.clone());
    }
}
