//! Proposal cart: persistence collaborators and the sync coordinator.

pub mod catalog;
pub mod coordinator;
pub mod http;
pub mod observer;
pub mod store;

pub use catalog::{seed_item, CatalogProduct, PlacementCatalog, PlacementProducts, StaticCatalog};
pub use coordinator::{CartSyncCoordinator, SaveOutcome};
pub use http::HttpProposalStore;
pub use observer::{ProposalObserver, RecordingObserver};
pub use store::{InMemoryProposalStore, ProposalStore};
