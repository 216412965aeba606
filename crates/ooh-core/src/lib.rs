//! # OOH Proposals Core Library
//!
//! This library provides the pricing and period engine behind out-of-home
//! advertising proposals. A proposal groups billboard placements for one
//! client under a commission tier; this crate decides which date ranges may
//! be booked, prices every item, and keeps a proposal cart in sync with the
//! remote store. The `ooh-cli` binary is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Periods**: Lazily generated 14-day grid and anchored monthly periods,
//!   with the validation rules for picker selections
//! - **Pricing**: Commission tiers, material markups and billing quantity
//! - **Impact**: Audience reach and cost per thousand impacts
//! - **Cart**: Draft overlay over canonical items, replace-all writes and
//!   refetch-based reconciliation
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`BiWeeklyGrid`]: Bi-weekly period generator
//! - [`validate_selection`]: Picker selection to validated period
//! - [`compute_item_values`]: Per-item pricing
//! - [`CartSyncCoordinator`]: Proposal cart synchronization
//! - [`Config`]: Application configuration management

pub mod cart;
pub mod error;
pub mod impact;
pub mod period;
pub mod pricing;
pub mod proposal;
pub mod storage;

pub use cart::{CartSyncCoordinator, HttpProposalStore, InMemoryProposalStore, ProposalStore, SaveOutcome};
pub use error::{CartError, ConfigError, CoreError, PersistenceError, ValidationError};
pub use period::{BiWeeklyGrid, BiWeeklyPeriod, MonthlyDuration, MonthlyPeriod, PeriodSelection, ValidatedPeriod, validate_selection};
pub use pricing::{aggregate, compute_item_values, quote, CommissionTier, ItemValues, ProposalQuote, ProposalTotals};
pub use proposal::{ItemField, ItemPatch, PeriodType, Proposal, ProposalItem};
pub use storage::Config;
