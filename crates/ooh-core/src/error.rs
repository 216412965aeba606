//! Core error types for ooh-core.
//!
//! This module defines the error hierarchy using thiserror. Validation
//! failures are raised at the period-selection boundary, before anything
//! reaches pricing or the cart coordinator. Persistence failures come from
//! the remote store collaborator and always trigger a reconciling refetch.

use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

/// Core error type for ooh-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Cart synchronization errors
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Unknown dot-path key
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Home/config directory could not be prepared
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Illegal period selections and malformed item input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// End date not strictly after the start date
    #[error("Invalid period: end ({end}) must be after start ({start})")]
    EndNotAfterStart { start: NaiveDate, end: NaiveDate },

    /// Monthly end does not share the start's day of month
    #[error("Invalid monthly period: end {end} is not anchored to day {anchor_day} of {start}")]
    MonthlyDayMismatch {
        start: NaiveDate,
        end: NaiveDate,
        anchor_day: u32,
    },

    /// Bi-weekly dates off the 14-day grid
    #[error("Bi-weekly period {start}..{end} is not aligned to the 14-day grid")]
    MisalignedBiWeekly { start: NaiveDate, end: NaiveDate },

    /// A selected period id does not map to a known block
    #[error("Unknown period id: {0}")]
    UnknownPeriodId(String),

    /// Nothing was selected in a picker
    #[error("Empty selection: {0}")]
    EmptySelection(String),

    /// Date text that does not parse as YYYY-MM-DD
    #[error("Malformed date '{0}', expected YYYY-MM-DD")]
    MalformedDate(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Failures of the remote proposal store.
#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store responded with {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid store URL: {0}")]
    Url(#[from] url::ParseError),

    /// Collaborator-level rejection (in-memory store, test doubles)
    #[error("Store rejected the request: {0}")]
    Rejected(String),
}

/// Errors surfaced by cart coordinator actions.
#[derive(Error, Debug)]
pub enum CartError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Persistence failed: {0}")]
    Persistence(#[from] PersistenceError),

    /// Target item vanished from canonical state (removed elsewhere)
    #[error("Item {item_id} is not in the proposal")]
    NotFound { item_id: u64 },

    /// Placement already present in the cart
    #[error("Placement {id_ooh} is already in the proposal")]
    DuplicatePlacement { id_ooh: u64 },

    /// Another save/remove is still in flight
    #[error("Another cart operation is in progress")]
    Busy,

    #[error("Catalog lookup failed: {0}")]
    Catalog(String),
}

impl CartError {
    /// Whether canonical state has to be refetched after this error.
    ///
    /// Store writes (save, remove, add) refetch before returning. Staging an
    /// edit does no I/O: a `NotFound` from `edit` or `set_period` only marks
    /// the cart with `needs_refresh`, and the caller runs `refresh`.
    pub fn triggers_refetch(&self) -> bool {
        matches!(self, CartError::Persistence(_) | CartError::NotFound { .. })
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
