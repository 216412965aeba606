mod config;

pub use config::{ApiConfig, Config, PeriodsConfig, PricingConfig};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/ooh-proposals[-dev]/` based on OOH_ENV.
///
/// Set OOH_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("OOH_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("ooh-proposals-dev")
    } else {
        base_dir.join("ooh-proposals")
    };

    std::fs::create_dir_all(&dir).map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
