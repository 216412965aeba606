pub mod cart;
pub mod config;
pub mod grid;
pub mod period;
pub mod quote;

use chrono::NaiveDate;

/// `--from` / `--today` fallback: the local calendar date.
pub(crate) fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
