//! Commercial periods: the bi-weekly grid, anchored monthly periods, and the
//! rules deciding which date ranges may be selected.

pub mod grid;
pub mod label;
pub mod monthly;
pub mod validator;

pub use grid::{
    add_months, biweekly_grid, default_biweekly_epoch, last_day_of_month, monthly_end,
    monthly_end_options, suggested_monthly_end, BiWeeklyGrid, BiWeeklyPeriod, MonthlyDuration,
};
pub use label::{describe_duration, format_date_extended, format_period_extended};
pub use monthly::{collapse_monthly_periods, MonthlyPeriod};
pub use validator::{
    collapse_biweekly_selection, is_valid_monthly_end, quantity, validate_item_period,
    validate_selection, BiWeeklySelection, PeriodSelection, ValidatedPeriod,
};

use chrono::NaiveDate;

use crate::error::ValidationError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a `YYYY-MM-DD` date typed by the user.
pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::MalformedDate(raw.to_string()))
}

/// Id shared by grid blocks and monthly periods: `"<start>_<end>"`.
pub fn period_id(start: NaiveDate, end: NaiveDate) -> String {
    format!("{}_{}", start.format(DATE_FORMAT), end.format(DATE_FORMAT))
}

pub fn parse_period_id(id: &str) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let (start, end) = id
        .split_once('_')
        .ok_or_else(|| ValidationError::UnknownPeriodId(id.to_string()))?;
    let start = parse_date(start).map_err(|_| ValidationError::UnknownPeriodId(id.to_string()))?;
    let end = parse_date(end).map_err(|_| ValidationError::UnknownPeriodId(id.to_string()))?;
    Ok((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_id_round_trip() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 12).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 1, 25).unwrap();
        let id = period_id(start, end);
        assert_eq!(id, "2026-01-12_2026-01-25");
        assert_eq!(parse_period_id(&id).unwrap(), (start, end));
    }

    #[test]
    fn malformed_inputs_are_rejected() {
        assert_eq!(
            parse_date("31/01/2026"),
            Err(ValidationError::MalformedDate("31/01/2026".into()))
        );
        assert!(parse_period_id("2026-01-12").is_err());
        assert!(parse_period_id("2026-01-12_nope").is_err());
    }
}
