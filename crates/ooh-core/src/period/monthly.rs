//! User-defined monthly periods for multi-period selections.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::grid::{last_day_of_month, monthly_end, MonthlyDuration};
use super::validator::{check_monthly_range, is_valid_monthly_end, ValidatedPeriod};
use super::{parse_period_id, period_id};
use crate::error::ValidationError;
use crate::proposal::PeriodType;

/// One monthly sub-period the user added to an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPeriod {
    pub id: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Calendar months touched, at least 1.
    pub months: u32,
    pub enabled: bool,
}

/// Calendar months spanned by `[start, end]`, counting both ends' months.
pub fn month_count(start: NaiveDate, end: NaiveDate) -> u32 {
    let diff = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    u32::try_from(diff + 1).unwrap_or(0).max(1)
}

impl MonthlyPeriod {
    /// Build a period from a start date and a duration.
    ///
    /// Whole-month durations end the day before the anniversary. Custom ends
    /// must pass [`is_valid_monthly_end`].
    pub fn new(start: NaiveDate, duration: MonthlyDuration) -> Result<Self, ValidationError> {
        let end = match duration {
            MonthlyDuration::Months(n) => {
                monthly_end(start, duration).ok_or_else(|| ValidationError::InvalidValue {
                    field: "duration".into(),
                    message: format!("cannot derive a monthly end from {start} + {n} months"),
                })?
            }
            MonthlyDuration::Custom(end) => {
                if end <= start {
                    return Err(ValidationError::EndNotAfterStart { start, end });
                }
                if !is_valid_monthly_end(start, end) {
                    return Err(ValidationError::MonthlyDayMismatch {
                        start,
                        end,
                        anchor_day: start.day(),
                    });
                }
                end
            }
        };
        Ok(Self::spanning(start, end))
    }

    fn spanning(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            id: period_id(start, end),
            start,
            end,
            months: month_count(start, end),
            enabled: true,
        }
    }

    /// Rebuild a period from a stored id.
    ///
    /// Accepts `"<start>_<end>"` and the older `"YYYY-MM"` form, which stands
    /// for that whole calendar month.
    pub fn from_id(id: &str) -> Result<Self, ValidationError> {
        if let Ok((start, end)) = parse_period_id(id) {
            check_monthly_range(start, end)?;
            return Ok(Self::spanning(start, end));
        }
        let (year, month) = id
            .split_once('-')
            .and_then(|(y, m)| Some((y.parse::<i32>().ok()?, m.parse::<u32>().ok()?)))
            .ok_or_else(|| ValidationError::UnknownPeriodId(id.to_string()))?;
        let start = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| ValidationError::UnknownPeriodId(id.to_string()))?;
        let end = last_day_of_month(year, month)
            .and_then(|d| NaiveDate::from_ymd_opt(year, month, d))
            .ok_or_else(|| ValidationError::UnknownPeriodId(id.to_string()))?;
        Ok(Self::spanning(start, end))
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }
}

/// Collapse the enabled periods into one item period.
///
/// Like the bi-weekly picker, the item interval is the envelope of the
/// enabled periods; the individual ids are kept in `selected_period_ids`.
/// Each enabled period and the envelope itself must keep the anchored day.
pub fn collapse_monthly_periods(periods: &[MonthlyPeriod]) -> Result<ValidatedPeriod, ValidationError> {
    let mut enabled: Vec<&MonthlyPeriod> = periods.iter().filter(|p| p.enabled).collect();
    if enabled.is_empty() {
        return Err(ValidationError::EmptySelection("no monthly period enabled".into()));
    }
    for period in &enabled {
        check_monthly_range(period.start, period.end)?;
    }
    enabled.sort_by_key(|p| p.start);

    let start = enabled[0].start;
    let end = enabled.iter().map(|p| p.end).max().unwrap_or(start);
    check_monthly_range(start, end)?;
    let ids = enabled.iter().map(|p| p.id.clone()).collect();
    Ok(ValidatedPeriod::new(start, end, PeriodType::Monthly, ids))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn month_count_spans_calendar_months() {
        assert_eq!(month_count(date(2026, 1, 15), date(2026, 2, 14)), 2);
        assert_eq!(month_count(date(2026, 1, 1), date(2026, 1, 31)), 1);
        assert_eq!(month_count(date(2026, 11, 1), date(2027, 2, 28)), 4);
    }

    #[test]
    fn duration_periods_end_before_anniversary() {
        let p = MonthlyPeriod::new(date(2026, 1, 1), MonthlyDuration::Months(1)).unwrap();
        assert_eq!(p.end, date(2026, 1, 31));
        assert_eq!(p.months, 1);
        assert_eq!(p.id, "2026-01-01_2026-01-31");
        assert!(p.enabled);
    }

    #[test]
    fn custom_period_rejects_unanchored_end() {
        let err = MonthlyPeriod::new(date(2026, 1, 31), MonthlyDuration::Custom(date(2026, 2, 27)))
            .unwrap_err();
        assert!(matches!(err, ValidationError::MonthlyDayMismatch { .. }));
        let err = MonthlyPeriod::new(date(2026, 1, 31), MonthlyDuration::Custom(date(2026, 1, 1)))
            .unwrap_err();
        assert!(matches!(err, ValidationError::EndNotAfterStart { .. }));
    }

    #[test]
    fn from_id_accepts_both_id_forms() {
        let p = MonthlyPeriod::from_id("2026-03-10_2026-04-10").unwrap();
        assert_eq!(p.start, date(2026, 3, 10));
        let legacy = MonthlyPeriod::from_id("2026-02").unwrap();
        assert_eq!(legacy.start, date(2026, 2, 1));
        assert_eq!(legacy.end, date(2026, 2, 28));
        assert!(MonthlyPeriod::from_id("2026-13").is_err());
        assert!(MonthlyPeriod::from_id("soon").is_err());
    }

    #[test]
    fn collapse_uses_enabled_periods_only() {
        let a = MonthlyPeriod::new(date(2026, 5, 1), MonthlyDuration::Months(1)).unwrap();
        let mut b = MonthlyPeriod::new(date(2026, 8, 1), MonthlyDuration::Months(1)).unwrap();
        let c = MonthlyPeriod::new(date(2026, 3, 1), MonthlyDuration::Months(1)).unwrap();
        b.toggle();

        let period = collapse_monthly_periods(&[a.clone(), b, c.clone()]).unwrap();
        assert_eq!(period.start(), date(2026, 3, 1));
        assert_eq!(period.end(), date(2026, 5, 31));
        assert_eq!(period.selected_period_ids(), [c.id, a.id]);
    }

    #[test]
    fn collapse_rejects_hand_built_unanchored_period() {
        let loose = MonthlyPeriod {
            id: "2026-01-03_2026-01-20".into(),
            start: date(2026, 1, 3),
            end: date(2026, 1, 20),
            months: 1,
            enabled: true,
        };
        let err = collapse_monthly_periods(&[loose]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MonthlyDayMismatch { anchor_day: 3, .. }
        ));
    }

    #[test]
    fn collapse_rejects_envelope_losing_the_anchor() {
        // Jan 15 + 1 month and Mar 31..Apr 30 are each fine; Jan 15..Apr 30 is not
        let a = MonthlyPeriod::new(date(2026, 1, 15), MonthlyDuration::Months(1)).unwrap();
        let b = MonthlyPeriod::new(date(2026, 3, 31), MonthlyDuration::Custom(date(2026, 4, 30))).unwrap();
        let err = collapse_monthly_periods(&[a, b]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::MonthlyDayMismatch { anchor_day: 15, .. }
        ));
    }

    #[test]
    fn from_id_rejects_unanchored_range() {
        assert!(matches!(
            MonthlyPeriod::from_id("2026-01-03_2026-01-20"),
            Err(ValidationError::MonthlyDayMismatch { .. })
        ));
    }

    #[test]
    fn collapse_with_everything_disabled_fails() {
        let mut a = MonthlyPeriod::new(date(2026, 5, 1), MonthlyDuration::Months(1)).unwrap();
        a.toggle();
        assert!(matches!(
            collapse_monthly_periods(&[a]),
            Err(ValidationError::EmptySelection(_))
        ));
    }
}
