//! Legality of period selections and billing-cycle quantities.
//!
//! Everything a picker produces goes through [`validate_selection`] before it
//! can reach pricing or the cart. The resulting [`ValidatedPeriod`] can only be
//! built here, so an unchecked range never becomes an item edit.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::grid::{is_last_day_of_month, last_day_of_month, monthly_end, BiWeeklyGrid, MonthlyDuration};
use super::monthly::{collapse_monthly_periods, MonthlyPeriod};
use crate::error::ValidationError;
use crate::proposal::{ItemPatch, PeriodType};

/// Custom monthly end check.
///
/// `end` must keep `start`'s day of month, or be the last day of a month
/// too short to contain that day (start on the 31st pairs with Feb 28/29).
pub fn is_valid_monthly_end(start: NaiveDate, end: NaiveDate) -> bool {
    if end <= start {
        return false;
    }
    if end.day() == start.day() {
        return true;
    }
    let end_month_len = last_day_of_month(end.year(), end.month()).unwrap_or(31);
    is_last_day_of_month(end) && start.day() > end_month_len
}

/// Inclusive day count of `[start, end]`.
fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}

/// Billing cycles covered by `days` elapsed days: `max(1, ceil(days / cycle))`.
pub fn quantity_for_days(days: i64, period_type: PeriodType) -> u32 {
    let cycle = period_type.cycle_days();
    if days <= 0 {
        return 1;
    }
    let cycles = (days + cycle - 1) / cycle;
    u32::try_from(cycles.max(1)).unwrap_or(u32::MAX)
}

/// Billing-cycle count for an item period. Not the elapsed day count used
/// for impacts.
pub fn quantity(start: NaiveDate, end: NaiveDate, period_type: PeriodType) -> u32 {
    quantity_for_days(inclusive_days(start, end), period_type)
}

/// Result of collapsing picked grid blocks into one interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiWeeklySelection {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Picked block ids, ordered by start date.
    pub ids: Vec<String>,
    /// Blocks between the first and last pick were left out; the interval
    /// still covers them.
    pub has_gaps: bool,
}

/// Envelope `[first.start, last.end]` of the picked blocks.
pub fn collapse_biweekly_selection<S: AsRef<str>>(
    grid: &BiWeeklyGrid,
    ids: &[S],
) -> Result<BiWeeklySelection, ValidationError> {
    let mut blocks = ids
        .iter()
        .map(|id| {
            grid.block_by_id(id.as_ref())
                .ok_or_else(|| ValidationError::UnknownPeriodId(id.as_ref().to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    blocks.sort_by_key(|b| b.start);
    blocks.dedup_by_key(|b| b.index);

    let (first, last) = match (blocks.first(), blocks.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Err(ValidationError::EmptySelection("no bi-weekly period selected".into())),
    };
    let has_gaps = blocks.windows(2).any(|w| w[1].index - w[0].index > 1);
    if has_gaps {
        tracing::debug!(
            first = %first.start,
            last = %last.end,
            "bi-weekly selection has gaps; collapsing to envelope"
        );
    }

    Ok(BiWeeklySelection {
        start: first.start,
        end: last.end,
        ids: blocks.iter().map(|b| b.id()).collect(),
        has_gaps,
    })
}

/// Raw output of a period picker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodSelection {
    /// Grid block ids toggled on in the bi-weekly picker.
    BiWeekly { ids: Vec<String> },
    /// Single monthly period from a start date and a duration.
    Monthly {
        start: NaiveDate,
        duration: MonthlyDuration,
    },
    /// Several monthly periods, some possibly toggled off.
    MonthlyPeriods { periods: Vec<MonthlyPeriod> },
}

/// A period that passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidatedPeriod {
    start: NaiveDate,
    end: NaiveDate,
    period_type: PeriodType,
    selected_period_ids: Vec<String>,
}

impl ValidatedPeriod {
    pub(crate) fn new(
        start: NaiveDate,
        end: NaiveDate,
        period_type: PeriodType,
        selected_period_ids: Vec<String>,
    ) -> Self {
        Self {
            start,
            end,
            period_type,
            selected_period_ids,
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn period_type(&self) -> PeriodType {
        self.period_type
    }

    pub fn selected_period_ids(&self) -> &[String] {
        &self.selected_period_ids
    }

    pub fn quantity(&self) -> u32 {
        quantity(self.start, self.end, self.period_type)
    }

    /// Item edit carrying this period.
    pub fn into_patch(self) -> ItemPatch {
        ItemPatch::period(self.start, self.end, self.period_type, self.selected_period_ids)
    }
}

/// Check a picker selection and turn it into a period.
pub fn validate_selection(
    grid: &BiWeeklyGrid,
    selection: &PeriodSelection,
) -> Result<ValidatedPeriod, ValidationError> {
    let result = match selection {
        PeriodSelection::BiWeekly { ids } => {
            let collapsed = collapse_biweekly_selection(grid, ids)?;
            Ok(ValidatedPeriod::new(
                collapsed.start,
                collapsed.end,
                PeriodType::BiWeekly,
                collapsed.ids,
            ))
        }
        PeriodSelection::Monthly { start, duration } => {
            let period = MonthlyPeriod::new(*start, *duration)?;
            Ok(ValidatedPeriod::new(
                period.start,
                period.end,
                PeriodType::Monthly,
                vec![period.id],
            ))
        }
        PeriodSelection::MonthlyPeriods { periods } => collapse_monthly_periods(periods),
    };
    if let Err(ref e) = result {
        tracing::warn!(error = %e, "rejected period selection");
    }
    result
}

/// Whether `end` is what a whole-month duration from `start` produces.
fn is_duration_end(start: NaiveDate, end: NaiveDate) -> bool {
    let span = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32;
    [span, span + 1]
        .into_iter()
        .filter_map(|m| u32::try_from(m).ok())
        .filter(|m| *m > 0)
        .any(|m| monthly_end(start, MonthlyDuration::Months(m)) == Some(end))
}

/// Invariants a stored item period must hold.
///
/// Bi-weekly ranges must sit on the grid. Monthly ranges must either pass
/// [`is_valid_monthly_end`] or end the day before a whole-month anniversary,
/// which is what the duration picker produces.
pub fn validate_item_period(
    grid: &BiWeeklyGrid,
    start: NaiveDate,
    end: NaiveDate,
    period_type: PeriodType,
) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::EndNotAfterStart { start, end });
    }
    match period_type {
        PeriodType::BiWeekly => {
            if grid.is_start(start) && grid.is_end(end) {
                Ok(())
            } else {
                Err(ValidationError::MisalignedBiWeekly { start, end })
            }
        }
        PeriodType::Monthly => check_monthly_range(start, end),
    }
}

/// Anchored-day rule for a stored monthly range: a valid custom end, or the
/// end a whole-month duration produces.
pub(crate) fn check_monthly_range(start: NaiveDate, end: NaiveDate) -> Result<(), ValidationError> {
    if end <= start {
        return Err(ValidationError::EndNotAfterStart { start, end });
    }
    if is_valid_monthly_end(start, end) || is_duration_end(start, end) {
        Ok(())
    } else {
        Err(ValidationError::MonthlyDayMismatch {
            start,
            end,
            anchor_day: start.day(),
        })
    }
}

/// Grid-aligned default for a new item: the next block from `today`.
pub fn default_biweekly_period(grid: &BiWeeklyGrid, today: NaiveDate) -> Option<ValidatedPeriod> {
    let block = grid.next_available(today)?;
    Some(ValidatedPeriod::new(
        block.start,
        block.end,
        PeriodType::BiWeekly,
        vec![block.id()],
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn monthly_end_same_day_is_valid() {
        assert!(is_valid_monthly_end(date(2026, 1, 15), date(2026, 2, 15)));
        assert!(is_valid_monthly_end(date(2026, 1, 15), date(2026, 7, 15)));
        assert!(!is_valid_monthly_end(date(2026, 1, 15), date(2026, 2, 14)));
    }

    #[test]
    fn monthly_end_clamps_for_short_months() {
        assert!(is_valid_monthly_end(date(2026, 1, 31), date(2026, 2, 28)));
        assert!(!is_valid_monthly_end(date(2026, 1, 31), date(2026, 2, 27)));
        assert!(is_valid_monthly_end(date(2028, 1, 31), date(2028, 2, 29)));
        assert!(is_valid_monthly_end(date(2026, 3, 31), date(2026, 4, 30)));
        // Day 30 exists in April, so April 30 is a same-day match, not a clamp
        assert!(is_valid_monthly_end(date(2026, 1, 30), date(2026, 4, 30)));
        // Day 29 exists in March, so the clamp does not apply
        assert!(!is_valid_monthly_end(date(2026, 1, 29), date(2026, 3, 31)));
    }

    #[test]
    fn monthly_end_rejects_non_increasing() {
        assert!(!is_valid_monthly_end(date(2026, 1, 15), date(2026, 1, 15)));
        assert!(!is_valid_monthly_end(date(2026, 2, 15), date(2026, 1, 15)));
    }

    #[test]
    fn quantity_examples() {
        let start = date(2026, 1, 12);
        assert_eq!(quantity(start, date(2026, 1, 25), PeriodType::BiWeekly), 1);
        assert_eq!(quantity(start, date(2026, 2, 8), PeriodType::BiWeekly), 2);
        assert_eq!(quantity(start, date(2026, 2, 9), PeriodType::BiWeekly), 3);
        assert_eq!(quantity(start, date(2026, 2, 10), PeriodType::Monthly), 1);
        assert_eq!(quantity(start, date(2026, 2, 11), PeriodType::Monthly), 2);
        assert_eq!(quantity(start, start, PeriodType::Monthly), 1);
    }

    proptest! {
        #[test]
        fn quantity_matches_ceiling_formula(days in 1i64..5_000) {
            let expected_bi = ((days as f64) / 14.0).ceil().max(1.0) as u32;
            let expected_mo = ((days as f64) / 30.0).ceil().max(1.0) as u32;
            prop_assert_eq!(quantity_for_days(days, PeriodType::BiWeekly), expected_bi);
            prop_assert_eq!(quantity_for_days(days, PeriodType::Monthly), expected_mo);
        }

        #[test]
        fn quantity_never_below_one(days in -100i64..1) {
            prop_assert_eq!(quantity_for_days(days, PeriodType::BiWeekly), 1);
            prop_assert_eq!(quantity_for_days(days, PeriodType::Monthly), 1);
        }
    }

    #[test]
    fn collapse_contiguous_blocks() {
        let grid = BiWeeklyGrid::default();
        let b1 = grid.block(1).unwrap();
        let b2 = grid.block(2).unwrap();
        let selection = collapse_biweekly_selection(&grid, &[b2.id(), b1.id()]).unwrap();
        assert_eq!(selection.start, b1.start);
        assert_eq!(selection.end, b2.end);
        assert_eq!(selection.ids, vec![b1.id(), b2.id()]);
        assert!(!selection.has_gaps);
    }

    #[test]
    fn collapse_disjoint_blocks_keeps_envelope() {
        let grid = BiWeeklyGrid::default();
        let b1 = grid.block(1).unwrap();
        let b4 = grid.block(4).unwrap();
        let selection = collapse_biweekly_selection(&grid, &[b1.id(), b4.id()]).unwrap();
        assert_eq!(selection.start, b1.start);
        assert_eq!(selection.end, b4.end);
        assert!(selection.has_gaps);
        assert_eq!(quantity(selection.start, selection.end, PeriodType::BiWeekly), 4);
    }

    #[test]
    fn collapse_rejects_empty_and_unknown() {
        let grid = BiWeeklyGrid::default();
        let empty: [&str; 0] = [];
        assert!(matches!(
            collapse_biweekly_selection(&grid, &empty),
            Err(ValidationError::EmptySelection(_))
        ));
        assert_eq!(
            collapse_biweekly_selection(&grid, &["2026-01-13_2026-01-26"]),
            Err(ValidationError::UnknownPeriodId("2026-01-13_2026-01-26".into()))
        );
    }

    #[test]
    fn validate_custom_monthly_selection() {
        let grid = BiWeeklyGrid::default();
        let ok = validate_selection(
            &grid,
            &PeriodSelection::Monthly {
                start: date(2027, 1, 31),
                duration: MonthlyDuration::Custom(date(2027, 2, 28)),
            },
        )
        .unwrap();
        assert_eq!(ok.period_type(), PeriodType::Monthly);
        assert_eq!(ok.selected_period_ids(), ["2027-01-31_2027-02-28".to_string()]);

        let err = validate_selection(
            &grid,
            &PeriodSelection::Monthly {
                start: date(2027, 1, 31),
                duration: MonthlyDuration::Custom(date(2027, 2, 27)),
            },
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::MonthlyDayMismatch { anchor_day: 31, .. }));
    }

    #[test]
    fn validate_duration_monthly_selection() {
        let grid = BiWeeklyGrid::default();
        let period = validate_selection(
            &grid,
            &PeriodSelection::Monthly {
                start: date(2026, 3, 10),
                duration: MonthlyDuration::Months(2),
            },
        )
        .unwrap();
        assert_eq!(period.end(), date(2026, 5, 9));
        assert_eq!(period.quantity(), 3);
    }

    #[test]
    fn item_period_invariants() {
        let grid = BiWeeklyGrid::default();
        assert!(validate_item_period(&grid, date(2026, 1, 12), date(2026, 1, 25), PeriodType::BiWeekly).is_ok());
        assert!(matches!(
            validate_item_period(&grid, date(2026, 1, 13), date(2026, 1, 26), PeriodType::BiWeekly),
            Err(ValidationError::MisalignedBiWeekly { .. })
        ));
        assert!(matches!(
            validate_item_period(&grid, date(2026, 1, 25), date(2026, 1, 12), PeriodType::BiWeekly),
            Err(ValidationError::EndNotAfterStart { .. })
        ));
        assert!(validate_item_period(&grid, date(2026, 1, 15), date(2026, 2, 15), PeriodType::Monthly).is_ok());
        assert!(validate_item_period(&grid, date(2026, 1, 15), date(2026, 2, 14), PeriodType::Monthly).is_ok());
        assert!(validate_item_period(&grid, date(2026, 1, 15), date(2026, 2, 10), PeriodType::Monthly).is_err());
    }

    #[test]
    fn default_period_is_next_block() {
        let grid = BiWeeklyGrid::default();
        let period = default_biweekly_period(&grid, date(2026, 1, 13)).unwrap();
        assert_eq!(period.start(), date(2026, 1, 26));
        assert_eq!(period.end(), date(2026, 2, 8));
        assert_eq!(period.quantity(), 1);
    }
}
