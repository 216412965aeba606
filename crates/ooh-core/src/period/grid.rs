//! Canonical period generation.
//!
//! Bi-weekly ("bissemanal") periods are 14-day blocks laid end to end from a
//! fixed epoch; block `i` covers `[epoch + 14i, epoch + 14i + 13]`. The grid
//! is generated lazily, so callers take as many blocks as they need instead of
//! reading from a pre-materialized table.
//!
//! Monthly periods have no grid: their end is derived from the start date and
//! a month count, or supplied directly by the caller.

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Block length in days.
pub const BIWEEKLY_DAYS: i64 = 14;

/// First day of the first bi-weekly block (BI 02).
pub fn default_biweekly_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 12, 29).unwrap_or(NaiveDate::MIN)
}

/// One 14-day block of the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BiWeeklyPeriod {
    /// 0-based position from the epoch.
    pub index: u32,
    /// Even cycle number: 2 for the first block, +2 per block.
    pub number: u32,
    /// Calendar year of `start`.
    pub year: i32,
    pub start: NaiveDate,
    /// Inclusive last day (`start + 13`).
    pub end: NaiveDate,
}

impl BiWeeklyPeriod {
    /// Stable id, `"<start>_<end>"`.
    pub fn id(&self) -> String {
        super::period_id(self.start, self.end)
    }

    /// Display label, e.g. `BI 02/2025`.
    pub fn label(&self) -> String {
        format!("BI {:02}/{}", self.number, self.year)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Lazy generator of the bi-weekly grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BiWeeklyGrid {
    epoch: NaiveDate,
}

impl Default for BiWeeklyGrid {
    fn default() -> Self {
        Self::new(default_biweekly_epoch())
    }
}

impl BiWeeklyGrid {
    pub fn new(epoch: NaiveDate) -> Self {
        Self { epoch }
    }

    pub fn epoch(&self) -> NaiveDate {
        self.epoch
    }

    /// Block at `index`, or `None` past the end of the calendar.
    pub fn block(&self, index: u32) -> Option<BiWeeklyPeriod> {
        let start = self
            .epoch
            .checked_add_signed(Duration::days(BIWEEKLY_DAYS * i64::from(index)))?;
        let end = start.checked_add_signed(Duration::days(BIWEEKLY_DAYS - 1))?;
        Some(BiWeeklyPeriod {
            index,
            number: index.checked_add(1)?.checked_mul(2)?,
            year: start.year(),
            start,
            end,
        })
    }

    /// Unbounded iterator over the grid starting at `first_index`.
    pub fn iter_from(&self, first_index: u32) -> BiWeeklyIter {
        BiWeeklyIter {
            grid: *self,
            next: Some(first_index),
        }
    }

    pub fn iter(&self) -> BiWeeklyIter {
        self.iter_from(0)
    }

    /// The first `n` blocks from the epoch.
    pub fn first(&self, n: usize) -> Vec<BiWeeklyPeriod> {
        self.iter().take(n).collect()
    }

    /// Days from the epoch to `date` (negative before the epoch).
    fn offset_days(&self, date: NaiveDate) -> i64 {
        (date - self.epoch).num_days()
    }

    /// Index of the block containing `date`.
    pub fn index_of(&self, date: NaiveDate) -> Option<u32> {
        let offset = self.offset_days(date);
        if offset < 0 {
            return None;
        }
        u32::try_from(offset / BIWEEKLY_DAYS).ok()
    }

    pub fn block_containing(&self, date: NaiveDate) -> Option<BiWeeklyPeriod> {
        self.index_of(date).and_then(|i| self.block(i))
    }

    /// Up to `count` blocks whose end is on or after `from`, in order.
    pub fn window(&self, from: NaiveDate, count: usize) -> Vec<BiWeeklyPeriod> {
        let first = self.index_of(from).unwrap_or(0);
        self.iter_from(first).take(count).collect()
    }

    /// Resolve a `"<start>_<end>"` id back to its block.
    pub fn block_by_id(&self, id: &str) -> Option<BiWeeklyPeriod> {
        let (start, end) = super::parse_period_id(id).ok()?;
        let block = self.block_containing(start)?;
        (block.start == start && block.end == end).then_some(block)
    }

    pub fn is_start(&self, date: NaiveDate) -> bool {
        let offset = self.offset_days(date);
        offset >= 0 && offset % BIWEEKLY_DAYS == 0
    }

    pub fn is_end(&self, date: NaiveDate) -> bool {
        let offset = self.offset_days(date);
        offset >= BIWEEKLY_DAYS - 1 && (offset - (BIWEEKLY_DAYS - 1)) % BIWEEKLY_DAYS == 0
    }

    /// First block start on or after `from`.
    pub fn next_start(&self, from: NaiveDate) -> Option<NaiveDate> {
        let offset = self.offset_days(from);
        if offset <= 0 {
            return Some(self.epoch);
        }
        let blocks = (offset + BIWEEKLY_DAYS - 1) / BIWEEKLY_DAYS;
        self.epoch
            .checked_add_signed(Duration::days(blocks * BIWEEKLY_DAYS))
    }

    /// Matching block end for a grid-aligned `start`.
    pub fn suggested_end(&self, start: NaiveDate) -> Option<NaiveDate> {
        if !self.is_start(start) {
            return None;
        }
        start.checked_add_signed(Duration::days(BIWEEKLY_DAYS - 1))
    }

    /// Next block that starts on or after `from`.
    pub fn next_available(&self, from: NaiveDate) -> Option<BiWeeklyPeriod> {
        self.next_start(from).and_then(|s| self.block_containing(s))
    }
}

/// Iterator returned by [`BiWeeklyGrid::iter`].
#[derive(Debug, Clone)]
pub struct BiWeeklyIter {
    grid: BiWeeklyGrid,
    next: Option<u32>,
}

impl Iterator for BiWeeklyIter {
    type Item = BiWeeklyPeriod;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        let block = self.grid.block(index);
        self.next = if block.is_some() {
            index.checked_add(1)
        } else {
            None
        };
        block
    }
}

/// `n` sequential blocks from the default epoch.
pub fn biweekly_grid(n: usize) -> Vec<BiWeeklyPeriod> {
    BiWeeklyGrid::default().first(n)
}

/// Number of months a monthly period lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyDuration {
    Months(u32),
    /// End supplied by the caller; validated by
    /// [`super::validator::is_valid_monthly_end`].
    Custom(NaiveDate),
}

/// Calendar month addition; the day is clamped to the target month's length.
pub fn add_months(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    date.checked_add_months(Months::new(months))
}

pub fn last_day_of_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = add_months(first, 1)?;
    next.pred_opt().map(|d| d.day())
}

pub fn is_last_day_of_month(date: NaiveDate) -> bool {
    last_day_of_month(date.year(), date.month()) == Some(date.day())
}

/// `add_months(start, n) - 1 day`, or the caller's end for `Custom`.
pub fn monthly_end(start: NaiveDate, duration: MonthlyDuration) -> Option<NaiveDate> {
    match duration {
        MonthlyDuration::Months(0) => None,
        MonthlyDuration::Months(n) => add_months(start, n)?.pred_opt(),
        MonthlyDuration::Custom(end) => Some(end),
    }
}

/// Anchored ends 1..=`months_ahead` months after `start`.
///
/// Each option keeps `start`'s day of month, or the last day of the target
/// month when that day does not exist there.
pub fn monthly_end_options(start: NaiveDate, months_ahead: u32) -> Vec<NaiveDate> {
    (1..=months_ahead)
        .map_while(|i| add_months(start, i))
        .collect()
}

/// One anchored month after `start`.
pub fn suggested_monthly_end(start: NaiveDate) -> Option<NaiveDate> {
    add_months(start, 1)
}
