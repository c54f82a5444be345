//! Calendar helpers.
//!
//! Lags are expressed in calendar months. Fractions of a month, where they
//! matter (discounting), use 30-day months.

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Days in the month used for fractional month arithmetic.
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Adds `months` calendar months to `date`, clamping the day to the end of
/// the target month (Jan 31 + 1 month = Feb 28/29).
#[must_use]
pub fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months))
        .unwrap_or(NaiveDate::MAX)
}

/// Signed number of months from `from` to `to`.
///
/// Whole calendar months are counted first; leftover days are converted
/// with `days_per_month`. `2019-01-01 → 2021-01-01` is exactly 24.0.
#[must_use]
pub fn months_between(from: NaiveDate, to: NaiveDate, days_per_month: f64) -> f64 {
    if to < from {
        return -months_between(to, from, days_per_month);
    }

    let mut whole = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    let mut anchor = add_months(from, whole.max(0) as u32);
    if anchor > to {
        whole -= 1;
        anchor = add_months(from, whole.max(0) as u32);
    }

    let leftover_days = (to - anchor).num_days() as f64;
    f64::from(whole) + leftover_days / days_per_month
}

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns `ValidationError::InvalidField` if the text is not a valid date.
pub fn parse_date(field: &'static str, text: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d").map_err(|e| ValidationError::InvalidField {
        field,
        reason: format!("'{}' is not a YYYY-MM-DD date: {e}", text.trim()),
    })
}

/// An inclusive range of calendar years.
///
/// # Examples
///
/// ```
/// use fi_forecast::YearRange;
///
/// let window = YearRange::new(2025, 2027).unwrap();
/// assert!(window.contains(2026));
/// assert_eq!(window.years().count(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct YearRange {
    /// First year (inclusive).
    pub start: i32,

    /// Last year (inclusive).
    pub end: i32,
}

impl YearRange {
    /// Creates a year range.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidField` if `start > end`.
    pub fn new(start: i32, end: i32) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidField {
                field: "year_range",
                reason: format!("start ({start}) must not be after end ({end})"),
            });
        }
        Ok(Self { start, end })
    }

    /// True if `year` lies in the range, inclusive.
    #[must_use]
    pub const fn contains(&self, year: i32) -> bool {
        year >= self.start && year <= self.end
    }

    /// Every year in the range, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> {
        self.start..=self.end
    }

    /// Number of years covered; zero for an inverted range.
    #[must_use]
    pub fn len(&self) -> usize {
        usize::try_from(i64::from(self.end) - i64::from(self.start) + 1).unwrap_or(0)
    }

    /// True when `end` precedes `start`, which only a deserialized value can hold.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.end < self.start
    }
}

impl std::fmt::Display for YearRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}–{}", self.start, self.end)
    }
}
