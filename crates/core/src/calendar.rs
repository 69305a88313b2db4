//! Calendar arithmetic shared by the scheduler and the accrual ledger.
//!
//! All date math that has to survive month-length differences, leap years,
//! and year rollover is concentrated here.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// A calendar month within a specific year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    /// Calendar year.
    pub year: i32,
    /// Month number, 1-12.
    pub month: u32,
}

impl YearMonth {
    /// Creates a year-month, returning `None` when `month` is outside 1-12.
    #[must_use]
    pub const fn new(year: i32, month: u32) -> Option<Self> {
        if month >= 1 && month <= 12 {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The year-month containing `date`.
    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The following calendar month, rolling into January of the next year
    /// after December.
    #[must_use]
    pub const fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Label in `YYYY-MM` form (e.g., "2024-03").
    #[must_use]
    pub fn label(self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive range of months from `from` to `to`, oldest first.
///
/// Returns an empty vector when `from` is after `to`.
#[must_use]
pub fn months_inclusive(from: YearMonth, to: YearMonth) -> Vec<YearMonth> {
    let mut months = Vec::new();
    let mut current = from;
    while current <= to {
        months.push(current);
        current = current.next();
    }
    months
}

/// Adds `offset` months to (`year`, `month`), normalizing past December.
///
/// A quarterly rule with offset 2 applied to Q4 (end month 12) must land in
/// February of the next year, never "month 14".
#[must_use]
pub const fn add_months(year: i32, month: u32, offset: u32) -> (i32, u32) {
    let mut year = year;
    let mut month = month + offset;
    while month > 12 {
        month -= 12;
        year += 1;
    }
    (year, month)
}

/// Returns the last day of a month.
#[must_use]
pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };

    // Month is always 1-12 here; `YearMonth` and rule validation enforce it
    // upstream, so the fallback is unreachable in practice.
    next_month.and_then(|d| d.pred_opt()).unwrap_or(NaiveDate::MAX)
}

/// Builds a date in (`year`, `month`), clamping `day` to the month's last
/// valid day when it overshoots (day 31 in April becomes April 30).
#[must_use]
pub fn clamp_day(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_else(|| last_day_of_month(year, month))
}

/// The end month of a calendar quarter (Q1 => March, ..., Q4 => December).
#[must_use]
pub const fn quarter_end_month(quarter: u8) -> u32 {
    quarter as u32 * 3
}

/// Returns month name.
#[must_use]
pub fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        12 => "December",
        _ => "Unknown",
    }
}
