//! Calendar-day interval math.
//!
//! All intervals are inclusive on both ends: a one-day task occupies exactly
//! one calendar day. Dates carry no time zone; arithmetic is plain day
//! counting on `NaiveDate`.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// An inclusive range of calendar days
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Build the interval covered by a task starting on `start` lasting `days`.
///
/// `end = start + (days - 1)`. A zero duration is treated as one day so the
/// interval is never inverted.
pub fn interval(start: NaiveDate, days: u32) -> DayInterval {
    let span = u64::from(days.max(1) - 1);
    let end = start.checked_add_days(Days::new(span)).unwrap_or(NaiveDate::MAX);
    DayInterval { start, end }
}

/// Signed number of whole days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

impl DayInterval {
    /// Interval from explicit bounds; `None` when `end < start`
    pub fn from_bounds(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Number of days covered (always at least 1)
    pub fn len_days(&self) -> i64 {
        days_between(self.start, self.end) + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// True when `other` lies entirely within this interval
    pub fn contains_interval(&self, other: &DayInterval) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: &DayInterval) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Smallest interval covering both
    pub fn union(&self, other: &DayInterval) -> DayInterval {
        DayInterval {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Overlapping part of two intervals, if any
    pub fn intersection(&self, other: &DayInterval) -> Option<DayInterval> {
        DayInterval::from_bounds(self.start.max(other.start), self.end.min(other.end))
    }

    /// Clamp to a month, returning 1-based day-of-month bounds
    pub fn clamp_to_month(&self, month: &MonthWindow) -> Option<MonthSpan> {
        let clipped = self.intersection(&month.as_interval())?;
        Some(MonthSpan {
            start_day: clipped.start.day(),
            end_day: clipped.end.day(),
        })
    }
}

/// Overlap of two intervals
pub fn overlaps(a: &DayInterval, b: &DayInterval) -> bool {
    a.overlaps(b)
}

/// A calendar month used as a reference window
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MonthWindow {
    pub year: i32,
    pub month: u32,
}

impl MonthWindow {
    /// Month window; `None` if `month` is not in 1..=12
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|_| Self { year, month })
    }

    /// Month containing `date`
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        self.next().first_day().pred_opt().unwrap_or(NaiveDate::MAX)
    }

    pub fn days_in_month(&self) -> u32 {
        self.last_day().day()
    }

    pub fn as_interval(&self) -> DayInterval {
        DayInterval {
            start: self.first_day(),
            end: self.last_day(),
        }
    }

    /// Date for a 1-based day of this month
    pub fn day(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }

    pub fn next(&self) -> Self {
        if self.month == 12 {
            Self { year: self.year + 1, month: 1 }
        } else {
            Self { year: self.year, month: self.month + 1 }
        }
    }

    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year - 1, month: 12 }
        } else {
            Self { year: self.year, month: self.month - 1 }
        }
    }
}

impl std::fmt::Display for MonthWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl std::str::FromStr for MonthWindow {
    type Err = crate::PlanError;

    /// Parse `YYYY-MM`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || crate::PlanError::InvalidValue {
            kind: "month",
            value: s.to_string(),
        };
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        MonthWindow::new(year, month).ok_or_else(invalid)
    }
}

/// 1-based, inclusive day-of-month range inside a [`MonthWindow`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSpan {
    pub start_day: u32,
    pub end_day: u32,
}
