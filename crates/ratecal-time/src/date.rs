//! `Date`: a calendar date backed by [`chrono::NaiveDate`].
//!
//! Period arithmetic follows market practice: adding months or years to a
//! date that does not exist in the target month (e.g. 31 January + 1M)
//! clamps to the last day of that month.

use crate::period::Period;
use crate::time_unit::TimeUnit;
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use ratecal_core::errors::{Error, Result};
use std::fmt;
use std::ops::{Add, Sub};

/// A calendar date.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(NaiveDate);

impl Date {
    /// Create a date from year, month (1–12) and day (1–31).
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(|| Error::InvalidArgument(format!("invalid date {year}-{month}-{day}")))
    }

    /// Wrap an existing `NaiveDate`.
    pub fn from_naive(d: NaiveDate) -> Self {
        Self(d)
    }

    /// The underlying `NaiveDate`.
    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    /// Calendar year.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month of the year (1–12).
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Day of the month (1–31).
    pub fn day_of_month(&self) -> u32 {
        self.0.day()
    }

    /// Whether the date falls on a Saturday or Sunday.
    pub fn is_weekend(&self) -> bool {
        matches!(self.0.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Signed number of days from `self` to `other`.
    pub fn days_until(&self, other: Date) -> i64 {
        other.0.signed_duration_since(self.0).num_days()
    }

    /// Shift the date by `n` units of `unit` (no business-day adjustment).
    pub fn advance(&self, n: i32, unit: TimeUnit) -> Result<Date> {
        let shifted = match unit {
            TimeUnit::Days => shift_days(self.0, i64::from(n)),
            TimeUnit::Weeks => shift_days(self.0, 7 * i64::from(n)),
            TimeUnit::Months => shift_months(self.0, n),
            TimeUnit::Years => shift_months(self.0, 12 * n),
        };
        shifted
            .map(Self)
            .ok_or_else(|| Error::InvalidArgument(format!("{self} + {n}{unit} is out of range")))
    }

    /// Shift the date by a [`Period`].
    pub fn advance_by(&self, period: Period) -> Result<Date> {
        self.advance(period.length, period.unit)
    }
}

fn shift_days(d: NaiveDate, n: i64) -> Option<NaiveDate> {
    if n >= 0 {
        d.checked_add_days(Days::new(n.unsigned_abs()))
    } else {
        d.checked_sub_days(Days::new(n.unsigned_abs()))
    }
}

fn shift_months(d: NaiveDate, n: i32) -> Option<NaiveDate> {
    if n >= 0 {
        d.checked_add_months(Months::new(n.unsigned_abs()))
    } else {
        d.checked_sub_months(Months::new(n.unsigned_abs()))
    }
}

/// Adding whole days; saturates at the chrono range, which no market date
/// reaches.
impl Add<i64> for Date {
    type Output = Date;

    fn add(self, days: i64) -> Date {
        Self(shift_days(self.0, days).unwrap_or(self.0))
    }
}

impl Sub<i64> for Date {
    type Output = Date;

    fn sub(self, days: i64) -> Date {
        self + (-days)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

impl fmt::Debug for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Date({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_end_clamps() {
        let d = Date::from_ymd(2016, 1, 31).unwrap();
        assert_eq!(d.advance(1, TimeUnit::Months).unwrap(), Date::from_ymd(2016, 2, 29).unwrap());
    }

    #[test]
    fn years_and_days() {
        let d = Date::from_ymd(2016, 2, 17).unwrap();
        assert_eq!(d.advance(5, TimeUnit::Years).unwrap(), Date::from_ymd(2021, 2, 17).unwrap());
        assert_eq!(d.advance(-7, TimeUnit::Days).unwrap(), Date::from_ymd(2016, 2, 10).unwrap());
        assert_eq!(d + 2, Date::from_ymd(2016, 2, 19).unwrap());
    }

    #[test]
    fn day_difference() {
        let d1 = Date::from_ymd(2016, 2, 10).unwrap();
        let d2 = Date::from_ymd(2016, 2, 17).unwrap();
        assert_eq!(d1.days_until(d2), 7);
        assert_eq!(d2.days_until(d1), -7);
    }

    #[test]
    fn weekend_detection() {
        assert!(Date::from_ymd(2016, 2, 13).unwrap().is_weekend());
        assert!(!Date::from_ymd(2016, 2, 10).unwrap().is_weekend());
    }
}
