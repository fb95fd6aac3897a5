//! `Schedule`: the accrual dates of a swap leg.
//!
//! Dates are generated forward from the start date at a fixed tenor and
//! adjusted with the calendar; the termination date is adjusted with its own
//! convention. A short final stub is kept when the tenor does not divide the
//! range evenly.

use crate::business_day_convention::BusinessDayConvention;
use crate::calendar::Calendar;
use crate::date::Date;
use crate::period::Period;
use ratecal_core::errors::{Error, Result};

/// An ordered sequence of accrual/payment dates.
#[derive(Debug, Clone, PartialEq)]
pub struct Schedule {
    dates: Vec<Date>,
}

impl Schedule {
    /// Generate the schedule between `start` and `end` at `tenor`.
    pub fn from_range(
        start: Date,
        end: Date,
        tenor: Period,
        calendar: &dyn Calendar,
        convention: BusinessDayConvention,
        termination_convention: BusinessDayConvention,
    ) -> Result<Self> {
        if start >= end {
            return Err(Error::InvalidArgument(format!(
                "schedule start {start} must precede end {end}"
            )));
        }
        if tenor.length <= 0 {
            return Err(Error::InvalidArgument(format!(
                "schedule tenor must be positive, got {tenor}"
            )));
        }

        let mut dates = vec![calendar.adjust(start, convention)];
        let mut n = 1;
        loop {
            let next = start.advance(n * tenor.length, tenor.unit)?;
            if next >= end {
                break;
            }
            dates.push(calendar.adjust(next, convention));
            n += 1;
        }
        let last = calendar.adjust(end, termination_convention);
        if dates.last().is_some_and(|d| *d >= last) {
            dates.pop();
        }
        dates.push(last);
        Ok(Self { dates })
    }

    /// Build a schedule from explicit dates, which must be strictly increasing.
    pub fn from_dates(dates: Vec<Date>) -> Result<Self> {
        if dates.len() < 2 {
            return Err(Error::InvalidArgument(
                "a schedule needs at least two dates".into(),
            ));
        }
        if dates.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::InvalidArgument(
                "schedule dates must be strictly increasing".into(),
            ));
        }
        Ok(Self { dates })
    }

    /// All dates, including start and end.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Number of dates.
    pub fn size(&self) -> usize {
        self.dates.len()
    }

    /// Whether the schedule is empty.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The `i`-th date.
    pub fn date(&self, i: usize) -> Result<Date> {
        self.dates.get(i).copied().ok_or(Error::IndexOutOfRange {
            index: i,
            size: self.dates.len(),
        })
    }

    /// Consecutive `(start, end)` accrual periods.
    pub fn periods(&self) -> impl Iterator<Item = (Date, Date)> + '_ {
        self.dates.windows(2).map(|w| (w[0], w[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekendsOnly;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn semiannual_two_years() {
        let s = Schedule::from_range(
            date(2017, 2, 17),
            date(2019, 2, 17),
            Period::months(6),
            &WeekendsOnly,
            BusinessDayConvention::ModifiedFollowing,
            BusinessDayConvention::ModifiedFollowing,
        )
        .unwrap();
        assert_eq!(s.size(), 5);
        // 17 Feb 2019 is a Sunday.
        assert_eq!(s.date(4).unwrap(), date(2019, 2, 18));
        // 17 Aug 2017 is a Thursday.
        assert_eq!(s.date(1).unwrap(), date(2017, 8, 17));
        assert_eq!(s.periods().count(), 4);
    }

    #[test]
    fn rejects_inverted_range() {
        let r = Schedule::from_range(
            date(2019, 2, 17),
            date(2017, 2, 17),
            Period::months(6),
            &WeekendsOnly,
            BusinessDayConvention::Following,
            BusinessDayConvention::Following,
        );
        assert!(r.is_err());
    }

    #[test]
    fn explicit_dates_must_increase() {
        assert!(Schedule::from_dates(vec![date(2017, 1, 2), date(2016, 1, 4)]).is_err());
        assert!(Schedule::from_dates(vec![date(2016, 1, 4), date(2017, 1, 2)]).is_ok());
    }
}
