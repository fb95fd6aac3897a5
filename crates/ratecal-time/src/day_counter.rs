//! `DayCounter` trait and built-in day-count conventions.
//!
//! A day counter computes the **day count fraction**, the fraction of a year
//! between two dates used when discounting or accruing interest.

use crate::date::Date;
use ratecal_core::{Real, Time};

/// A convention for counting the fraction of a year between two dates.
pub trait DayCounter: std::fmt::Debug + Send + Sync {
    /// Human-readable name of this convention (e.g. `"Actual/365 (Fixed)"`).
    fn name(&self) -> &str;

    /// Number of days between `d1` and `d2` according to this convention.
    fn day_count(&self, d1: Date, d2: Date) -> i64 {
        d1.days_until(d2)
    }

    /// Fraction of a year between `d1` and `d2`.
    fn year_fraction(&self, d1: Date, d2: Date) -> Time;
}

/// Actual/365 (Fixed) day counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Actual365Fixed;

impl DayCounter for Actual365Fixed {
    fn name(&self) -> &str {
        "Actual/365 (Fixed)"
    }

    fn year_fraction(&self, d1: Date, d2: Date) -> Time {
        self.day_count(d1, d2) as Real / 365.0
    }
}

/// Actual/360 day counter.
#[derive(Debug, Clone, Copy, Default)]
pub struct Actual360;

impl DayCounter for Actual360 {
    fn name(&self) -> &str {
        "Actual/360"
    }

    fn year_fraction(&self, d1: Date, d2: Date) -> Time {
        self.day_count(d1, d2) as Real / 360.0
    }
}

/// Thirty/360 day counter (Bond Basis).
///
/// `year_fraction = [360(Y2−Y1) + 30(M2−M1) + (D2−D1)] / 360`
#[derive(Debug, Clone, Copy, Default)]
pub struct Thirty360;

impl DayCounter for Thirty360 {
    fn name(&self) -> &str {
        "30/360 (Bond Basis)"
    }

    fn day_count(&self, d1: Date, d2: Date) -> i64 {
        let y1 = i64::from(d1.year());
        let m1 = i64::from(d1.month());
        let mut dd1 = i64::from(d1.day_of_month());
        let y2 = i64::from(d2.year());
        let m2 = i64::from(d2.month());
        let mut dd2 = i64::from(d2.day_of_month());

        if dd1 == 31 {
            dd1 = 30;
        }
        if dd2 == 31 && dd1 == 30 {
            dd2 = 30;
        }

        360 * (y2 - y1) + 30 * (m2 - m1) + (dd2 - dd1)
    }

    fn year_fraction(&self, d1: Date, d2: Date) -> Time {
        self.day_count(d1, d2) as Real / 360.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn actual_365_fixed() {
        let yf = Actual365Fixed.year_fraction(date(2016, 2, 17), date(2017, 2, 17));
        assert_abs_diff_eq!(yf, 366.0 / 365.0, epsilon = 1e-15);
    }

    #[test]
    fn actual_360() {
        let yf = Actual360.year_fraction(date(2016, 2, 17), date(2016, 8, 17));
        assert_abs_diff_eq!(yf, 182.0 / 360.0, epsilon = 1e-15);
    }

    #[test]
    fn thirty_360_month_ends() {
        assert_eq!(Thirty360.day_count(date(2016, 1, 31), date(2016, 3, 31)), 60);
        assert_abs_diff_eq!(
            Thirty360.year_fraction(date(2016, 2, 17), date(2017, 2, 17)),
            1.0,
            epsilon = 1e-15
        );
    }
}
