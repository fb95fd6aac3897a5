//! `Period`: a time span expressed in a [`TimeUnit`].

use crate::time_unit::TimeUnit;
use ratecal_core::errors::{Error, Result};

/// A time span made up of an integer length and a [`TimeUnit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Period {
    /// Number of units.
    pub length: i32,
    /// The unit of time.
    pub unit: TimeUnit,
}

impl Period {
    /// Create a new period.
    pub fn new(length: i32, unit: TimeUnit) -> Self {
        Self { length, unit }
    }

    /// A period of `n` years.
    pub fn years(n: i32) -> Self {
        Self::new(n, TimeUnit::Years)
    }

    /// A period of `n` months.
    pub fn months(n: i32) -> Self {
        Self::new(n, TimeUnit::Months)
    }

    /// Length of the period in months.
    ///
    /// # Errors
    /// Day- and week-based periods have no exact month length.
    pub fn in_months(&self) -> Result<i32> {
        match self.unit {
            TimeUnit::Months => Ok(self.length),
            TimeUnit::Years => Ok(12 * self.length),
            _ => Err(Error::InvalidArgument(format!(
                "{self} cannot be expressed in months"
            ))),
        }
    }

    /// Approximate length in years (365-day years for day/week periods).
    pub fn approx_years(&self) -> f64 {
        let n = f64::from(self.length);
        match self.unit {
            TimeUnit::Days => n / 365.0,
            TimeUnit::Weeks => 7.0 * n / 365.0,
            TimeUnit::Months => n / 12.0,
            TimeUnit::Years => n,
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.length, self.unit)
    }
}
