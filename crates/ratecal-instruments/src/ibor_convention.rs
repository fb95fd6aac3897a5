//! Floating-leg index conventions.
//!
//! Only the conventions of the index matter to a calibration helper: its
//! tenor sets the fixed-leg frequency, its fixing days separate exercise
//! from swap start, and its calendar and roll convention place every date.

use ratecal_time::{
    Actual360, BusinessDayConvention, Calendar, DayCounter, Period, TimeUnit, WeekendsOnly,
};
use std::fmt;
use std::sync::Arc;

/// Conventions of an IBOR-style floating rate index.
#[derive(Clone)]
pub struct IborConvention {
    name: String,
    tenor: Period,
    fixing_days: i32,
    convention: BusinessDayConvention,
    day_counter: Arc<dyn DayCounter>,
    calendar: Arc<dyn Calendar>,
}

impl IborConvention {
    /// Create an index convention.
    pub fn new(
        name: impl Into<String>,
        tenor: Period,
        fixing_days: i32,
        convention: BusinessDayConvention,
        day_counter: Arc<dyn DayCounter>,
        calendar: Arc<dyn Calendar>,
    ) -> Self {
        Self {
            name: name.into(),
            tenor,
            fixing_days,
            convention,
            day_counter,
            calendar,
        }
    }

    /// Euribor with the given tenor.
    ///
    /// - Day counter: Actual/360
    /// - Fixing days: 2
    /// - Convention: Modified Following
    /// - Calendar: weekends only
    pub fn euribor(tenor: Period) -> Self {
        Self::new(
            format!("Euribor{tenor}"),
            tenor,
            2,
            BusinessDayConvention::ModifiedFollowing,
            Arc::new(Actual360),
            Arc::new(WeekendsOnly),
        )
    }

    /// Six-month Euribor.
    pub fn euribor_6m() -> Self {
        Self::euribor(Period::new(6, TimeUnit::Months))
    }

    /// Replace the calendar.
    pub fn with_calendar(mut self, calendar: Arc<dyn Calendar>) -> Self {
        self.calendar = calendar;
        self
    }

    /// Index name, e.g. `Euribor6M`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Index tenor.
    pub fn tenor(&self) -> Period {
        self.tenor
    }

    /// Business days between fixing and value date.
    pub fn fixing_days(&self) -> i32 {
        self.fixing_days
    }

    /// Roll convention.
    pub fn convention(&self) -> BusinessDayConvention {
        self.convention
    }

    /// Accrual day counter.
    pub fn day_counter(&self) -> &Arc<dyn DayCounter> {
        &self.day_counter
    }

    /// Fixing calendar.
    pub fn calendar(&self) -> &Arc<dyn Calendar> {
        &self.calendar
    }
}

impl fmt::Debug for IborConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IborConvention")
            .field("name", &self.name)
            .field("fixing_days", &self.fixing_days)
            .field("convention", &self.convention)
            .field("day_counter", &self.day_counter.name())
            .field("calendar", &self.calendar.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euribor_6m() {
        let idx = IborConvention::euribor_6m();
        assert_eq!(idx.name(), "Euribor6M");
        assert_eq!(idx.tenor(), Period::months(6));
        assert_eq!(idx.fixing_days(), 2);
        assert_eq!(idx.convention(), BusinessDayConvention::ModifiedFollowing);
        assert_eq!(idx.day_counter().name(), "Actual/360");
        assert_eq!(idx.calendar().name(), "Weekends only");
    }
}
