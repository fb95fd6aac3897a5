//! The evaluation context of a calibration run.
//!
//! Every curve and instrument is built against an explicit
//! [`EvaluationContext`] instead of a process-wide evaluation date, so that
//! independent calibrations can run side by side and reproduce exactly.

use crate::business_day_convention::BusinessDayConvention;
use crate::calendar::{Calendar, WeekendsOnly};
use crate::date::Date;
use crate::period::Period;
use ratecal_core::errors::{Error, Result};
use std::sync::Arc;

/// Valuation date, settlement date and the calendar relating them.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    evaluation_date: Date,
    settlement_date: Date,
    calendar: Arc<dyn Calendar>,
}

impl EvaluationContext {
    /// Create a context with explicit evaluation and settlement dates.
    pub fn new(evaluation_date: Date, settlement_date: Date) -> Result<Self> {
        if settlement_date < evaluation_date {
            return Err(Error::InvalidArgument(format!(
                "settlement date {settlement_date} precedes evaluation date {evaluation_date}"
            )));
        }
        Ok(Self {
            evaluation_date,
            settlement_date,
            calendar: Arc::new(WeekendsOnly),
        })
    }

    /// Create a context whose settlement date lies `settlement_days`
    /// business days after `evaluation_date`.
    pub fn with_settlement_days(
        evaluation_date: Date,
        settlement_days: i32,
        calendar: Arc<dyn Calendar>,
    ) -> Result<Self> {
        let settlement_date = calendar.advance(
            evaluation_date,
            Period::new(settlement_days, crate::time_unit::TimeUnit::Days),
            BusinessDayConvention::Following,
        )?;
        Ok(Self {
            evaluation_date,
            settlement_date,
            calendar,
        })
    }

    /// Replace the calendar used to roll instrument dates.
    pub fn with_calendar(mut self, calendar: Arc<dyn Calendar>) -> Self {
        self.calendar = calendar;
        self
    }

    /// The date at which prices are computed.
    pub fn evaluation_date(&self) -> Date {
        self.evaluation_date
    }

    /// The spot settlement date; curves are anchored here.
    pub fn settlement_date(&self) -> Date {
        self.settlement_date
    }

    /// The calendar instruments roll their dates with.
    pub fn calendar(&self) -> &Arc<dyn Calendar> {
        &self.calendar
    }
}
