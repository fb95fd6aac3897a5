//! European swaptions on vanilla fixed-for-floating swaps.
//!
//! [`SwaptionArguments`] is the engine-facing description of one swaption:
//! exercise and start times, the fixed leg as payment times and year
//! fractions, and the ATM strike with its annuity. Floating-leg cash flows
//! are not carried; with a single curve the floating leg is worth
//! `P(start) − P(end)` at any time, which is all the engines use.

use crate::ibor_convention::IborConvention;
use ratecal_core::{
    ensure,
    errors::Result,
    Rate, Real, Time, Volatility,
};
use ratecal_math::{black_formula, OptionType};
use ratecal_termstructures::YieldTermStructure;
use ratecal_time::{BusinessDayConvention, Date, DayCounter, Period, Schedule, TimeUnit};

// ────────────────────────────────────────────────────────────────────────────
// Swap type
// ────────────────────────────────────────────────────────────────────────────

/// Direction of the underlying swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapType {
    /// Pay fixed, receive floating.
    Payer,
    /// Receive fixed, pay floating.
    Receiver,
}

impl SwapType {
    /// +1 for Payer, −1 for Receiver.
    pub fn sign(self) -> Real {
        match self {
            SwapType::Payer => 1.0,
            SwapType::Receiver => -1.0,
        }
    }

    /// The Black option type pricing this swaption on the swap rate.
    pub fn option_type(self) -> OptionType {
        match self {
            SwapType::Payer => OptionType::Call,
            SwapType::Receiver => OptionType::Put,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SwaptionArguments
// ────────────────────────────────────────────────────────────────────────────

/// Engine-facing description of a European swaption.
///
/// Times are year fractions from the curve's reference date.
#[derive(Debug, Clone, PartialEq)]
pub struct SwaptionArguments {
    /// Option exercise date.
    pub exercise_date: Date,
    /// Underlying swap start date.
    pub start_date: Date,
    /// Underlying swap end date.
    pub end_date: Date,
    /// Time of the exercise date.
    pub exercise_time: Time,
    /// Time of the swap start; the short-rate engines exercise here.
    pub start_time: Time,
    /// Fixed-leg payment times.
    pub fixed_pay_times: Vec<Time>,
    /// Fixed-leg accrual fractions.
    pub accruals: Vec<Real>,
    /// Fixed rate.
    pub strike: Rate,
    /// Notional.
    pub nominal: Real,
    /// Payer or receiver.
    pub swap_type: SwapType,
    /// `Σ τᵢ P(0,tᵢ)`, per unit notional.
    pub annuity: Real,
    /// Forward swap rate.
    pub forward: Rate,
}

impl SwaptionArguments {
    /// An at-the-money payer swaption of unit notional expiring `maturity`
    /// after the curve's reference date on a swap of `length`, with a
    /// fixed leg paying every `fixed_tenor`.
    ///
    /// The exercise date rolls with the index convention, the swap starts
    /// `fixing_days` business days later and ends `length` after that.
    pub fn atm(
        curve: &dyn YieldTermStructure,
        index: &IborConvention,
        maturity: Period,
        length: Period,
        fixed_tenor: Period,
        fixed_day_counter: &dyn DayCounter,
    ) -> Result<Self> {
        ensure!(maturity.length > 0, "swaption maturity must be positive, got {maturity}");
        ensure!(length.length > 0, "swap length must be positive, got {length}");

        let calendar = index.calendar();
        let exercise_date =
            calendar.advance(curve.reference_date(), maturity, index.convention())?;
        let start_date = calendar.advance(
            exercise_date,
            Period::new(index.fixing_days(), TimeUnit::Days),
            BusinessDayConvention::Following,
        )?;
        let end_date = calendar.advance(start_date, length, index.convention())?;

        let schedule = Schedule::from_range(
            start_date,
            end_date,
            fixed_tenor,
            calendar.as_ref(),
            index.convention(),
            index.convention(),
        )?;

        let mut fixed_pay_times = Vec::with_capacity(schedule.size());
        let mut accruals = Vec::with_capacity(schedule.size());
        let mut annuity = 0.0;
        for (d0, d1) in schedule.periods() {
            let tau = fixed_day_counter.year_fraction(d0, d1);
            let t = curve.time_from_reference(d1);
            annuity += tau * curve.discount(t)?;
            fixed_pay_times.push(t);
            accruals.push(tau);
        }
        ensure!(annuity > 0.0, "swap annuity must be positive, got {annuity}");

        let start_time = curve.time_from_reference(start_date);
        let end_time = curve.time_from_reference(end_date);
        let forward = (curve.discount(start_time)? - curve.discount(end_time)?) / annuity;

        Ok(Self {
            exercise_date,
            start_date,
            end_date,
            exercise_time: curve.time_from_reference(exercise_date),
            start_time,
            fixed_pay_times,
            accruals,
            strike: forward,
            nominal: 1.0,
            swap_type: SwapType::Payer,
            annuity,
            forward,
        })
    }

    /// Fixed-leg cash flows per unit notional with the notional added to
    /// the last one: the coupon bond a swaption is an option on.
    pub fn coupon_amounts(&self) -> Vec<Real> {
        let mut amounts: Vec<Real> = self.accruals.iter().map(|tau| self.strike * tau).collect();
        if let Some(last) = amounts.last_mut() {
            *last += 1.0;
        }
        amounts
    }

    /// Black (lognormal) price at volatility `vol`.
    pub fn black_price(&self, vol: Volatility) -> Result<Real> {
        ensure!(vol >= 0.0, "volatility must be non-negative, got {vol}");
        let std_dev = vol * self.exercise_time.sqrt();
        let unit = black_formula(
            self.swap_type.option_type(),
            self.strike,
            self.forward,
            std_dev,
            self.annuity,
        )?;
        Ok(self.nominal * unit)
    }
}
