//! `YieldTermStructure`: yield / interest-rate term structures.
//!
//! Three equivalent views of a curve:
//!
//! * **discount factor**: `P(0,t)`
//! * **zero rate**: continuously compounded, `−ln P(0,t) / t`
//! * **instantaneous forward rate**: `−∂ ln P(0,t) / ∂t`
//!
//! Implementors provide the discount function; the other two follow, and
//! curves with closed forms override them. Every query is fallible since a
//! curve may be driven by a quote that is currently unset.

use crate::term_structure::TermStructure;
use ratecal_core::{errors::Result, DiscountFactor, Rate, Real, Time};
use ratecal_time::Date;

/// Small time step used for instantaneous forward rate computations.
const DT: Real = 1.0e-4;

/// A yield (interest-rate) term structure.
pub trait YieldTermStructure: TermStructure {
    /// Discount factor for time `t`.
    fn discount(&self, t: Time) -> Result<DiscountFactor>;

    /// Continuously-compounded zero rate for time `t`.
    ///
    /// At `t = 0` the instantaneous forward rate is returned as the limit.
    fn zero_rate(&self, t: Time) -> Result<Rate> {
        if t == 0.0 {
            return self.forward_rate(0.0);
        }
        Ok(-self.discount(t)?.ln() / t)
    }

    /// Instantaneous forward rate at time `t`, by central difference of
    /// `ln P`.
    fn forward_rate(&self, t: Time) -> Result<Rate> {
        let t1 = (t - DT / 2.0).max(0.0);
        let t2 = t1 + DT;
        Ok((self.discount(t1)?.ln() - self.discount(t2)?.ln()) / (t2 - t1))
    }

    /// Discount factor for a date.
    fn discount_date(&self, date: Date) -> Result<DiscountFactor> {
        self.discount(self.time_from_reference(date))
    }
}
