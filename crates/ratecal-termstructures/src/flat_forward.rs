//! `FlatForward`: a yield term structure with a constant forward rate.
//!
//! The rate is read from a shared [`SimpleQuote`] on every query, so moving
//! the quote moves the curve. The quoted rate is converted to its
//! continuously-compounded equivalent under the curve's compounding
//! convention.

use crate::term_structure::TermStructure;
use crate::yield_term_structure::YieldTermStructure;
use ratecal_core::{errors::Result, Compounding, DiscountFactor, Handle, Rate, Time};
use ratecal_quotes::{Quote, SimpleQuote};
use ratecal_time::{Date, DayCounter};
use std::sync::Arc;

/// A flat (constant) forward-rate yield term structure.
///
/// `P(t) = exp(−r·t)` with `r` the continuously-compounded equivalent of
/// the quoted rate.
#[derive(Debug)]
pub struct FlatForward {
    reference_date: Date,
    rate: Handle<SimpleQuote>,
    day_counter: Arc<dyn DayCounter>,
    compounding: Compounding,
}

impl FlatForward {
    /// A flat curve driven by a rate quote.
    pub fn new(
        reference_date: Date,
        rate: Handle<SimpleQuote>,
        day_counter: impl DayCounter + 'static,
        compounding: Compounding,
    ) -> Self {
        Self {
            reference_date,
            rate,
            day_counter: Arc::new(day_counter),
            compounding,
        }
    }

    /// A flat curve at a fixed continuously-compounded rate.
    pub fn continuous(
        reference_date: Date,
        rate: Rate,
        day_counter: impl DayCounter + 'static,
    ) -> Self {
        Self::new(
            reference_date,
            Handle::new(SimpleQuote::new(rate)),
            day_counter,
            Compounding::Continuous,
        )
    }

    /// The quote driving the curve.
    pub fn rate_quote(&self) -> &Handle<SimpleQuote> {
        &self.rate
    }

    /// The continuously-compounded flat rate.
    pub fn rate(&self) -> Result<Rate> {
        let quoted = self.rate.try_get()?.try_value()?;
        Ok(self.compounding.to_continuous(quoted))
    }
}

impl TermStructure for FlatForward {
    fn reference_date(&self) -> Date {
        self.reference_date
    }

    fn day_counter(&self) -> &dyn DayCounter {
        &*self.day_counter
    }
}

impl YieldTermStructure for FlatForward {
    fn discount(&self, t: Time) -> Result<DiscountFactor> {
        Ok((-self.rate()? * t).exp())
    }

    fn zero_rate(&self, _t: Time) -> Result<Rate> {
        self.rate()
    }

    fn forward_rate(&self, _t: Time) -> Result<Rate> {
        self.rate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use ratecal_time::Actual365Fixed;

    fn reference() -> Date {
        Date::from_ymd(2016, 2, 10).unwrap()
    }

    #[test]
    fn flat_forward_discount() {
        let curve = FlatForward::continuous(reference(), 0.06215, Actual365Fixed);
        assert_abs_diff_eq!(curve.discount(0.0).unwrap(), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(
            curve.discount(5.0).unwrap(),
            (-0.06215_f64 * 5.0).exp(),
            epsilon = 1e-14
        );
    }

    #[test]
    fn zero_and_forward_are_flat() {
        let curve = FlatForward::continuous(reference(), 0.03, Actual365Fixed);
        assert_abs_diff_eq!(curve.zero_rate(0.5).unwrap(), 0.03, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.forward_rate(3.0).unwrap(), 0.03, epsilon = 1e-15);
    }

    #[test]
    fn annual_compounding_converts() {
        let curve = FlatForward::new(
            reference(),
            Handle::new(SimpleQuote::new(0.05)),
            Actual365Fixed,
            Compounding::Compounded,
        );
        assert_abs_diff_eq!(curve.rate().unwrap(), 1.05_f64.ln(), epsilon = 1e-12);
    }

    #[test]
    fn follows_the_quote() {
        let quote = Handle::new(SimpleQuote::new(0.05));
        let curve = FlatForward::new(reference(), quote.clone(), Actual365Fixed, Compounding::Continuous);
        quote.set_value(0.06);
        assert_abs_diff_eq!(curve.discount(1.0).unwrap(), (-0.06_f64).exp(), epsilon = 1e-15);
        quote.reset();
        assert!(curve.discount(1.0).is_err());
    }

    #[test]
    fn discount_by_date() {
        let curve = FlatForward::continuous(reference(), 0.05, Actual365Fixed);
        assert_abs_diff_eq!(curve.discount_date(reference()).unwrap(), 1.0, epsilon = 1e-15);
        let d = Date::from_ymd(2017, 2, 9).unwrap();
        assert_abs_diff_eq!(curve.time_from_reference(d), 365.0 / 365.0, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.discount_date(d).unwrap(), (-0.05_f64).exp(), epsilon = 1e-14);
    }

    proptest! {
        #[test]
        fn numerical_forward_matches_default(t in 0.0f64..30.0) {
            // The trait's finite-difference forward agrees with the closed form.
            #[derive(Debug)]
            struct Plain(FlatForward);
            impl TermStructure for Plain {
                fn reference_date(&self) -> Date { self.0.reference_date() }
                fn day_counter(&self) -> &dyn DayCounter { self.0.day_counter() }
            }
            impl YieldTermStructure for Plain {
                fn discount(&self, t: Time) -> Result<DiscountFactor> { self.0.discount(t) }
            }
            let plain = Plain(FlatForward::continuous(reference(), 0.06215, Actual365Fixed));
            prop_assert!((plain.forward_rate(t).unwrap() - 0.06215).abs() < 1e-8);
            prop_assert!((plain.zero_rate(t).unwrap() - 0.06215).abs() < 1e-10);
        }
    }
}
