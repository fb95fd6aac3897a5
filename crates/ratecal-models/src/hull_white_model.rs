//! Hull-White (extended Vasicek) model.
//!
//! ```text
//! dr = (θ(t) − a·r) dt + σ dW
//! ```
//!
//! `θ(t)` is chosen to fit the initial yield curve exactly. Bond prices are
//! affine in the short rate:
//!
//! ```text
//! P(t,T) = A(t,T) exp(−B(t,T) r(t))
//! B(t,T) = (1 − e^{−a(T−t)}) / a
//! ln A   = ln(P(0,T)/P(0,t)) + B·f(0,t) − σ²/(4a)·B²·(1 − e^{−2at})
//! ```

use crate::calibrated_model::{CalibratedModel, ModelFamily, ModelParameters, Parameter};
use crate::short_rate_model::{decay_factor, ShortRateModel};
use ratecal_core::{
    errors::{Error, Result},
    Handle, Real, Time,
};
use ratecal_math::{black_formula, Array, OptionType, PositiveConstraint};
use ratecal_termstructures::YieldTermStructure;

/// Hull-White parameters `[a, sigma]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HullWhiteParams {
    /// Mean-reversion speed.
    pub a: Real,
    /// Short-rate volatility.
    pub sigma: Real,
}

impl Default for HullWhiteParams {
    fn default() -> Self {
        Self { a: 0.1, sigma: 0.01 }
    }
}

impl HullWhiteParams {
    /// Read `[a, sigma]`.
    pub fn from_slice(values: &[Real]) -> Result<Self> {
        match *values {
            [a, sigma] => Ok(Self { a, sigma }),
            _ => Err(Error::InvalidArgument(format!(
                "Hull-White takes 2 parameters, got {}",
                values.len()
            ))),
        }
    }

    /// `[a, sigma]`.
    pub fn to_array(&self) -> Array {
        Array::from_slice(&[self.a, self.sigma])
    }

    /// `B(t,T)`.
    pub fn b(&self, t: Time, big_t: Time) -> Real {
        decay_factor(self.a, big_t - t)
    }

    /// `A(t,T)`, fitted to `curve`.
    pub fn a_factor(&self, curve: &dyn YieldTermStructure, t: Time, big_t: Time) -> Result<Real> {
        let b = self.b(t, big_t);
        let forward = curve.forward_rate(t)?;
        let temp = self.sigma * b;
        let value = b * forward - 0.25 * temp * temp * decay_factor(self.a, 2.0 * t);
        Ok(value.exp() * curve.discount(big_t)? / curve.discount(t)?)
    }

    /// Price at `t` of the zero-coupon bond maturing at `T` given the
    /// short rate `r` at `t`.
    pub fn discount_bond(
        &self,
        curve: &dyn YieldTermStructure,
        t: Time,
        big_t: Time,
        r: Real,
    ) -> Result<Real> {
        Ok(self.a_factor(curve, t, big_t)? * (-self.b(t, big_t) * r).exp())
    }

    /// Shift `φ(t)` with `r = x + φ(t)` and `x` a zero-mean
    /// Ornstein–Uhlenbeck process:
    /// `φ(t) = f(0,t) + σ²/(2a²)·(1 − e^{−at})²`.
    pub fn phi(&self, curve: &dyn YieldTermStructure, t: Time) -> Result<Real> {
        let half = self.sigma * decay_factor(self.a, t);
        Ok(curve.forward_rate(t)? + 0.5 * half * half)
    }

    /// Value at time 0 of a European option expiring at `T` on the
    /// zero-coupon bond maturing at `S`, struck at `strike` (per unit
    /// face).
    pub fn discount_bond_option(
        &self,
        curve: &dyn YieldTermStructure,
        option_type: OptionType,
        strike: Real,
        maturity: Time,
        bond_maturity: Time,
    ) -> Result<Real> {
        let v = self.sigma
            * self.b(maturity, bond_maturity)
            * (0.5 * decay_factor(self.a, 2.0 * maturity)).sqrt();
        let forward = curve.discount(bond_maturity)?;
        let k = curve.discount(maturity)? * strike;
        black_formula(option_type, k, forward, v, 1.0)
    }
}

/// Hull-White one-factor model.
#[derive(Debug)]
pub struct HullWhite {
    parameters: ModelParameters,
    term_structure: Handle<dyn YieldTermStructure>,
}

impl HullWhite {
    /// A model at the default parameters `a = 0.1, σ = 0.01`.
    pub fn new(term_structure: Handle<dyn YieldTermStructure>) -> Result<Self> {
        Self::with_params(term_structure, HullWhiteParams::default())
    }

    /// A model at the given parameters.
    pub fn with_params(
        term_structure: Handle<dyn YieldTermStructure>,
        params: HullWhiteParams,
    ) -> Result<Self> {
        let parameters = ModelParameters::new(
            ModelFamily::HullWhite,
            vec![
                Parameter::new("a", PositiveConstraint),
                Parameter::new("sigma", PositiveConstraint),
            ],
            params.to_array(),
        )?;
        Ok(Self {
            parameters,
            term_structure,
        })
    }

    /// Current parameters.
    pub fn current(&self) -> Result<HullWhiteParams> {
        HullWhiteParams::from_slice(self.params().as_slice())
    }

    /// `P(t,T)` under the current parameters given the short rate at `t`.
    pub fn discount_bond(&self, t: Time, big_t: Time, r: Real) -> Result<Real> {
        self.current()?.discount_bond(self.curve()?, t, big_t, r)
    }
}

impl CalibratedModel for HullWhite {
    fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }
}

impl ShortRateModel for HullWhite {
    fn term_structure(&self) -> &Handle<dyn YieldTermStructure> {
        &self.term_structure
    }
}
