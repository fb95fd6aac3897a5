//! G2++ two-factor Gaussian short-rate model.
//!
//! ```text
//! r(t) = x(t) + y(t) + φ(t)
//! dx = −a·x dt + σ dW₁
//! dy = −b·y dt + η dW₂
//! dW₁·dW₂ = ρ dt
//! ```
//!
//! Discount bond: `P(t,T) = A(t,T) exp(−B_a(T−t)·x − B_b(T−t)·y)` with
//! `A(t,T) = P(0,T)/P(0,t) · exp(½(V(T−t) − V(T) + V(t)))`.

use crate::calibrated_model::{CalibratedModel, ModelFamily, ModelParameters, Parameter};
use crate::short_rate_model::{decay_factor, ShortRateModel};
use ratecal_core::{
    errors::{Error, Result},
    Handle, Real, Time,
};
use ratecal_math::{Array, BoundaryConstraint, PositiveConstraint};
use ratecal_termstructures::YieldTermStructure;

/// G2++ parameters `[a, sigma, b, eta, rho]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct G2Params {
    /// Mean-reversion speed of the first factor.
    pub a: Real,
    /// Volatility of the first factor.
    pub sigma: Real,
    /// Mean-reversion speed of the second factor.
    pub b: Real,
    /// Volatility of the second factor.
    pub eta: Real,
    /// Correlation between the factors.
    pub rho: Real,
}

impl Default for G2Params {
    fn default() -> Self {
        Self {
            a: 0.1,
            sigma: 0.01,
            b: 0.1,
            eta: 0.01,
            rho: -0.75,
        }
    }
}

/// Moments of the two factors at time `T` under the `T`-forward measure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForwardMoments {
    /// Mean of `x(T)`.
    pub mu_x: Real,
    /// Mean of `y(T)`.
    pub mu_y: Real,
    /// Standard deviation of `x(T)`.
    pub sigma_x: Real,
    /// Standard deviation of `y(T)`.
    pub sigma_y: Real,
    /// Correlation of `x(T)` and `y(T)`.
    pub rho_xy: Real,
}

impl G2Params {
    /// Read `[a, sigma, b, eta, rho]`.
    pub fn from_slice(values: &[Real]) -> Result<Self> {
        match *values {
            [a, sigma, b, eta, rho] => Ok(Self {
                a,
                sigma,
                b,
                eta,
                rho,
            }),
            _ => Err(Error::InvalidArgument(format!(
                "G2++ takes 5 parameters, got {}",
                values.len()
            ))),
        }
    }

    /// `[a, sigma, b, eta, rho]`.
    pub fn to_array(&self) -> Array {
        Array::from_slice(&[self.a, self.sigma, self.b, self.eta, self.rho])
    }

    /// `B_a(τ) = (1 − e^{−aτ})/a`
    pub fn b_a(&self, tau: Time) -> Real {
        decay_factor(self.a, tau)
    }

    /// `B_b(τ) = (1 − e^{−bτ})/b`
    pub fn b_b(&self, tau: Time) -> Real {
        decay_factor(self.b, tau)
    }

    /// Variance of `∫₀ᵗ (x + y) du`.
    pub fn v(&self, t: Time) -> Real {
        let (a, b) = (self.a, self.b);
        let expat = (-a * t).exp();
        let expbt = (-b * t).exp();
        let cx = self.sigma / a;
        let cy = self.eta / b;
        let value_x = cx * cx * (t + (2.0 * expat - 0.5 * expat * expat - 1.5) / a);
        let value_y = cy * cy * (t + (2.0 * expbt - 0.5 * expbt * expbt - 1.5) / b);
        let cross = 2.0
            * self.rho
            * cx
            * cy
            * (t + (expat - 1.0) / a + (expbt - 1.0) / b - (expat * expbt - 1.0) / (a + b));
        value_x + value_y + cross
    }

    /// `A(t,T)`, fitted to `curve`.
    pub fn a_factor(&self, curve: &dyn YieldTermStructure, t: Time, big_t: Time) -> Result<Real> {
        let ratio = curve.discount(big_t)? / curve.discount(t)?;
        Ok(ratio * (0.5 * (self.v(big_t - t) - self.v(big_t) + self.v(t))).exp())
    }

    /// Price at `t` of the zero-coupon bond maturing at `T` given the
    /// factor values `x`, `y` at `t`.
    pub fn discount_bond(
        &self,
        curve: &dyn YieldTermStructure,
        t: Time,
        big_t: Time,
        x: Real,
        y: Real,
    ) -> Result<Real> {
        let tau = big_t - t;
        Ok(self.a_factor(curve, t, big_t)? * (-self.b_a(tau) * x - self.b_b(tau) * y).exp())
    }

    /// Factor moments at `T` under the `T`-forward measure.
    pub fn forward_moments(&self, big_t: Time) -> ForwardMoments {
        let (a, b, sigma, eta, rho) = (self.a, self.b, self.sigma, self.eta, self.rho);
        let sigma_x = sigma * (0.5 * decay_factor(a, 2.0 * big_t)).sqrt();
        let sigma_y = eta * (0.5 * decay_factor(b, 2.0 * big_t)).sqrt();
        let rho_xy = rho * eta * sigma * decay_factor(a + b, big_t) / (sigma_x * sigma_y);

        let cross = rho * sigma * eta;
        let tx = sigma * sigma / (a * a);
        let mu_x = -((tx + cross / (a * b)) * (1.0 - (-a * big_t).exp())
            - 0.5 * tx * (1.0 - (-2.0 * a * big_t).exp())
            - cross / (b * (a + b)) * (1.0 - (-(a + b) * big_t).exp()));
        let ty = eta * eta / (b * b);
        let mu_y = -((ty + cross / (a * b)) * (1.0 - (-b * big_t).exp())
            - 0.5 * ty * (1.0 - (-2.0 * b * big_t).exp())
            - cross / (a * (a + b)) * (1.0 - (-(a + b) * big_t).exp()));

        ForwardMoments {
            mu_x,
            mu_y,
            sigma_x,
            sigma_y,
            rho_xy,
        }
    }
}

/// G2++ two-factor model.
#[derive(Debug)]
pub struct G2Model {
    parameters: ModelParameters,
    term_structure: Handle<dyn YieldTermStructure>,
}

impl G2Model {
    /// A model at the default parameters
    /// `a = 0.1, σ = 0.01, b = 0.1, η = 0.01, ρ = −0.75`.
    pub fn new(term_structure: Handle<dyn YieldTermStructure>) -> Result<Self> {
        Self::with_params(term_structure, G2Params::default())
    }

    /// A model at the given parameters.
    pub fn with_params(
        term_structure: Handle<dyn YieldTermStructure>,
        params: G2Params,
    ) -> Result<Self> {
        let parameters = ModelParameters::new(
            ModelFamily::G2,
            vec![
                Parameter::new("a", PositiveConstraint),
                Parameter::new("sigma", PositiveConstraint),
                Parameter::new("b", PositiveConstraint),
                Parameter::new("eta", PositiveConstraint),
                Parameter::new("rho", BoundaryConstraint::new(-1.0, 1.0)?),
            ],
            params.to_array(),
        )?;
        Ok(Self {
            parameters,
            term_structure,
        })
    }

    /// Current parameters.
    pub fn current(&self) -> Result<G2Params> {
        G2Params::from_slice(self.params().as_slice())
    }

    /// `P(t,T)` under the current parameters given the factors at `t`.
    pub fn discount_bond(&self, t: Time, big_t: Time, x: Real, y: Real) -> Result<Real> {
        self.current()?.discount_bond(self.curve()?, t, big_t, x, y)
    }
}

impl CalibratedModel for G2Model {
    fn parameters(&self) -> &ModelParameters {
        &self.parameters
    }
}

impl ShortRateModel for G2Model {
    fn term_structure(&self) -> &Handle<dyn YieldTermStructure> {
        &self.term_structure
    }
}
