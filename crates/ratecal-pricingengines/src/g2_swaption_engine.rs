//! G2++ swaption engine.
//!
//! Conditioning on the first factor `x(T)` at exercise, the exercise
//! boundary in the second factor is the unique `ȳ(x)` with
//!
//! ```text
//! Σᵢ λᵢ(x) e^{−B_b(tᵢ−T)·ȳ} = 1,    λᵢ(x) = cᵢ A(T,tᵢ) e^{−B_a(tᵢ−T)·x}
//! ```
//!
//! and the inner expectation over `y` is Gaussian in closed form. What is
//! left is an integral over `x` against its `T`-forward density, taken on
//! `mean ± range·stddev` with a fixed-segment trapezoid rule.

use ratecal_core::{ensure, errors::Result, Real, Size};
use ratecal_instruments::{SwaptionArguments, SwaptionEngine};
use ratecal_math::{normal_cdf, Array, Brent, SegmentIntegral};
use ratecal_models::{CalibratedModel, G2Model, G2Params, ModelFamily, ShortRateModel};
use ratecal_termstructures::YieldTermStructure;
use std::f64::consts::PI;
use std::sync::Arc;

use crate::{INNER_ACCURACY, INNER_MAX_EVALUATIONS};

/// Value of a European swaption under G2++ parameters `params`.
///
/// `range` is the half width of the integration domain in standard
/// deviations of `x(T)`; `intervals` the number of trapezoid segments.
pub fn g2_swaption(
    params: &G2Params,
    curve: &dyn YieldTermStructure,
    args: &SwaptionArguments,
    range: Real,
    intervals: Size,
) -> Result<Real> {
    ensure!(range > 0.0, "integration range must be positive, got {range}");
    let w = args.swap_type.sign();
    let big_t = args.start_time;
    ensure!(big_t > 0.0, "swaption already exercised (T = {big_t})");

    let m = params.forward_moments(big_t);
    let txy2 = 1.0 - m.rho_xy * m.rho_xy;
    ensure!(
        txy2 > 0.0 && m.sigma_x > 0.0 && m.sigma_y > 0.0,
        "degenerate factor distribution at T = {big_t}"
    );
    let txy = txy2.sqrt();

    let amounts = args.coupon_amounts();
    let mut coupons = Vec::with_capacity(amounts.len());
    for (&c, &t) in amounts.iter().zip(&args.fixed_pay_times) {
        coupons.push(Coupon {
            weight: c * params.a_factor(curve, big_t, t)?,
            ba: params.b_a(t - big_t),
            bb: params.b_b(t - big_t),
        });
    }

    let solver = Brent::new(INNER_ACCURACY, INNER_MAX_EVALUATIONS);
    let integrand = |x: Real| -> Result<Real> {
        let lambdas: Vec<Real> = coupons.iter().map(|c| c.weight * (-c.ba * x).exp()).collect();
        let y_bar = solver
            .try_solve_from(
                |y| {
                    Ok(coupons
                        .iter()
                        .zip(&lambdas)
                        .map(|(c, l)| l * (-c.bb * y).exp())
                        .sum::<Real>()
                        - 1.0)
                },
                0.0,
                0.01,
            )?
            .root;

        let dx = x - m.mu_x;
        let h1 = (y_bar - m.mu_y) / (m.sigma_y * txy) - m.rho_xy * dx / (m.sigma_x * txy);
        let mut value = normal_cdf(-w * h1);
        for (c, l) in coupons.iter().zip(&lambdas) {
            let h2 = h1 + c.bb * m.sigma_y * txy;
            let kappa = -c.bb
                * (m.mu_y - 0.5 * txy2 * m.sigma_y * m.sigma_y * c.bb
                    + m.rho_xy * m.sigma_y * dx / m.sigma_x);
            value -= l * kappa.exp() * normal_cdf(-w * h2);
        }
        let z = dx / m.sigma_x;
        Ok((-0.5 * z * z).exp() * value / (m.sigma_x * (2.0 * PI).sqrt()))
    };

    let lower = m.mu_x - range * m.sigma_x;
    let upper = m.mu_x + range * m.sigma_x;
    let integral = SegmentIntegral::new(intervals)?.integrate(integrand, lower, upper)?;
    Ok(args.nominal * w * curve.discount(big_t)? * integral)
}

/// One fixed-leg flow seen from exercise.
struct Coupon {
    weight: Real,
    ba: Real,
    bb: Real,
}

/// Swaption engine for [`G2Model`].
#[derive(Debug, Clone)]
pub struct G2SwaptionEngine {
    model: Arc<G2Model>,
    range: Real,
    intervals: Size,
}

impl G2SwaptionEngine {
    /// Integrate over `±range` standard deviations with `intervals`
    /// segments.
    pub fn new(model: Arc<G2Model>, range: Real, intervals: Size) -> Result<Self> {
        ensure!(range > 0.0, "integration range must be positive, got {range}");
        ensure!(intervals > 0, "at least one integration interval required");
        Ok(Self {
            model,
            range,
            intervals,
        })
    }

    /// `range = 6`, `intervals = 16`.
    pub fn with_defaults(model: Arc<G2Model>) -> Self {
        Self {
            model,
            range: 6.0,
            intervals: 16,
        }
    }
}

impl SwaptionEngine for G2SwaptionEngine {
    fn name(&self) -> &'static str {
        "G2 analytic"
    }

    fn model_family(&self) -> ModelFamily {
        ModelFamily::G2
    }

    fn model_params(&self) -> Array {
        self.model.params()
    }

    fn calculate_with(&self, args: &SwaptionArguments, params: &Array) -> Result<Real> {
        let params = G2Params::from_slice(params.as_slice())?;
        g2_swaption(&params, self.model.curve()?, args, self.range, self.intervals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jamshidian_swaption;
    use ratecal_core::Handle;
    use ratecal_instruments::IborConvention;
    use ratecal_models::HullWhiteParams;
    use ratecal_termstructures::FlatForward;
    use ratecal_time::{Actual360, Actual365Fixed, Date, Period};

    fn curve() -> Handle<dyn YieldTermStructure> {
        let ts = FlatForward::continuous(Date::from_ymd(2016, 2, 17).unwrap(), 0.06215, Actual365Fixed);
        Handle::from_arc(Arc::new(ts) as Arc<dyn YieldTermStructure>)
    }

    fn swaption(ts: &dyn YieldTermStructure, maturity: i32, length: i32) -> SwaptionArguments {
        let index = IborConvention::euribor_6m();
        SwaptionArguments::atm(
            ts,
            &index,
            Period::years(maturity),
            Period::years(length),
            index.tenor(),
            &Actual360,
        )
        .unwrap()
    }

    #[test]
    fn default_params_give_a_positive_price() {
        let ts = curve();
        let model = Arc::new(G2Model::new(ts.clone()).unwrap());
        let engine = G2SwaptionEngine::with_defaults(model);
        let args = swaption(ts.try_get().unwrap(), 2, 3);
        let npv = engine.calculate(&args).unwrap();
        assert!(npv > 0.0 && npv < args.annuity * args.forward, "npv = {npv}");
    }

    #[test]
    fn collapses_to_hull_white_when_the_second_factor_vanishes() {
        let ts = curve();
        let curve = ts.try_get().unwrap();
        let args = swaption(curve, 3, 4);
        let g2 = G2Params {
            a: 0.08,
            sigma: 0.012,
            b: 0.3,
            eta: 1e-5,
            rho: 0.0,
        };
        let hw = HullWhiteParams { a: 0.08, sigma: 0.012 };
        let two_factor = g2_swaption(&g2, curve, &args, 6.0, 400).unwrap();
        let one_factor = jamshidian_swaption(&hw, curve, &args).unwrap();
        let rel = (two_factor - one_factor).abs() / one_factor;
        assert!(rel < 2e-3, "g2 = {two_factor:.8}, hw = {one_factor:.8}");
    }

    #[test]
    fn more_volatility_is_more_value() {
        let ts = curve();
        let curve = ts.try_get().unwrap();
        let args = swaption(curve, 1, 5);
        let low = g2_swaption(&G2Params::default(), curve, &args, 6.0, 16).unwrap();
        let high = g2_swaption(
            &G2Params {
                sigma: 0.02,
                ..G2Params::default()
            },
            curve,
            &args,
            6.0,
            16,
        )
        .unwrap();
        assert!(high > low);
    }

    #[test]
    fn wrong_parameter_count() {
        let ts = curve();
        let model = Arc::new(G2Model::new(ts.clone()).unwrap());
        let engine = G2SwaptionEngine::with_defaults(model);
        let args = swaption(ts.try_get().unwrap(), 1, 1);
        assert!(engine.calculate_with(&args, &Array::from_slice(&[0.1, 0.01])).is_err());
        assert!(G2SwaptionEngine::new(Arc::new(G2Model::new(ts).unwrap()), 0.0, 16).is_err());
    }
}
