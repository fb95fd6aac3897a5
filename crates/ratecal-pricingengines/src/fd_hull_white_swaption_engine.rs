//! Hull-White swaption engine on a finite-difference grid.
//!
//! The short rate is split as `r = x + φ(t)` with `x` a zero-mean
//! Ornstein–Uhlenbeck process, so the pricing PDE in `x` is
//!
//! ```text
//! ∂V/∂t − a·x·∂V/∂x + ½σ²·∂²V/∂x² − (x + φ(t))·V = 0
//! ```
//!
//! The exercise value is laid on a grid spanning `±range` standard
//! deviations of `x(T)`, rolled back to today with Crank–Nicolson after a
//! few implicit damping steps, and read off at `x = 0`.

use ratecal_core::{ensure, errors::Result, Real, Size, Time};
use ratecal_instruments::{SwaptionArguments, SwaptionEngine};
use ratecal_math::Array;
use ratecal_methods::{Fdm1dSolver, FdmScheme, Pde1d, PdeCoefficients, UniformGrid};
use ratecal_models::{CalibratedModel, HullWhite, HullWhiteParams, ModelFamily, ShortRateModel};
use ratecal_termstructures::YieldTermStructure;
use std::sync::Arc;

const DAMPING_STEPS: Size = 2;

/// Grid settings of [`FdHullWhiteSwaptionEngine`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FdGridSettings {
    /// Time steps between exercise and today.
    pub time_steps: Size,
    /// State grid points; odd counts put a node on `x = 0`.
    pub state_points: Size,
    /// Half width of the state grid in standard deviations of `x(T)`.
    pub range: Real,
}

impl Default for FdGridSettings {
    fn default() -> Self {
        Self {
            time_steps: 100,
            state_points: 101,
            range: 5.0,
        }
    }
}

struct HullWhitePde<'a> {
    params: &'a HullWhiteParams,
    curve: &'a dyn YieldTermStructure,
}

impl Pde1d for HullWhitePde<'_> {
    fn coefficients(&self, t: Time, x: Real) -> Result<PdeCoefficients> {
        Ok(PdeCoefficients {
            drift: -self.params.a * x,
            variance: self.params.sigma * self.params.sigma,
            discount_rate: x + self.params.phi(self.curve, t)?,
        })
    }
}

/// Value of a European swaption under Hull-White parameters `params` by
/// finite differences.
pub fn fd_hull_white_swaption(
    params: &HullWhiteParams,
    curve: &dyn YieldTermStructure,
    args: &SwaptionArguments,
    settings: &FdGridSettings,
) -> Result<Real> {
    let big_t = args.start_time;
    ensure!(big_t > 0.0, "swaption already exercised (T = {big_t})");
    ensure!(params.a > 0.0, "mean reversion must be positive, got {}", params.a);

    let std_dev = params.sigma * ((1.0 - (-2.0 * params.a * big_t).exp()) / (2.0 * params.a)).sqrt();
    let grid = UniformGrid::centered(0.0, settings.range * std_dev, settings.state_points)?;

    let w = args.swap_type.sign();
    let amounts = args.coupon_amounts();
    let phi_t = params.phi(curve, big_t)?;
    let mut values = Vec::with_capacity(grid.size());
    for x in grid.nodes() {
        let mut bond = 0.0;
        for (&c, &t) in amounts.iter().zip(&args.fixed_pay_times) {
            bond += c * params.discount_bond(curve, big_t, t, x + phi_t)?;
        }
        values.push((w * (1.0 - bond)).max(0.0));
    }

    let solver = Fdm1dSolver::new(grid.clone(), settings.time_steps, FdmScheme::CrankNicolson)?
        .with_damping_steps(DAMPING_STEPS);
    solver.rollback(&HullWhitePde { params, curve }, &mut values, big_t, 0.0)?;
    Ok(args.nominal * grid.interpolate(&values, 0.0)?)
}

/// Finite-difference swaption engine for [`HullWhite`].
#[derive(Debug, Clone)]
pub struct FdHullWhiteSwaptionEngine {
    model: Arc<HullWhite>,
    settings: FdGridSettings,
}

impl FdHullWhiteSwaptionEngine {
    /// Create an engine with the given grid.
    pub fn new(model: Arc<HullWhite>, settings: FdGridSettings) -> Result<Self> {
        ensure!(settings.time_steps > 0, "at least one time step required");
        ensure!(settings.state_points >= 3, "at least 3 state points required");
        ensure!(settings.range > 0.0, "grid range must be positive, got {}", settings.range);
        Ok(Self { model, settings })
    }

    /// 100 time steps, 101 state points, ±5 standard deviations.
    pub fn with_defaults(model: Arc<HullWhite>) -> Self {
        Self {
            model,
            settings: FdGridSettings::default(),
        }
    }
}

impl SwaptionEngine for FdHullWhiteSwaptionEngine {
    fn name(&self) -> &'static str {
        "Hull-White finite differences"
    }

    fn model_family(&self) -> ModelFamily {
        ModelFamily::HullWhite
    }

    fn model_params(&self) -> Array {
        self.model.params()
    }

    fn calculate_with(&self, args: &SwaptionArguments, params: &Array) -> Result<Real> {
        let params = HullWhiteParams::from_slice(params.as_slice())?;
        fd_hull_white_swaption(&params, self.model.curve()?, args, &self.settings)
    }
}
