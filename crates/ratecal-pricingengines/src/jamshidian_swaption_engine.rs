//! Hull-White swaption engine by Jamshidian decomposition.
//!
//! Bond prices are monotone in the short rate, so a payer swaption, which
//! is a put struck at par on the fixed-leg coupon bond, splits into a sum
//! of puts on the zero-coupon bonds, each struck at that bond's price at
//! the critical rate `r*` where the coupon bond is worth par.

use ratecal_core::{errors::Result, Real};
use ratecal_instruments::{SwapType, SwaptionArguments, SwaptionEngine};
use ratecal_math::{Array, Brent, OptionType};
use ratecal_models::{CalibratedModel, HullWhite, HullWhiteParams, ModelFamily, ShortRateModel};
use ratecal_termstructures::YieldTermStructure;
use std::sync::Arc;

use crate::{INNER_ACCURACY, INNER_MAX_EVALUATIONS};

/// Value of a European swaption under Hull-White parameters `params`.
pub fn jamshidian_swaption(
    params: &HullWhiteParams,
    curve: &dyn YieldTermStructure,
    args: &SwaptionArguments,
) -> Result<Real> {
    let big_t = args.start_time;
    let amounts = args.coupon_amounts();
    let times = &args.fixed_pay_times;

    let coupon_bond = |r: Real| -> Result<Real> {
        let mut value = 0.0;
        for (&c, &t) in amounts.iter().zip(times) {
            value += c * params.discount_bond(curve, big_t, t, r)?;
        }
        Ok(value - 1.0)
    };
    let r_star = Brent::new(INNER_ACCURACY, INNER_MAX_EVALUATIONS)
        .try_solve_from(coupon_bond, curve.forward_rate(big_t)?, 0.01)?
        .root;

    let option_type = match args.swap_type {
        SwapType::Payer => OptionType::Put,
        SwapType::Receiver => OptionType::Call,
    };
    let mut value = 0.0;
    for (&c, &t) in amounts.iter().zip(times) {
        let strike = params.discount_bond(curve, big_t, t, r_star)?;
        value += c * params.discount_bond_option(curve, option_type, strike, big_t, t)?;
    }
    Ok(args.nominal * value)
}

/// Analytic swaption engine for [`HullWhite`].
#[derive(Debug, Clone)]
pub struct JamshidianSwaptionEngine {
    model: Arc<HullWhite>,
}

impl JamshidianSwaptionEngine {
    /// Create an engine pricing under `model`.
    pub fn new(model: Arc<HullWhite>) -> Self {
        Self { model }
    }
}

impl SwaptionEngine for JamshidianSwaptionEngine {
    fn name(&self) -> &'static str {
        "Jamshidian"
    }

    fn model_family(&self) -> ModelFamily {
        ModelFamily::HullWhite
    }

    fn model_params(&self) -> Array {
        self.model.params()
    }

    fn calculate_with(&self, args: &SwaptionArguments, params: &Array) -> Result<Real> {
        let params = HullWhiteParams::from_slice(params.as_slice())?;
        jamshidian_swaption(&params, self.model.curve()?, args)
    }
}
