//! Standard normal distribution.
//!
//! The cumulative distribution delegates to `statrs`' complementary error
//! function: absolute error around 1e-11 near the centre, and small
//! relative error deep in the lower tail, where `1 - Φ(-x)` would cancel.

use ratecal_core::Real;
use statrs::function::erf::erfc;
use std::f64::consts::{FRAC_1_SQRT_2, PI};

/// The standard normal probability density function.
///
/// `φ(x) = exp(-x²/2) / √(2π)`
#[inline]
pub fn normal_pdf(x: Real) -> Real {
    (-0.5 * x * x).exp() / (2.0 * PI).sqrt()
}

/// The standard normal cumulative distribution function Φ(x).
#[inline]
pub fn normal_cdf(x: Real) -> Real {
    0.5 * erfc(-x * FRAC_1_SQRT_2)
}
