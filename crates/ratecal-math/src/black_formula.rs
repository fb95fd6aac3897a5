//! Black (lognormal forward) option formula.
//!
//! Used twice in swaption calibration: to price a swaption from its quoted
//! volatility (the annuity is the discount factor), and to price the
//! zero-coupon bond options in the Jamshidian decomposition.

use crate::distributions::normal_cdf;
use ratecal_core::{ensure, errors::Result, Real};

/// Call or put.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionType {
    /// Right to buy (a payer swaption is a call on the swap rate).
    Call,
    /// Right to sell.
    Put,
}

impl OptionType {
    /// +1 for Call, −1 for Put.
    pub fn sign(self) -> Real {
        match self {
            OptionType::Call => 1.0,
            OptionType::Put => -1.0,
        }
    }
}

/// Black price of an option on a lognormal forward.
///
/// `std_dev` is the total standard deviation `σ√T`; `discount` multiplies
/// the undiscounted value (for a swaption it is the annuity).
///
/// ```text
/// price = discount · ω · (F·Φ(ω·d1) − K·Φ(ω·d2))
/// d1,2  = ln(F/K)/std_dev ± std_dev/2
/// ```
pub fn black_formula(
    option_type: OptionType,
    strike: Real,
    forward: Real,
    std_dev: Real,
    discount: Real,
) -> Result<Real> {
    ensure!(std_dev >= 0.0, "negative standard deviation {std_dev}");
    ensure!(discount > 0.0, "non-positive discount {discount}");
    ensure!(forward > 0.0, "non-positive forward {forward}");
    ensure!(strike >= 0.0, "negative strike {strike}");

    let w = option_type.sign();
    if std_dev == 0.0 || strike == 0.0 {
        return Ok(discount * (w * (forward - strike)).max(0.0));
    }
    let d1 = (forward / strike).ln() / std_dev + 0.5 * std_dev;
    let d2 = d1 - std_dev;
    let value = w * (forward * normal_cdf(w * d1) - strike * normal_cdf(w * d2));
    Ok(discount * value.max(0.0))
}
