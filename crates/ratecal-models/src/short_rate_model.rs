//! Short-rate models: calibrated models fitted to an initial discount
//! curve.
//!
//! ```text
//! CalibratedModel
//! └── ShortRateModel
//!     ├── HullWhite
//!     └── G2Model
//! ```

use crate::calibrated_model::CalibratedModel;
use ratecal_core::{errors::Result, Handle};
use ratecal_termstructures::YieldTermStructure;

/// A short-rate model exactly fitting its initial yield curve.
pub trait ShortRateModel: CalibratedModel {
    /// The initial yield curve.
    fn term_structure(&self) -> &Handle<dyn YieldTermStructure>;

    /// Borrow the initial curve, failing on an empty handle.
    fn curve(&self) -> Result<&dyn YieldTermStructure> {
        self.term_structure().try_get()
    }
}

/// `(1 − e^{−x·t}) / x`, continuous at `x = 0`.
pub(crate) fn decay_factor(x: ratecal_core::Real, t: ratecal_core::Time) -> ratecal_core::Real {
    if x.abs() < f64::EPSILON.sqrt() {
        t
    } else {
        -(-x * t).exp_m1() / x
    }
}
