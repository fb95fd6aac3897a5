//! # ratecal-models
//!
//! Calibrated short-rate models and the calibration loop.
//!
//! ## Trait hierarchy
//!
//! ```text
//! CalibratedModel           parameters, state, calibrate()
//! └── ShortRateModel        discount curve
//!     ├── HullWhite         one factor: [a, sigma]
//!     └── G2Model           two factors: [a, sigma, b, eta, rho]
//!
//! CalibrationHelper         market instrument seen by calibrate()
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Infrastructure ───────────────────────────────────────────────────────
pub mod calibrated_model;
pub mod calibration_helper;
pub mod short_rate_model;

// ── One-factor short-rate models ─────────────────────────────────────────
pub mod hull_white_model;

// ── Two-factor short-rate models ─────────────────────────────────────────
pub mod g2_model;

// ── Re-exports ───────────────────────────────────────────────────────────
pub use calibrated_model::{
    CalibratedModel, CalibrationOutcome, CalibrationState, ModelFamily, ModelParameters, Parameter,
};
pub use calibration_helper::{CalibrationErrorType, CalibrationHelper, ImpliedVolSettings};
pub use g2_model::{ForwardMoments, G2Model, G2Params};
pub use hull_white_model::{HullWhite, HullWhiteParams};
pub use short_rate_model::ShortRateModel;
