//! # ratecal-instruments
//!
//! The instruments a short-rate model is calibrated to: European swaptions
//! on vanilla fixed-for-floating swaps, the [`SwaptionEngine`] contract
//! engines implement to price them, and [`SwaptionHelper`], the
//! calibration helper wrapping one quoted swaption volatility.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod ibor_convention;
pub mod pricing_engine;
pub mod swaption;
pub mod swaption_helper;

pub use ibor_convention::IborConvention;
pub use pricing_engine::SwaptionEngine;
pub use ratecal_models::CalibrationErrorType;
pub use swaption::{SwapType, SwaptionArguments};
pub use swaption_helper::SwaptionHelper;
