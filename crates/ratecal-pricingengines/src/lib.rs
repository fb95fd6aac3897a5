//! # ratecal-pricingengines
//!
//! Swaption pricing engines for the calibrated short-rate models.
//!
//! ## Engines
//!
//! - [`G2SwaptionEngine`]: G2++ closed form reduced to a one-dimensional
//!   integral over the first factor
//! - [`JamshidianSwaptionEngine`]: Hull-White, Jamshidian decomposition
//!   into zero-coupon bond options
//! - [`FdHullWhiteSwaptionEngine`]: Hull-White, Crank–Nicolson rollback
//!   of the exercise payoff on a state grid

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod fd_hull_white_swaption_engine;
pub mod g2_swaption_engine;
pub mod jamshidian_swaption_engine;

pub use fd_hull_white_swaption_engine::{
    fd_hull_white_swaption, FdGridSettings, FdHullWhiteSwaptionEngine,
};
pub use g2_swaption_engine::{g2_swaption, G2SwaptionEngine};
pub use jamshidian_swaption_engine::{jamshidian_swaption, JamshidianSwaptionEngine};

/// Brent settings for the inner root searches of the engines.
pub(crate) const INNER_ACCURACY: ratecal_core::Real = 1.0e-10;
pub(crate) const INNER_MAX_EVALUATIONS: ratecal_core::Size = 200;
