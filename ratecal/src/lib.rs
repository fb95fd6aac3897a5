//! # ratecal
//!
//! Calibrates the two-factor G2++ and one-factor Hull-White short-rate
//! models to an at-the-money swaption volatility grid and reports the fit.
//!
//! This crate is a **façade** over the `ratecal-*` workspace crates plus
//! the pieces that tie them into a run: the market grid, the TOML
//! configuration, the calibration session and the text report.
//!
//! ```no_run
//! use ratecal::{CalibrationConfig, CalibrationSession, ModelChoice};
//!
//! let session = CalibrationSession::new(CalibrationConfig::default())?;
//! for report in session.run(&[ModelChoice::G2, ModelChoice::HullWhite])? {
//!     println!("{report}");
//! }
//! # Ok::<(), ratecal::core::Error>(())
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use ratecal_core as core;

/// Dates, calendars, day counters and schedules.
pub use ratecal_time as time;

/// Distributions, Black formula, integration, root finding and optimisation.
pub use ratecal_math as math;

/// Market quotes.
pub use ratecal_quotes as quotes;

/// Discount curves.
pub use ratecal_termstructures as termstructures;

/// Calibrated short-rate models.
pub use ratecal_models as models;

/// Finite-difference methods.
pub use ratecal_methods as methods;

/// Swaptions and calibration helpers.
pub use ratecal_instruments as instruments;

/// Swaption pricing engines.
pub use ratecal_pricingengines as pricingengines;

pub mod calibration;
pub mod config;
pub mod grid;
pub mod report;

pub use calibration::{CalibrationSession, ModelChoice};
pub use config::{CalibrationConfig, FixedDayCounter, HwEngineKind};
pub use grid::{MarketGrid, MarketGridPoint};
pub use report::{HelperLine, ImpliedVolPolicy, ModelReport};
