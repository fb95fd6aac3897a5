//! # ratecal-termstructures
//!
//! Yield term structures: the [`YieldTermStructure`] trait with its
//! discount / zero / forward relationships, and the quote-driven
//! [`FlatForward`] curve the calibration runs against.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Flat forward curve.
pub mod flat_forward;

/// Base trait for all term structures.
pub mod term_structure;

/// Yield curve trait.
pub mod yield_term_structure;

pub use flat_forward::FlatForward;
pub use term_structure::TermStructure;
pub use yield_term_structure::YieldTermStructure;
