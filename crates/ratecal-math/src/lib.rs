//! # ratecal-math
//!
//! Mathematical utilities for model calibration: an [`Array`] newtype over
//! nalgebra, the normal distribution (via statrs), Brent root finding,
//! segment integration, the Black formula, and the Levenberg–Marquardt
//! least-squares optimizer with its end criteria and parameter transforms.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// One-dimensional real vector.
pub mod array;

/// Black (lognormal) option formula.
pub mod black_formula;

/// Normal distribution.
pub mod distributions;

/// Fixed-step numerical integration.
pub mod integrals;

/// Cost functions, constraints, end criteria, and optimizers.
pub mod optimization;

/// 1D root-finding solvers.
pub mod solvers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use array::Array;
pub use black_formula::{black_formula, OptionType};
pub use distributions::{normal_cdf, normal_pdf};
pub use integrals::SegmentIntegral;
pub use optimization::{
    BoundaryConstraint, Constraint, CostFunction, EndCriteria, EndCriteriaType,
    LevenbergMarquardt, NoConstraint, OptimizationResult, ParameterTransform, PositiveConstraint,
};
pub use solvers1d::{Brent, RootSolution};
