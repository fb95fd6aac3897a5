//! # ratecal-methods
//!
//! Numerical methods: a tridiagonal operator with a Thomas-algorithm
//! solver and a θ-scheme (implicit / Crank–Nicolson) rollback for
//! one-dimensional convection–diffusion–reaction PDEs.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// Finite difference methods: tridiagonal solver, 1-D PDE rollback.
pub mod finite_differences;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use finite_differences::{
    Fdm1dSolver, FdmScheme, Pde1d, PdeCoefficients, TridiagonalOperator, UniformGrid,
};
