//! Optimization framework.
//!
//! Cost functions map a parameter vector to a residual vector; constraints
//! double as transforms between the constrained parameter domain and the
//! unconstrained space the optimizer walks in; end criteria bound the
//! search and tag how it stopped.

mod levenberg_marquardt;

pub use levenberg_marquardt::LevenbergMarquardt;

use crate::array::Array;
use ratecal_core::{
    ensure,
    errors::{Error, Result},
    Real, Size,
};
use std::fmt;

// ── Cost function trait ───────────────────────────────────────────────────────

/// A least-squares objective: parameters in, residuals out.
///
/// Evaluation may fail. Structural failures (see
/// [`Error::is_structural`]) abort the optimization; any other failure is
/// treated by the optimizer as an infeasible trial point.
pub trait CostFunction {
    /// Residual vector at `x`.
    fn values(&self, x: &Array) -> Result<Array>;

    /// Sum of squared residuals at `x`.
    fn value(&self, x: &Array) -> Result<Real> {
        Ok(self.values(x)?.norm_squared())
    }
}

impl<F> CostFunction for F
where
    F: Fn(&Array) -> Result<Array>,
{
    fn values(&self, x: &Array) -> Result<Array> {
        self(x)
    }
}

// ── Constraints ───────────────────────────────────────────────────────────────

/// A constraint on a single parameter, expressed as a smooth bijection
/// between the real line and the admissible domain.
pub trait Constraint: fmt::Debug + Send + Sync {
    /// Whether `x` lies in the admissible domain.
    fn test(&self, x: Real) -> bool;

    /// Map an unconstrained value into the admissible domain.
    fn direct(&self, y: Real) -> Real;

    /// Map an admissible value into the unconstrained space.
    fn inverse(&self, x: Real) -> Result<Real>;
}

/// No constraint: every real value is accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraint;

impl Constraint for NoConstraint {
    fn test(&self, x: Real) -> bool {
        x.is_finite()
    }

    fn direct(&self, y: Real) -> Real {
        y
    }

    fn inverse(&self, x: Real) -> Result<Real> {
        ensure!(x.is_finite(), "parameter value {x} is not finite");
        Ok(x)
    }
}

/// Strictly positive values, through `x = exp(y)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositiveConstraint;

impl Constraint for PositiveConstraint {
    fn test(&self, x: Real) -> bool {
        x > 0.0 && x.is_finite()
    }

    fn direct(&self, y: Real) -> Real {
        y.exp()
    }

    fn inverse(&self, x: Real) -> Result<Real> {
        ensure!(self.test(x), "parameter value {x} must be positive");
        Ok(x.ln())
    }
}

/// Values in the closed interval `[lo, hi]`, through
/// `x = lo + (hi − lo)·(1 + tanh y)/2`.
#[derive(Debug, Clone, Copy)]
pub struct BoundaryConstraint {
    /// Lower bound.
    pub lo: Real,
    /// Upper bound.
    pub hi: Real,
}

impl BoundaryConstraint {
    // atanh(1 - 1e-12) ≈ 14.2; keeps boundary values invertible.
    const EDGE: Real = 1.0 - 1e-12;

    /// Create a boundary constraint.
    pub fn new(lo: Real, hi: Real) -> Result<Self> {
        if !(lo < hi) {
            return Err(Error::InvalidArgument(format!(
                "empty boundary constraint [{lo}, {hi}]"
            )));
        }
        Ok(Self { lo, hi })
    }
}

impl Constraint for BoundaryConstraint {
    fn test(&self, x: Real) -> bool {
        x >= self.lo && x <= self.hi
    }

    fn direct(&self, y: Real) -> Real {
        let x = self.lo + 0.5 * (self.hi - self.lo) * (1.0 + y.tanh());
        x.clamp(self.lo, self.hi)
    }

    fn inverse(&self, x: Real) -> Result<Real> {
        ensure!(
            self.test(x),
            "parameter value {x} outside [{}, {}]",
            self.lo,
            self.hi
        );
        let z = 2.0 * (x - self.lo) / (self.hi - self.lo) - 1.0;
        Ok(z.clamp(-Self::EDGE, Self::EDGE).atanh())
    }
}

/// One constraint per parameter, applied coordinate-wise.
#[derive(Debug, Clone)]
pub struct ParameterTransform {
    constraints: Vec<std::sync::Arc<dyn Constraint>>,
}

impl ParameterTransform {
    /// Build a transform from per-parameter constraints.
    pub fn new(constraints: Vec<std::sync::Arc<dyn Constraint>>) -> Self {
        Self { constraints }
    }

    /// An identity transform on `n` parameters.
    pub fn unconstrained(n: Size) -> Self {
        Self::new(
            (0..n)
                .map(|_| std::sync::Arc::new(NoConstraint) as std::sync::Arc<dyn Constraint>)
                .collect(),
        )
    }

    /// Number of parameters covered.
    pub fn size(&self) -> Size {
        self.constraints.len()
    }

    /// Whether every coordinate of `x` is admissible.
    pub fn test(&self, x: &Array) -> bool {
        x.size() == self.size() && self.constraints.iter().zip(x.iter()).all(|(c, &v)| c.test(v))
    }

    /// Unconstrained → admissible.
    pub fn direct(&self, y: &Array) -> Result<Array> {
        self.check_size(y)?;
        Ok(self
            .constraints
            .iter()
            .zip(y.iter())
            .map(|(c, &v)| c.direct(v))
            .collect())
    }

    /// Admissible → unconstrained.
    pub fn inverse(&self, x: &Array) -> Result<Array> {
        self.check_size(x)?;
        self.constraints
            .iter()
            .zip(x.iter())
            .map(|(c, &v)| c.inverse(v))
            .collect::<Result<Vec<_>>>()
            .map(Array::from_vec)
    }

    fn check_size(&self, x: &Array) -> Result<()> {
        ensure!(
            x.size() == self.size(),
            "parameter vector has {} entries, transform expects {}",
            x.size(),
            self.size()
        );
        Ok(())
    }
}

// ── End criteria ──────────────────────────────────────────────────────────────

/// Criteria to stop an optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct EndCriteria {
    /// Maximum number of iterations.
    pub max_iterations: Size,
    /// Maximum number of consecutive iterations without progress.
    pub max_stationary_state_iterations: Size,
    /// Stop when the cost drops below this.
    pub root_epsilon: Real,
    /// Stop when an accepted step changes the cost by less than this.
    pub function_epsilon: Real,
    /// Stop when the gradient's largest component drops below this.
    pub gradient_norm_epsilon: Real,
    /// Stop when the step is this small relative to the iterate.
    pub step_epsilon: Real,
}

impl EndCriteria {
    /// Create new end criteria; the step epsilon defaults to `1e-8`.
    pub fn new(
        max_iterations: Size,
        max_stationary_state_iterations: Size,
        root_epsilon: Real,
        function_epsilon: Real,
        gradient_norm_epsilon: Real,
    ) -> Self {
        Self {
            max_iterations,
            max_stationary_state_iterations,
            root_epsilon,
            function_epsilon,
            gradient_norm_epsilon,
            step_epsilon: 1e-8,
        }
    }

    /// Replace the step-size tolerance.
    pub fn with_step_epsilon(mut self, step_epsilon: Real) -> Self {
        self.step_epsilon = step_epsilon;
        self
    }

    /// Check that every bound is usable.
    pub fn validate(&self) -> Result<()> {
        ensure!(self.max_iterations > 0, "max_iterations must be positive");
        for (name, v) in [
            ("root_epsilon", self.root_epsilon),
            ("function_epsilon", self.function_epsilon),
            ("gradient_norm_epsilon", self.gradient_norm_epsilon),
            ("step_epsilon", self.step_epsilon),
        ] {
            ensure!(v >= 0.0 && v.is_finite(), "{name} must be non-negative, got {v}");
        }
        Ok(())
    }
}

impl Default for EndCriteria {
    fn default() -> Self {
        Self::new(400, 100, 1e-8, 1e-8, 1e-8)
    }
}

/// The reason an optimization terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndCriteriaType {
    /// Maximum iterations reached.
    MaxIterations,
    /// No progress for too many consecutive iterations.
    StationaryPoint,
    /// Cost below the root epsilon.
    RootEpsilon,
    /// Cost change below the function epsilon.
    FunctionEpsilon,
    /// Gradient below the gradient-norm epsilon.
    GradientNormEpsilon,
    /// Step below the step epsilon.
    StepEpsilon,
    /// The cost could not be evaluated where the search needed it: at the
    /// starting point, along a Jacobian column, or at every trial point of
    /// a stall.
    Unconverged,
}

impl EndCriteriaType {
    /// Whether the search stopped on a tolerance rather than giving up.
    pub fn is_converged(self) -> bool {
        !matches!(self, Self::MaxIterations | Self::Unconverged)
    }
}

impl fmt::Display for EndCriteriaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::MaxIterations => "MaxIterations",
            Self::StationaryPoint => "StationaryPoint",
            Self::RootEpsilon => "RootEpsilon",
            Self::FunctionEpsilon => "FunctionEpsilon",
            Self::GradientNormEpsilon => "GradientNormEpsilon",
            Self::StepEpsilon => "StepEpsilon",
            Self::Unconverged => "Unconverged",
        };
        f.write_str(s)
    }
}

/// Result of an optimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Final parameter values, in the constrained domain.
    pub x: Array,
    /// Sum of squared residuals at `x`.
    pub value: Real,
    /// Number of iterations performed.
    pub iterations: Size,
    /// Reason for termination.
    pub end_type: EndCriteriaType,
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;
    use std::sync::Arc;

    #[test]
    fn positive_constraint() {
        let c = PositiveConstraint;
        assert!(c.test(1.0));
        assert!(!c.test(0.0));
        assert!(c.inverse(-1.0).is_err());
        assert_abs_diff_eq!(c.direct(c.inverse(0.01).unwrap()), 0.01, epsilon = 1e-16);
    }

    #[test]
    fn boundary_constraint() {
        let c = BoundaryConstraint::new(-1.0, 1.0).unwrap();
        assert!(c.test(-1.0) && c.test(1.0));
        assert!(!c.test(1.5));
        assert_abs_diff_eq!(c.direct(c.inverse(-0.75).unwrap()), -0.75, epsilon = 1e-14);
        assert!(c.inverse(1.0).unwrap().is_finite());
        assert_eq!(c.direct(1e6), 1.0);
        assert!(BoundaryConstraint::new(1.0, 1.0).is_err());
    }

    #[test]
    fn transform_size_mismatch() {
        let t = ParameterTransform::unconstrained(2);
        assert!(t.direct(&Array::zeros(3)).is_err());
        assert!(!t.test(&Array::zeros(3)));
    }

    #[test]
    fn end_criteria_defaults() {
        let ec = EndCriteria::default();
        assert_eq!(ec.max_iterations, 400);
        assert_eq!(ec.max_stationary_state_iterations, 100);
        assert_eq!(ec.step_epsilon, 1e-8);
        assert!(ec.validate().is_ok());
        assert!(ec.clone().with_step_epsilon(-1.0).validate().is_err());
    }

    #[test]
    fn convergence_tags() {
        assert!(EndCriteriaType::FunctionEpsilon.is_converged());
        assert!(EndCriteriaType::StationaryPoint.is_converged());
        assert!(!EndCriteriaType::MaxIterations.is_converged());
        assert!(!EndCriteriaType::Unconverged.is_converged());
        assert_eq!(EndCriteriaType::StepEpsilon.to_string(), "StepEpsilon");
    }

    proptest! {
        #[test]
        fn transforms_map_into_domain(y in -50.0f64..50.0) {
            let t = ParameterTransform::new(vec![
                Arc::new(PositiveConstraint),
                Arc::new(BoundaryConstraint::new(-1.0, 1.0).unwrap()),
            ]);
            let x = t.direct(&Array::from_slice(&[y, y])).unwrap();
            prop_assert!(t.test(&x));
        }

        #[test]
        fn transforms_round_trip(a in 1e-4f64..10.0, rho in -0.999f64..0.999) {
            let t = ParameterTransform::new(vec![
                Arc::new(PositiveConstraint),
                Arc::new(BoundaryConstraint::new(-1.0, 1.0).unwrap()),
            ]);
            let x = Array::from_slice(&[a, rho]);
            let back = t.direct(&t.inverse(&x).unwrap()).unwrap();
            prop_assert!((back[0] - a).abs() <= 1e-12 * a.max(1.0));
            prop_assert!((back[1] - rho).abs() <= 1e-12);
        }
    }
}
