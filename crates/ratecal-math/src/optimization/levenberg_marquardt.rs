//! Levenberg–Marquardt nonlinear least squares.
//!
//! Damped Gauss–Newton in the unconstrained space of a
//! [`ParameterTransform`]. Each iteration solves
//!
//! ```text
//! (JᵀJ + μ·D) h = −Jᵀr,    D = diag(JᵀJ) floored
//! ```
//!
//! by Cholesky factorization, with the Jacobian `J` from forward
//! differences. The damping `μ` adapts to the ratio between actual and
//! predicted cost reduction (Nielsen's update), so rank-deficient problems
//! (more parameters than residuals) stay solvable.

use super::{CostFunction, EndCriteria, EndCriteriaType, OptimizationResult, ParameterTransform};
use crate::array::Array;
use nalgebra::{DMatrix, DVector};
use ratecal_core::{
    errors::{Error, Result},
    Real, Size,
};
use tracing::{debug, trace};

const DIAG_FLOOR: Real = 1e-12;
const MAX_DAMPING: Real = 1e16;
// Initial damping relative to the largest diagonal entry of JᵀJ.
const INITIAL_DAMPING: Real = 1e-3;

/// Levenberg–Marquardt least-squares optimizer.
#[derive(Debug, Clone, Copy)]
pub struct LevenbergMarquardt {
    epsfcn: Real,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self::new(1e-8)
    }
}

impl LevenbergMarquardt {
    /// Create an optimizer whose finite-difference step is `√epsfcn`
    /// relative to each coordinate.
    pub fn new(epsfcn: Real) -> Self {
        Self {
            epsfcn: if epsfcn > 0.0 { epsfcn } else { Real::EPSILON },
        }
    }

    /// Minimize `Σ rᵢ(x)²` starting from the admissible point `initial`.
    ///
    /// Structural errors from the cost function propagate; any other
    /// failure, or a non-finite residual, rejects the trial step.
    pub fn minimize<C: CostFunction + ?Sized>(
        &self,
        cost_fn: &C,
        transform: &ParameterTransform,
        initial: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult> {
        end_criteria.validate()?;
        if initial.is_empty() {
            return Err(Error::InvalidArgument("nothing to optimize".into()));
        }
        let residuals = |y: &Array| -> Result<Option<(Array, DVector<Real>)>> {
            let x = transform.direct(y)?;
            match cost_fn.values(&x) {
                Ok(r) if r.is_finite() => Ok(Some((x, r.into_inner()))),
                Ok(_) => Ok(None),
                Err(e) if e.is_structural() => Err(e),
                Err(e) => {
                    trace!(error = %e, "trial point rejected");
                    Ok(None)
                }
            }
        };

        let mut y = transform.inverse(initial)?;
        let (mut x, mut r) = match residuals(&y)? {
            Some(v) => v,
            None => {
                debug!("cost not evaluable at the starting point");
                return Ok(OptimizationResult {
                    x: initial.clone(),
                    value: Real::NAN,
                    iterations: 0,
                    end_type: EndCriteriaType::Unconverged,
                });
            }
        };
        let mut cost = r.norm_squared();
        let finish = |x: Array,
                      value: Real,
                      iterations: Size,
                      end_type: EndCriteriaType|
         -> Result<OptimizationResult> {
            debug!(iterations, value, %end_type, "levenberg-marquardt finished");
            Ok(OptimizationResult {
                x,
                value,
                iterations,
                end_type,
            })
        };
        if cost < end_criteria.root_epsilon {
            return finish(x, cost, 0, EndCriteriaType::RootEpsilon);
        }

        let (mut jac, mut missing) = self.jacobian(&residuals, &y, &r)?;
        let mut jtj = jac.transpose() * &jac;
        let mut grad = jac.transpose() * &r;
        let max_diag = jtj.diagonal().iter().fold(0.0_f64, |m, v| m.max(*v));
        let mut mu = INITIAL_DAMPING * max_diag.max(1.0e-6);
        let mut nu = 2.0;
        let mut stationary: Size = 0;
        let mut infeasible: Size = 0;
        let mut iterations: Size = 0;

        // Stalls caused by unevaluable points are failures, not stationary points.
        let stalled = |missing: Size, infeasible: Size, stationary: Size| {
            if missing > 0 || (infeasible > 0 && infeasible == stationary) {
                EndCriteriaType::Unconverged
            } else {
                EndCriteriaType::StationaryPoint
            }
        };

        loop {
            // A zero gradient built from missing columns proves nothing.
            if missing == 0 && grad.amax() <= end_criteria.gradient_norm_epsilon {
                return finish(x, cost, iterations, EndCriteriaType::GradientNormEpsilon);
            }
            if iterations >= end_criteria.max_iterations {
                return finish(x, cost, iterations, EndCriteriaType::MaxIterations);
            }
            iterations += 1;

            let scaling = jtj.diagonal().map(|d| d.max(DIAG_FLOOR));
            let mut damped = jtj.clone();
            for i in 0..damped.nrows() {
                damped[(i, i)] += mu * scaling[i];
            }
            let Some(chol) = damped.cholesky() else {
                mu *= nu;
                nu *= 2.0;
                stationary += 1;
                if stationary > end_criteria.max_stationary_state_iterations || mu > MAX_DAMPING {
                    let end_type = stalled(missing, infeasible, stationary);
                    return finish(x, cost, iterations, end_type);
                }
                continue;
            };
            let step = chol.solve(&(-&grad));

            let y_norm = y.norm();
            if missing == 0
                && step.norm() <= end_criteria.step_epsilon * (y_norm + end_criteria.step_epsilon)
            {
                return finish(x, cost, iterations, EndCriteriaType::StepEpsilon);
            }

            let y_trial = &y + &Array::from(step.clone());
            let predicted = step.dot(&(scaling.component_mul(&step) * mu - &grad));
            let trial = residuals(&y_trial)?;
            let gain = match &trial {
                Some((_, r_trial)) if predicted > 0.0 => {
                    (cost - r_trial.norm_squared()) / predicted
                }
                _ => Real::NEG_INFINITY,
            };

            let trial_infeasible = trial.is_none();
            if let (true, Some((x_trial, r_trial))) = (gain > 0.0, trial) {
                let new_cost = r_trial.norm_squared();
                let improvement = cost - new_cost;
                debug!(iteration = iterations, cost = new_cost, mu, gain, "step accepted");
                y = y_trial;
                x = x_trial;
                r = r_trial;
                cost = new_cost;
                (jac, missing) = self.jacobian(&residuals, &y, &r)?;
                jtj = jac.transpose() * &jac;
                grad = jac.transpose() * &r;
                mu *= (1.0 - (2.0 * gain - 1.0).powi(3)).max(1.0 / 3.0);
                nu = 2.0;
                stationary = 0;
                infeasible = 0;

                if cost < end_criteria.root_epsilon {
                    return finish(x, cost, iterations, EndCriteriaType::RootEpsilon);
                }
                if improvement.abs() < end_criteria.function_epsilon {
                    return finish(x, cost, iterations, EndCriteriaType::FunctionEpsilon);
                }
            } else {
                if trial_infeasible {
                    infeasible += 1;
                }
                trace!(iteration = iterations, mu, "step rejected");
                mu *= nu;
                nu *= 2.0;
                stationary += 1;
                if stationary > end_criteria.max_stationary_state_iterations || mu > MAX_DAMPING {
                    let end_type = stalled(missing, infeasible, stationary);
                    return finish(x, cost, iterations, end_type);
                }
            }
        }
    }

    /// Forward-difference Jacobian in the unconstrained space, with the
    /// number of columns that could not be computed. A column whose
    /// forward point is infeasible falls back to a backward difference,
    /// and is left at zero and counted if that fails too.
    fn jacobian<F>(
        &self,
        residuals: &F,
        y: &Array,
        r: &DVector<Real>,
    ) -> Result<(DMatrix<Real>, Size)>
    where
        F: Fn(&Array) -> Result<Option<(Array, DVector<Real>)>>,
    {
        let sqrt_eps = self.epsfcn.sqrt();
        let mut jac = DMatrix::zeros(r.len(), y.size());
        let mut missing: Size = 0;
        for j in 0..y.size() {
            let h = sqrt_eps * y[j].abs().max(1.0);
            let mut shifted = y.clone();
            shifted[j] += h;
            let column = match residuals(&shifted)? {
                Some((_, rp)) => Some((rp - r) / h),
                None => {
                    shifted[j] = y[j] - h;
                    residuals(&shifted)?.map(|(_, rm)| (r - rm) / h)
                }
            };
            match column {
                Some(c) => jac.set_column(j, &c),
                None => missing += 1,
            }
        }
        if missing > 0 {
            debug!(missing, "jacobian columns not evaluable");
        }
        Ok((jac, missing))
    }
}

#[cfg(test)]
mod tests {
    use super::super::{BoundaryConstraint, PositiveConstraint};
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;
    use std::sync::Arc;

    fn rosenbrock(x: &Array) -> Result<Array> {
        Ok(Array::from_slice(&[1.0 - x[0], 10.0 * (x[1] - x[0] * x[0])]))
    }

    fn tight() -> EndCriteria {
        EndCriteria::new(1000, 100, 1e-20, 1e-24, 1e-14).with_step_epsilon(1e-14)
    }

    #[test]
    fn solves_rosenbrock() {
        let result = LevenbergMarquardt::default()
            .minimize(
                &rosenbrock,
                &ParameterTransform::unconstrained(2),
                &Array::from_slice(&[-1.2, 1.0]),
                &tight(),
            )
            .unwrap();
        assert!(result.end_type.is_converged(), "{:?}", result.end_type);
        assert_abs_diff_eq!(result.x[0], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.x[1], 1.0, epsilon = 1e-6);
    }

    #[test]
    fn fits_exponential_decay_with_positive_rate() {
        let ts = [0.5, 1.0, 2.0, 3.0, 5.0, 7.0];
        let data: Vec<Real> = ts.iter().map(|t| 2.0 * (-0.3_f64 * t).exp()).collect();
        let cost = |p: &Array| -> Result<Array> {
            Ok(ts
                .iter()
                .zip(&data)
                .map(|(t, d)| p[0] * (-p[1] * t).exp() - d)
                .collect())
        };
        let transform = ParameterTransform::new(vec![
            Arc::new(PositiveConstraint),
            Arc::new(PositiveConstraint),
        ]);
        let result = LevenbergMarquardt::default()
            .minimize(&cost, &transform, &Array::from_slice(&[1.0, 1.0]), &tight())
            .unwrap();
        assert_abs_diff_eq!(result.x[0], 2.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.x[1], 0.3, epsilon = 1e-6);
    }

    #[test]
    fn boundary_is_respected() {
        // Unconstrained optimum at 2.0 lies outside [-1, 1].
        let cost = |p: &Array| -> Result<Array> { Ok(Array::from_slice(&[p[0] - 2.0])) };
        let transform =
            ParameterTransform::new(vec![Arc::new(BoundaryConstraint::new(-1.0, 1.0).unwrap())]);
        let result = LevenbergMarquardt::default()
            .minimize(&cost, &transform, &Array::from_slice(&[0.0]), &EndCriteria::default())
            .unwrap();
        assert!(result.x[0] <= 1.0 && result.x[0] > 0.99);
    }

    #[test]
    fn rank_deficient_does_not_crash() {
        // One residual, three parameters.
        let cost = |p: &Array| -> Result<Array> { Ok(Array::from_slice(&[p[0] + p[1] + p[2] - 3.0])) };
        let result = LevenbergMarquardt::default()
            .minimize(
                &cost,
                &ParameterTransform::unconstrained(3),
                &Array::zeros(3),
                &EndCriteria::default(),
            )
            .unwrap();
        assert!(result.x.is_finite());
        assert!(result.value < 1e-8);
    }

    #[test]
    fn max_iterations_is_reported() {
        let ec = EndCriteria::new(2, 100, 1e-30, 1e-30, 1e-30).with_step_epsilon(0.0);
        let result = LevenbergMarquardt::default()
            .minimize(
                &rosenbrock,
                &ParameterTransform::unconstrained(2),
                &Array::from_slice(&[-1.2, 1.0]),
                &ec,
            )
            .unwrap();
        assert_eq!(result.end_type, EndCriteriaType::MaxIterations);
        assert_eq!(result.iterations, 2);
    }

    #[test]
    fn non_finite_start_is_unconverged() {
        let cost = |_: &Array| -> Result<Array> { Ok(Array::from_slice(&[Real::NAN])) };
        let result = LevenbergMarquardt::default()
            .minimize(
                &cost,
                &ParameterTransform::unconstrained(1),
                &Array::zeros(1),
                &EndCriteria::default(),
            )
            .unwrap();
        assert_eq!(result.end_type, EndCriteriaType::Unconverged);
    }

    #[test]
    fn structural_errors_propagate() {
        let calls = Cell::new(0);
        let cost = |p: &Array| -> Result<Array> {
            calls.set(calls.get() + 1);
            if calls.get() > 1 {
                return Err(Error::NoEngine("helper 0".into()));
            }
            Ok(Array::from_slice(&[p[0] - 1.0]))
        };
        let err = LevenbergMarquardt::default()
            .minimize(
                &cost,
                &ParameterTransform::unconstrained(1),
                &Array::zeros(1),
                &EndCriteria::default(),
            )
            .unwrap_err();
        assert!(matches!(err, Error::NoEngine(_)));
    }

    #[test]
    fn numerical_errors_reject_the_step() {
        // Fails for x > 0.5; the optimum at 0.4 is still reached.
        let cost = |p: &Array| -> Result<Array> {
            if p[0] > 0.5 {
                return Err(Error::Runtime("out of range".into()));
            }
            Ok(Array::from_slice(&[p[0] - 0.4]))
        };
        let result = LevenbergMarquardt::default()
            .minimize(
                &cost,
                &ParameterTransform::unconstrained(1),
                &Array::zeros(1),
                &EndCriteria::default(),
            )
            .unwrap();
        assert_abs_diff_eq!(result.x[0], 0.4, epsilon = 1e-4);
    }

    #[test]
    fn unevaluable_neighbourhood_is_unconverged() {
        // Only the starting point can be priced: no Jacobian column exists.
        let cost = |p: &Array| -> Result<Array> {
            if p[0] != 0.5 {
                return Err(Error::RootNotBracketed {
                    lower: 0.05,
                    upper: 0.5,
                    reason: "same sign".into(),
                });
            }
            Ok(Array::from_slice(&[p[0] - 0.1]))
        };
        let result = LevenbergMarquardt::default()
            .minimize(
                &cost,
                &ParameterTransform::unconstrained(1),
                &Array::from_slice(&[0.5]),
                &EndCriteria::default(),
            )
            .unwrap();
        assert_eq!(result.end_type, EndCriteriaType::Unconverged);
        assert!(!result.end_type.is_converged());
        assert_eq!(result.x[0], 0.5);
    }

    #[test]
    fn zero_gradient_at_the_start() {
        // Residuals pull in opposite directions and balance at 0.
        let cost = |p: &Array| -> Result<Array> { Ok(Array::from_slice(&[p[0] - 1.0, p[0] + 1.0])) };
        let result = LevenbergMarquardt::default()
            .minimize(
                &cost,
                &ParameterTransform::unconstrained(1),
                &Array::zeros(1),
                &EndCriteria::default(),
            )
            .unwrap();
        assert_eq!(result.end_type, EndCriteriaType::GradientNormEpsilon);
        assert_eq!(result.iterations, 0);
        assert_abs_diff_eq!(result.value, 2.0, epsilon = 1e-12);
    }

    #[test]
    fn coarse_step_tolerance_stops_early() {
        let ec = EndCriteria::new(100, 100, 1e-30, 1e-30, 1e-30).with_step_epsilon(10.0);
        let result = LevenbergMarquardt::default()
            .minimize(
                &rosenbrock,
                &ParameterTransform::unconstrained(2),
                &Array::from_slice(&[-1.2, 1.0]),
                &ec,
            )
            .unwrap();
        assert_eq!(result.end_type, EndCriteriaType::StepEpsilon);
        assert_eq!(result.iterations, 1);
    }

    #[test]
    fn kink_is_a_stationary_point() {
        // Every downhill step from the kink raises the cost.
        let cost = |p: &Array| -> Result<Array> { Ok(Array::from_slice(&[1.0 + p[0].abs()])) };
        let ec = EndCriteria::new(100, 5, 1e-30, 1e-30, 1e-8).with_step_epsilon(0.0);
        let result = LevenbergMarquardt::default()
            .minimize(
                &cost,
                &ParameterTransform::unconstrained(1),
                &Array::zeros(1),
                &ec,
            )
            .unwrap();
        assert_eq!(result.end_type, EndCriteriaType::StationaryPoint);
        assert!(result.end_type.is_converged());
        assert_eq!(result.iterations, 6);
        assert_eq!(result.x[0], 0.0);
    }
}
