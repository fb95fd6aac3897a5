//! One-dimensional root finding.
//!
//! Brent's method (bisection, secant and inverse quadratic interpolation)
//! over a user-supplied bracket with an explicit evaluation budget. The
//! objective may itself fail; its errors propagate unchanged.

use ratecal_core::{
    errors::{Error, Result},
    Real, Size,
};

const DEFAULT_ACCURACY: Real = 1.0e-11;
const DEFAULT_MAX_EVALUATIONS: Size = 100;

/// A root together with the number of objective evaluations spent on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootSolution {
    /// The abscissa where the objective vanishes within accuracy.
    pub root: Real,
    /// Objective evaluations, including the two bracket ends.
    pub evaluations: Size,
}

/// Brent's method for finding a root of `f(x)` in `[x_min, x_max]`.
#[derive(Debug, Clone, Copy)]
pub struct Brent {
    accuracy: Real,
    max_evaluations: Size,
}

impl Default for Brent {
    fn default() -> Self {
        Self {
            accuracy: DEFAULT_ACCURACY,
            max_evaluations: DEFAULT_MAX_EVALUATIONS,
        }
    }
}

impl Brent {
    /// A solver with the given accuracy on `x` and evaluation budget.
    ///
    /// Non-positive accuracies fall back to `1e-11`.
    pub fn new(accuracy: Real, max_evaluations: Size) -> Self {
        Self {
            accuracy: if accuracy > 0.0 { accuracy } else { DEFAULT_ACCURACY },
            max_evaluations: max_evaluations.max(2),
        }
    }

    /// Accuracy on the root.
    pub fn accuracy(&self) -> Real {
        self.accuracy
    }

    /// Maximum number of objective evaluations.
    pub fn max_evaluations(&self) -> Size {
        self.max_evaluations
    }

    /// Solve for the root of an infallible objective.
    pub fn solve<F>(&self, f: F, x_min: Real, x_max: Real) -> Result<RootSolution>
    where
        F: Fn(Real) -> Real,
    {
        self.try_solve(|x| Ok(f(x)), x_min, x_max)
    }

    /// Solve for a root of `f` near `guess` when no bracket is known.
    ///
    /// Starting from `[guess − step, guess + step]`, the end with the
    /// smaller `|f|` is pushed outwards geometrically until `f` changes
    /// sign; the bracket search shares the evaluation budget with the
    /// refinement.
    pub fn try_solve_from<F>(&self, f: F, guess: Real, step: Real) -> Result<RootSolution>
    where
        F: Fn(Real) -> Result<Real>,
    {
        const GROWTH: Real = 1.6;
        if !(step > 0.0) {
            return Err(Error::InvalidArgument(format!(
                "bracketing step must be positive, got {step}"
            )));
        }
        let mut lo = guess - step;
        let mut hi = guess + step;
        let mut f_lo = f(lo)?;
        let mut f_hi = f(hi)?;
        let mut evaluations: Size = 2;
        while f_lo * f_hi > 0.0 {
            if evaluations >= self.max_evaluations || !f_lo.is_finite() || !f_hi.is_finite() {
                return Err(Error::RootNotBracketed {
                    lower: lo,
                    upper: hi,
                    reason: format!("no sign change found after {evaluations} evaluations"),
                });
            }
            if f_lo.abs() < f_hi.abs() {
                lo += GROWTH * (lo - hi);
                f_lo = f(lo)?;
            } else {
                hi += GROWTH * (hi - lo);
                f_hi = f(hi)?;
            }
            evaluations += 1;
        }
        let remaining = Self::new(self.accuracy, self.max_evaluations.saturating_sub(evaluations));
        let sol = remaining.try_solve(&f, lo, hi)?;
        Ok(RootSolution {
            root: sol.root,
            evaluations: evaluations + sol.evaluations,
        })
    }

    /// Solve for the root of `f` in `[x_min, x_max]`.
    ///
    /// Fails with [`Error::RootNotBracketed`] when `f` has the same sign at
    /// both ends, when it is not finite there, or when the evaluation budget
    /// runs out before the accuracy is met.
    pub fn try_solve<F>(&self, f: F, x_min: Real, x_max: Real) -> Result<RootSolution>
    where
        F: Fn(Real) -> Result<Real>,
    {
        if !(x_min < x_max) {
            return Err(Error::InvalidArgument(format!(
                "invalid bracket [{x_min}, {x_max}]"
            )));
        }
        let not_bracketed = |reason: String| Error::RootNotBracketed {
            lower: x_min,
            upper: x_max,
            reason,
        };

        let mut a = x_min;
        let mut b = x_max;
        let mut fa = f(a)?;
        let mut fb = f(b)?;
        let mut evaluations: Size = 2;

        if !fa.is_finite() || !fb.is_finite() {
            return Err(not_bracketed(format!(
                "objective not finite at the bracket ends (f(lower) = {fa}, f(upper) = {fb})"
            )));
        }
        if fa == 0.0 {
            return Ok(RootSolution { root: a, evaluations });
        }
        if fb == 0.0 {
            return Ok(RootSolution { root: b, evaluations });
        }
        if fa * fb > 0.0 {
            return Err(not_bracketed(format!(
                "f(lower) = {fa:e} and f(upper) = {fb:e} have the same sign"
            )));
        }

        let mut c = b;
        let mut fc = fb;
        let mut d = b - a;
        let mut e = d;

        loop {
            if fb * fc > 0.0 {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }
            let tol = 2.0 * Real::EPSILON * b.abs() + 0.5 * self.accuracy;
            let xm = 0.5 * (c - b);
            if xm.abs() <= tol || fb == 0.0 {
                return Ok(RootSolution { root: b, evaluations });
            }
            if evaluations >= self.max_evaluations {
                return Err(not_bracketed(format!(
                    "evaluation budget exhausted after {evaluations} evaluations"
                )));
            }
            if e.abs() >= tol && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (p, q) = if a == c {
                    (2.0 * xm * s, 1.0 - s)
                } else {
                    let q = fa / fc;
                    let r = fb / fc;
                    (
                        s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                        (q - 1.0) * (r - 1.0) * (s - 1.0),
                    )
                };
                let (p, q) = if p > 0.0 { (p, -q) } else { (-p, q) };
                if 2.0 * p < (3.0 * xm * q - (tol * q).abs()).min((e * q).abs()) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }
            a = b;
            fa = fb;
            b += if d.abs() > tol { d } else { tol.copysign(xm) };
            fb = f(b)?;
            evaluations += 1;
        }
    }
}
