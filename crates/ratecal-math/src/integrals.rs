//! Fixed-step numerical integration.

use ratecal_core::{
    errors::{Error, Result},
    Real, Size,
};

/// Composite trapezoidal rule on a fixed number of equal segments.
///
/// The integrand is evaluated at `intervals + 1` equally spaced points, so
/// the cost of an integration is known in advance. This is what the G2++
/// swaption formula uses: its integrand is smooth and the number of
/// evaluations, each of which involves a root search, must stay bounded.
#[derive(Debug, Clone, Copy)]
pub struct SegmentIntegral {
    intervals: Size,
}

impl SegmentIntegral {
    /// Create an integrator using `intervals` segments.
    pub fn new(intervals: Size) -> Result<Self> {
        if intervals == 0 {
            return Err(Error::InvalidArgument(
                "segment integral needs at least one interval".into(),
            ));
        }
        Ok(Self { intervals })
    }

    /// Number of segments.
    pub fn intervals(&self) -> Size {
        self.intervals
    }

    /// Integrate a fallible integrand `f` over `[a, b]`.
    pub fn integrate<F>(&self, f: F, a: Real, b: Real) -> Result<Real>
    where
        F: Fn(Real) -> Result<Real>,
    {
        if a == b {
            return Ok(0.0);
        }
        if b < a {
            return Ok(-self.integrate(f, b, a)?);
        }
        let dx = (b - a) / self.intervals as Real;
        let mut sum = 0.5 * (f(a)? + f(b)?);
        for i in 1..self.intervals {
            sum += f(a + i as Real * dx)?;
        }
        Ok(sum * dx)
    }
}
