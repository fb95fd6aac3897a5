//! Finite difference methods for one-dimensional pricing PDEs.
//!
//! # Overview
//!
//! * [`TridiagonalOperator`]: tridiagonal matrix with Thomas-algorithm solver
//! * [`UniformGrid`]: equally spaced state grid
//! * [`Pde1d`]: coefficients of `∂V/∂t + μ·V_x + ½v·V_xx − r·V = 0`
//! * [`Fdm1dSolver`]: θ-scheme rollback of values from one time to an
//!   earlier one, with optional implicit damping steps

use ratecal_core::{
    ensure,
    errors::{Error, Result},
    Real, Size, Time,
};

// ─── FDM scheme selection ─────────────────────────────────────────────────────

/// Finite difference time-stepping scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdmScheme {
    /// Fully implicit: `(I − Δt·L)·V^{n} = V^{n+1}`. First order, L-stable.
    Implicit,
    /// Crank–Nicolson: θ = ½, second order in time.
    CrankNicolson,
}

impl FdmScheme {
    /// Weight of the implicit part.
    pub fn theta(self) -> Real {
        match self {
            FdmScheme::Implicit => 1.0,
            FdmScheme::CrankNicolson => 0.5,
        }
    }
}

// ─── Tridiagonal operator ─────────────────────────────────────────────────────

/// A tridiagonal matrix operator.
///
/// Stores the lower, diagonal, and upper bands. `lower[0]` and
/// `upper[n − 1]` are unused.
#[derive(Debug, Clone, PartialEq)]
pub struct TridiagonalOperator {
    /// Lower diagonal (index 0 unused, starts from row 1).
    pub lower: Vec<Real>,
    /// Main diagonal.
    pub diag: Vec<Real>,
    /// Upper diagonal (last index unused, ends at row n−2).
    pub upper: Vec<Real>,
}

impl TridiagonalOperator {
    /// Create a zero tridiagonal operator of size `n`.
    pub fn new(n: Size) -> Self {
        Self {
            lower: vec![0.0; n],
            diag: vec![0.0; n],
            upper: vec![0.0; n],
        }
    }

    /// The identity of size `n`.
    pub fn identity(n: Size) -> Self {
        let mut op = Self::new(n);
        op.add_identity(1.0);
        op
    }

    /// Size (number of rows/columns).
    pub fn size(&self) -> Size {
        self.diag.len()
    }

    /// Apply the operator: `y = A · x`.
    pub fn apply(&self, x: &[Real]) -> Result<Vec<Real>> {
        let n = self.size();
        self.check_len(x.len())?;
        if n == 1 {
            return Ok(vec![self.diag[0] * x[0]]);
        }
        let mut y = vec![0.0; n];
        y[0] = self.diag[0] * x[0] + self.upper[0] * x[1];
        for i in 1..n - 1 {
            y[i] = self.lower[i] * x[i - 1] + self.diag[i] * x[i] + self.upper[i] * x[i + 1];
        }
        y[n - 1] = self.lower[n - 1] * x[n - 2] + self.diag[n - 1] * x[n - 1];
        Ok(y)
    }

    /// Solve `A · x = rhs` by the Thomas algorithm.
    ///
    /// Fails on a vanishing pivot; the systems built by [`Fdm1dSolver`]
    /// are diagonally dominant and never hit one.
    pub fn solve(&self, rhs: &[Real]) -> Result<Vec<Real>> {
        let n = self.size();
        self.check_len(rhs.len())?;

        let mut c_prime = vec![0.0; n];
        let mut d_prime = vec![0.0; n];

        let mut pivot = self.diag[0];
        for i in 0..n {
            if i > 0 {
                pivot = self.diag[i] - self.lower[i] * c_prime[i - 1];
            }
            if pivot.abs() < Real::MIN_POSITIVE {
                return Err(Error::Runtime(format!(
                    "tridiagonal system singular at row {i}"
                )));
            }
            if i < n - 1 {
                c_prime[i] = self.upper[i] / pivot;
            }
            let carry = if i > 0 { self.lower[i] * d_prime[i - 1] } else { 0.0 };
            d_prime[i] = (rhs[i] - carry) / pivot;
        }

        let mut x = d_prime;
        for i in (0..n - 1).rev() {
            x[i] -= c_prime[i] * x[i + 1];
        }
        Ok(x)
    }

    /// Scale all entries by a scalar.
    pub fn scale(&mut self, factor: Real) {
        for band in [&mut self.lower, &mut self.diag, &mut self.upper] {
            for v in band.iter_mut() {
                *v *= factor;
            }
        }
    }

    /// Add the identity matrix scaled by `factor`: `A ← A + factor · I`.
    pub fn add_identity(&mut self, factor: Real) {
        for d in &mut self.diag {
            *d += factor;
        }
    }

    fn check_len(&self, len: Size) -> Result<()> {
        if len != self.size() {
            return Err(Error::IndexOutOfRange {
                index: len,
                size: self.size(),
            });
        }
        Ok(())
    }
}

// ─── Grid ─────────────────────────────────────────────────────────────────────

/// An equally spaced grid `x_min, x_min + dx, …, x_max`.
#[derive(Debug, Clone, PartialEq)]
pub struct UniformGrid {
    x_min: Real,
    dx: Real,
    points: Size,
}

impl UniformGrid {
    /// A grid of `points` nodes centred on `center` spanning
    /// `±half_width`.
    pub fn centered(center: Real, half_width: Real, points: Size) -> Result<Self> {
        ensure!(points >= 3, "a grid needs at least 3 points, got {points}");
        ensure!(
            half_width > 0.0 && half_width.is_finite(),
            "grid half width must be positive, got {half_width}"
        );
        Ok(Self {
            x_min: center - half_width,
            dx: 2.0 * half_width / (points - 1) as Real,
            points,
        })
    }

    /// Number of nodes.
    pub fn size(&self) -> Size {
        self.points
    }

    /// Spacing.
    pub fn dx(&self) -> Real {
        self.dx
    }

    /// Node `i`.
    pub fn x(&self, i: Size) -> Real {
        self.x_min + i as Real * self.dx
    }

    /// All nodes.
    pub fn nodes(&self) -> impl Iterator<Item = Real> + '_ {
        (0..self.points).map(|i| self.x(i))
    }

    /// Linear interpolation of grid `values` at `x`, which must lie inside
    /// the grid.
    pub fn interpolate(&self, values: &[Real], x: Real) -> Result<Real> {
        ensure!(
            values.len() == self.points,
            "{} values on a {}-point grid",
            values.len(),
            self.points
        );
        let s = (x - self.x_min) / self.dx;
        ensure!(
            s >= 0.0 && s <= (self.points - 1) as Real,
            "{x} lies outside the grid"
        );
        let idx = (s.floor() as Size).min(self.points - 2);
        let frac = s - idx as Real;
        Ok(values[idx] * (1.0 - frac) + values[idx + 1] * frac)
    }
}

// ─── PDE description ──────────────────────────────────────────────────────────

/// Local coefficients of `∂V/∂t + μ·V_x + ½v·V_xx − r·V = 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdeCoefficients {
    /// Drift `μ`.
    pub drift: Real,
    /// Variance rate `v`.
    pub variance: Real,
    /// Discount rate `r`.
    pub discount_rate: Real,
}

/// A one-dimensional backward pricing PDE.
pub trait Pde1d {
    /// Coefficients at time `t`, state `x`.
    fn coefficients(&self, t: Time, x: Real) -> Result<PdeCoefficients>;
}

// ─── Solver ───────────────────────────────────────────────────────────────────

/// θ-scheme rollback on a uniform grid.
///
/// Interior rows use central differences. Boundary rows drop the
/// diffusion term and difference the drift one-sidedly towards the
/// interior.
#[derive(Debug, Clone)]
pub struct Fdm1dSolver {
    grid: UniformGrid,
    time_steps: Size,
    scheme: FdmScheme,
    damping_steps: Size,
}

impl Fdm1dSolver {
    /// A solver taking `time_steps` steps per rollback.
    pub fn new(grid: UniformGrid, time_steps: Size, scheme: FdmScheme) -> Result<Self> {
        ensure!(time_steps > 0, "at least one time step required");
        Ok(Self {
            grid,
            time_steps,
            scheme,
            damping_steps: 0,
        })
    }

    /// Replace the first `n` steps with fully implicit ones, which smooths
    /// kinked payoffs before Crank–Nicolson takes over.
    pub fn with_damping_steps(mut self, n: Size) -> Self {
        self.damping_steps = n;
        self
    }

    /// The state grid.
    pub fn grid(&self) -> &UniformGrid {
        &self.grid
    }

    /// Roll `values` (given at time `from`) back to time `to ≤ from`.
    pub fn rollback(&self, pde: &dyn Pde1d, values: &mut Vec<Real>, from: Time, to: Time) -> Result<()> {
        ensure!(to <= from, "cannot roll back from {from} to {to}");
        ensure!(
            values.len() == self.grid.size(),
            "{} values on a {}-point grid",
            values.len(),
            self.grid.size()
        );
        if to == from {
            return Ok(());
        }
        let dt = (from - to) / self.time_steps as Real;
        for step in 0..self.time_steps {
            let t_hi = from - step as Real * dt;
            let theta = if step < self.damping_steps {
                1.0
            } else {
                self.scheme.theta()
            };
            let op = self.operator(pde, t_hi - 0.5 * dt)?;

            let rhs = if theta < 1.0 {
                let mut explicit = op.clone();
                explicit.scale((1.0 - theta) * dt);
                explicit.add_identity(1.0);
                explicit.apply(values)?
            } else {
                values.clone()
            };
            let mut implicit = op;
            implicit.scale(-theta * dt);
            implicit.add_identity(1.0);
            *values = implicit.solve(&rhs)?;
        }
        Ok(())
    }

    /// The spatial operator `L` at time `t`.
    fn operator(&self, pde: &dyn Pde1d, t: Time) -> Result<TridiagonalOperator> {
        let n = self.grid.size();
        let dx = self.grid.dx();
        let mut op = TridiagonalOperator::new(n);
        for i in 0..n {
            let c = pde.coefficients(t, self.grid.x(i))?;
            if i == 0 {
                op.diag[0] = -c.drift.abs() / dx - c.discount_rate;
                op.upper[0] = c.drift.abs() / dx;
                if c.drift < 0.0 {
                    // Outflow at the lower edge: no upwind neighbour.
                    op.diag[0] = -c.discount_rate;
                    op.upper[0] = 0.0;
                }
            } else if i == n - 1 {
                op.diag[i] = -c.drift.abs() / dx - c.discount_rate;
                op.lower[i] = c.drift.abs() / dx;
                if c.drift > 0.0 {
                    op.diag[i] = -c.discount_rate;
                    op.lower[i] = 0.0;
                }
            } else {
                let diffusion = 0.5 * c.variance / (dx * dx);
                let convection = 0.5 * c.drift / dx;
                op.lower[i] = diffusion - convection;
                op.diag[i] = -2.0 * diffusion - c.discount_rate;
                op.upper[i] = diffusion + convection;
            }
        }
        Ok(op)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ratecal_math::{black_formula, OptionType};

    #[test]
    fn thomas_algorithm_solves_identity() {
        let op = TridiagonalOperator::identity(4);
        let rhs = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(op.solve(&rhs).unwrap(), rhs);
    }

    #[test]
    fn thomas_algorithm_solves_tridiagonal() {
        // A = [[2, -1, 0], [-1, 2, -1], [0, -1, 2]], x = [1, 2, 3], Ax = [0, 0, 4]
        let mut op = TridiagonalOperator::new(3);
        op.diag = vec![2.0, 2.0, 2.0];
        op.lower = vec![0.0, -1.0, -1.0];
        op.upper = vec![-1.0, -1.0, 0.0];
        let x = op.solve(&[0.0, 0.0, 4.0]).unwrap();
        for (got, want) in x.iter().zip([1.0, 2.0, 3.0]) {
            assert_abs_diff_eq!(*got, want, epsilon = 1e-12);
        }
        assert_eq!(op.apply(&x).unwrap().len(), 3);
    }

    #[test]
    fn singular_and_mismatched_systems() {
        let op = TridiagonalOperator::new(3);
        assert!(op.solve(&[1.0, 1.0, 1.0]).is_err());
        assert!(matches!(
            TridiagonalOperator::identity(3).solve(&[1.0]),
            Err(Error::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn grid_interpolation() {
        let g = UniformGrid::centered(0.0, 1.0, 5).unwrap();
        assert_abs_diff_eq!(g.dx(), 0.5);
        let values: Vec<Real> = g.nodes().map(|x| 2.0 * x + 1.0).collect();
        assert_abs_diff_eq!(g.interpolate(&values, 0.3).unwrap(), 1.6, epsilon = 1e-14);
        assert_abs_diff_eq!(g.interpolate(&values, 1.0).unwrap(), 3.0, epsilon = 1e-14);
        assert!(g.interpolate(&values, 1.5).is_err());
        assert!(UniformGrid::centered(0.0, 1.0, 2).is_err());
    }

    struct Discounting(Real);

    impl Pde1d for Discounting {
        fn coefficients(&self, _t: Time, _x: Real) -> Result<PdeCoefficients> {
            Ok(PdeCoefficients {
                drift: 0.0,
                variance: 0.0,
                discount_rate: self.0,
            })
        }
    }

    #[test]
    fn pure_discounting() {
        let grid = UniformGrid::centered(0.0, 1.0, 11).unwrap();
        let solver = Fdm1dSolver::new(grid, 200, FdmScheme::CrankNicolson).unwrap();
        let mut values = vec![1.0; 11];
        solver.rollback(&Discounting(0.05), &mut values, 2.0, 0.0).unwrap();
        for v in values {
            assert_abs_diff_eq!(v, (-0.1_f64).exp(), epsilon = 1e-6);
        }
    }

    /// Black–Scholes in log-spot.
    struct LogBlackScholes {
        r: Real,
        sigma: Real,
    }

    impl Pde1d for LogBlackScholes {
        fn coefficients(&self, _t: Time, _x: Real) -> Result<PdeCoefficients> {
            Ok(PdeCoefficients {
                drift: self.r - 0.5 * self.sigma * self.sigma,
                variance: self.sigma * self.sigma,
                discount_rate: self.r,
            })
        }
    }

    #[test]
    fn crank_nicolson_call_matches_black() {
        let (spot, strike, r, sigma, t): (Real, Real, Real, Real, Real) = (100.0, 100.0, 0.05, 0.2, 1.0);
        let grid = UniformGrid::centered(spot.ln(), 6.0 * sigma * t.sqrt(), 401).unwrap();
        let solver = Fdm1dSolver::new(grid.clone(), 200, FdmScheme::CrankNicolson)
            .unwrap()
            .with_damping_steps(2);
        let mut values: Vec<Real> = grid.nodes().map(|x| (x.exp() - strike).max(0.0)).collect();
        solver
            .rollback(&LogBlackScholes { r, sigma }, &mut values, t, 0.0)
            .unwrap();
        let fd = grid.interpolate(&values, spot.ln()).unwrap();

        let df = (-r * t).exp();
        let exact =
            black_formula(OptionType::Call, strike, spot / df, sigma * t.sqrt(), df).unwrap();
        assert!((fd - exact).abs() < 0.02, "fd = {fd:.5}, exact = {exact:.5}");
    }

    #[test]
    fn implicit_scheme_is_close_too() {
        let (spot, strike, r, sigma, t): (Real, Real, Real, Real, Real) = (100.0, 100.0, 0.05, 0.2, 1.0);
        let grid = UniformGrid::centered(spot.ln(), 6.0 * sigma * t.sqrt(), 401).unwrap();
        let solver = Fdm1dSolver::new(grid.clone(), 400, FdmScheme::Implicit).unwrap();
        let mut values: Vec<Real> = grid.nodes().map(|x| (strike - x.exp()).max(0.0)).collect();
        solver
            .rollback(&LogBlackScholes { r, sigma }, &mut values, t, 0.0)
            .unwrap();
        let fd = grid.interpolate(&values, spot.ln()).unwrap();

        let df = (-r * t).exp();
        let exact =
            black_formula(OptionType::Put, strike, spot / df, sigma * t.sqrt(), df).unwrap();
        assert!((fd - exact).abs() < 0.05, "fd = {fd:.5}, exact = {exact:.5}");
    }

    #[test]
    fn rollback_argument_checks() {
        let grid = UniformGrid::centered(0.0, 1.0, 5).unwrap();
        let solver = Fdm1dSolver::new(grid, 10, FdmScheme::Implicit).unwrap();
        let mut values = vec![0.0; 4];
        assert!(solver.rollback(&Discounting(0.0), &mut values, 1.0, 0.0).is_err());
        let mut values = vec![0.0; 5];
        assert!(solver.rollback(&Discounting(0.0), &mut values, 0.0, 1.0).is_err());
        assert!(Fdm1dSolver::new(UniformGrid::centered(0.0, 1.0, 5).unwrap(), 0, FdmScheme::Implicit).is_err());
    }
}
