//! The market grid: ATM swaption volatilities by option maturity (rows)
//! and swap tenor (columns), stored row-major.

use ratecal_core::{
    errors::{Error, Result},
    Size, Volatility,
};
use ratecal_time::Period;

/// One quoted cell of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarketGridPoint {
    /// Option maturity.
    pub option_maturity: Period,
    /// Underlying swap tenor.
    pub swap_tenor: Period,
    /// Quoted lognormal volatility.
    pub quoted_vol: Volatility,
}

/// Swaption volatility grid.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketGrid {
    maturities: Vec<Period>,
    tenors: Vec<Period>,
    vols: Vec<Volatility>,
}

impl MarketGrid {
    /// Build a grid from its axes and one row of volatilities per
    /// maturity.
    pub fn new(maturities: Vec<Period>, tenors: Vec<Period>, rows: Vec<Vec<Volatility>>) -> Result<Self> {
        if maturities.is_empty() || tenors.is_empty() {
            return Err(Error::DataShape(format!(
                "empty grid: {} maturities, {} tenors",
                maturities.len(),
                tenors.len()
            )));
        }
        if rows.len() != maturities.len() {
            return Err(Error::DataShape(format!(
                "{} volatility rows for {} maturities",
                rows.len(),
                maturities.len()
            )));
        }
        let mut vols = Vec::with_capacity(maturities.len() * tenors.len());
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != tenors.len() {
                return Err(Error::DataShape(format!(
                    "row {i} has {} volatilities for {} tenors",
                    row.len(),
                    tenors.len()
                )));
            }
            if let Some(v) = row.iter().find(|v| !(**v > 0.0 && v.is_finite())) {
                return Err(Error::DataShape(format!(
                    "row {i} holds a non-positive volatility {v}"
                )));
            }
            vols.extend(row);
        }
        Ok(Self {
            maturities,
            tenors,
            vols,
        })
    }

    /// The 5×5 reference grid: maturities and tenors 1Y..5Y.
    pub fn reference() -> Self {
        let years: Vec<Period> = (1..=5).map(Period::years).collect();
        Self {
            maturities: years.clone(),
            tenors: years,
            vols: REFERENCE_VOLS.to_vec(),
        }
    }

    /// Option maturities, one per row.
    pub fn maturities(&self) -> &[Period] {
        &self.maturities
    }

    /// Swap tenors, one per column.
    pub fn tenors(&self) -> &[Period] {
        &self.tenors
    }

    /// Number of rows.
    pub fn rows(&self) -> Size {
        self.maturities.len()
    }

    /// Number of columns.
    pub fn cols(&self) -> Size {
        self.tenors.len()
    }

    /// Number of cells.
    pub fn len(&self) -> Size {
        self.vols.len()
    }

    /// Always `false`: construction rejects empty grids.
    pub fn is_empty(&self) -> bool {
        self.vols.is_empty()
    }

    /// Volatilities in row-major order.
    pub fn vols(&self) -> &[Volatility] {
        &self.vols
    }

    /// Volatility at row `i`, column `j`.
    pub fn vol(&self, i: Size, j: Size) -> Result<Volatility> {
        if i >= self.rows() || j >= self.cols() {
            return Err(Error::DataShape(format!(
                "cell ({i}, {j}) outside a {}x{} grid",
                self.rows(),
                self.cols()
            )));
        }
        Ok(self.vols[i * self.cols() + j])
    }

    /// Cell `k` in row-major order.
    pub fn point(&self, k: Size) -> Result<MarketGridPoint> {
        let (i, j) = (k / self.cols(), k % self.cols());
        Ok(MarketGridPoint {
            quoted_vol: self.vol(i, j)?,
            option_maturity: self.maturities[i],
            swap_tenor: self.tenors[j],
        })
    }

    /// All cells in row-major order.
    pub fn points(&self) -> impl Iterator<Item = MarketGridPoint> + '_ {
        self.maturities.iter().enumerate().flat_map(move |(i, &m)| {
            self.tenors.iter().enumerate().map(move |(j, &t)| MarketGridPoint {
                option_maturity: m,
                swap_tenor: t,
                quoted_vol: self.vols[i * self.cols() + j],
            })
        })
    }

    /// Check that an ensemble of `n` instruments covers the grid.
    pub fn check_ensemble_size(&self, n: Size) -> Result<()> {
        if n != self.len() {
            return Err(Error::DataShape(format!(
                "{n} instruments for a {}x{} grid",
                self.rows(),
                self.cols()
            )));
        }
        Ok(())
    }
}

#[rustfmt::skip]
const REFERENCE_VOLS: [Volatility; 25] = [
    0.1640, 0.1550, 0.1430, 0.1310, 0.1240,
    0.1600, 0.1500, 0.1390, 0.1290, 0.1220,
    0.1570, 0.1450, 0.1340, 0.1240, 0.1190,
    0.1480, 0.1360, 0.1260, 0.1190, 0.1140,
    0.1400, 0.1280, 0.1210, 0.1140, 0.1100,
];

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn reference_grid() {
        let g = MarketGrid::reference();
        assert_eq!((g.rows(), g.cols(), g.len()), (5, 5, 25));
        assert_eq!(g.vol(0, 0).unwrap(), 0.1640);
        assert_eq!(g.vol(4, 4).unwrap(), 0.1100);
        assert_eq!(g.vol(1, 2).unwrap(), 0.1390);
        let p = g.point(7).unwrap();
        assert_eq!(p.option_maturity, Period::years(2));
        assert_eq!(p.swap_tenor, Period::years(3));
        assert_eq!(p.quoted_vol, 0.1390);
    }

    #[test]
    fn shape_errors() {
        let y = |n| Period::years(n);
        assert!(matches!(
            MarketGrid::new(vec![], vec![y(1)], vec![]),
            Err(Error::DataShape(_))
        ));
        assert!(matches!(
            MarketGrid::new(vec![y(1), y(2)], vec![y(1)], vec![vec![0.1]]),
            Err(Error::DataShape(_))
        ));
        assert!(matches!(
            MarketGrid::new(vec![y(1)], vec![y(1), y(2)], vec![vec![0.1]]),
            Err(Error::DataShape(_))
        ));
        assert!(matches!(
            MarketGrid::new(vec![y(1)], vec![y(1)], vec![vec![-0.1]]),
            Err(Error::DataShape(_))
        ));
        let g = MarketGrid::reference();
        assert!(matches!(g.vol(5, 0), Err(Error::DataShape(_))));
        assert!(matches!(g.point(25), Err(Error::DataShape(_))));
        assert!(g.check_ensemble_size(24).is_err());
        assert!(g.check_ensemble_size(25).is_ok());
    }

    proptest! {
        #[test]
        fn points_are_row_major(rows in 1usize..6, cols in 1usize..6, seed in 0.01f64..0.5) {
            let maturities: Vec<Period> = (1..=rows as i32).map(Period::years).collect();
            let tenors: Vec<Period> = (1..=cols as i32).map(Period::years).collect();
            let data: Vec<Vec<Volatility>> = (0..rows)
                .map(|i| (0..cols).map(|j| seed + (i * cols + j) as f64 * 1e-3).collect())
                .collect();
            let g = MarketGrid::new(maturities, tenors, data.clone()).unwrap();
            for (k, p) in g.points().enumerate() {
                prop_assert_eq!(p.quoted_vol, data[k / cols][k % cols]);
                prop_assert_eq!(g.point(k).unwrap(), p);
            }
        }
    }
}
