//! Run configuration, read from TOML.
//!
//! Every field is optional; an empty file reproduces the reference run:
//! valuation 2016-02-10, settlement 2016-02-17, a flat 6.215% curve and
//! the 5×5 reference grid.
//!
//! Dates are quoted `YYYY-MM-DD` strings.
//!
//! ```toml
//! evaluation_date = "2016-02-10"
//! flat_rate = 0.06215
//! fixed_day_counter = "30-360"
//! hw_engine = "finite-difference"
//!
//! [grid]
//! maturities = [1, 2]
//! tenors = [1, 2]
//! vols = [[0.164, 0.155], [0.160, 0.150]]
//!
//! [end_criteria]
//! max_iterations = 200
//! ```

use crate::grid::MarketGrid;
use crate::report::ImpliedVolPolicy;
use ratecal_core::{
    errors::{Error, Result},
    Rate, Real, Size, Volatility,
};
use ratecal_math::EndCriteria;
use ratecal_models::{CalibrationErrorType, ImpliedVolSettings};
use chrono::NaiveDate;
use ratecal_pricingengines::FdGridSettings;
use ratecal_time::{
    Actual360, Actual365Fixed, Date, DayCounter, EvaluationContext, Period, Thirty360,
};
use serde::Deserialize;
use std::path::Path;

/// Engine used for the Hull-White round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HwEngineKind {
    /// Jamshidian decomposition.
    #[default]
    Jamshidian,
    /// Crank–Nicolson on a state grid.
    FiniteDifference,
}

/// Day counter of the helpers' fixed leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum FixedDayCounter {
    /// Actual/360, as on the floating leg.
    #[default]
    #[serde(rename = "actual-360")]
    Actual360,
    /// Actual/365 Fixed.
    #[serde(rename = "actual-365-fixed")]
    Actual365Fixed,
    /// 30/360 bond basis.
    #[serde(rename = "30-360")]
    Thirty360,
}

impl FixedDayCounter {
    /// The day counter itself.
    pub fn day_counter(self) -> &'static dyn DayCounter {
        match self {
            FixedDayCounter::Actual360 => &Actual360,
            FixedDayCounter::Actual365Fixed => &Actual365Fixed,
            FixedDayCounter::Thirty360 => &Thirty360,
        }
    }
}

/// Everything a calibration run needs.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CalibrationConfig {
    /// Valuation date.
    pub evaluation_date: NaiveDate,
    /// Settlement date; the curve is anchored here.
    pub settlement_date: NaiveDate,
    /// Continuously-compounded flat rate (Actual/365F).
    pub flat_rate: Rate,
    /// Fixed-leg day counter of the helpers.
    pub fixed_day_counter: FixedDayCounter,
    /// Market grid.
    pub grid: GridConfig,
    /// Optimizer stopping rules.
    pub end_criteria: EndCriteriaConfig,
    /// Implied-volatility search used by the report.
    pub implied_vol: ImpliedVolSettings,
    /// Residual definition.
    pub error_type: CalibrationErrorType,
    /// What the report does when an implied volatility cannot be found.
    pub implied_vol_policy: ImpliedVolPolicy,
    /// Hull-White engine.
    pub hw_engine: HwEngineKind,
    /// G2++ integration settings.
    pub g2: G2EngineConfig,
    /// Hull-White finite-difference grid.
    pub fd: FdConfig,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            evaluation_date: NaiveDate::from_ymd_opt(2016, 2, 10).unwrap_or_default(),
            settlement_date: NaiveDate::from_ymd_opt(2016, 2, 17).unwrap_or_default(),
            flat_rate: 0.06215,
            fixed_day_counter: FixedDayCounter::default(),
            grid: GridConfig::default(),
            end_criteria: EndCriteriaConfig::default(),
            implied_vol: ImpliedVolSettings::default(),
            error_type: CalibrationErrorType::default(),
            implied_vol_policy: ImpliedVolPolicy::default(),
            hw_engine: HwEngineKind::default(),
            g2: G2EngineConfig::default(),
            fd: FdConfig::default(),
        }
    }
}

impl CalibrationConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// The evaluation context of the run.
    pub fn context(&self) -> Result<EvaluationContext> {
        EvaluationContext::new(
            Date::from_naive(self.evaluation_date),
            Date::from_naive(self.settlement_date),
        )
        .map_err(|e| Error::Config(e.to_string()))
    }

    /// The market grid; shape problems are [`Error::DataShape`].
    pub fn market_grid(&self) -> Result<MarketGrid> {
        self.grid.build()
    }

    /// Optimizer end criteria.
    pub fn end_criteria(&self) -> Result<EndCriteria> {
        let c = &self.end_criteria;
        let criteria = EndCriteria::new(
            c.max_iterations,
            c.max_stationary_state_iterations,
            c.root_epsilon,
            c.function_epsilon,
            c.gradient_norm_epsilon,
        )
        .with_step_epsilon(c.step_epsilon);
        criteria.validate().map_err(|e| Error::Config(e.to_string()))?;
        Ok(criteria)
    }
}

/// Grid axes in whole years and the row-major volatility matrix.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Option maturities in years.
    pub maturities: Vec<i32>,
    /// Swap tenors in years.
    pub tenors: Vec<i32>,
    /// One row of volatilities per maturity.
    pub vols: Vec<Vec<Volatility>>,
}

impl Default for GridConfig {
    fn default() -> Self {
        let g = MarketGrid::reference();
        Self {
            maturities: (1..=5).collect(),
            tenors: (1..=5).collect(),
            vols: g.vols().chunks(g.cols()).map(<[Volatility]>::to_vec).collect(),
        }
    }
}

impl GridConfig {
    fn build(&self) -> Result<MarketGrid> {
        for &n in self.maturities.iter().chain(&self.tenors) {
            if n <= 0 {
                return Err(Error::DataShape(format!("grid periods must be positive, got {n}Y")));
            }
        }
        MarketGrid::new(
            self.maturities.iter().copied().map(Period::years).collect(),
            self.tenors.iter().copied().map(Period::years).collect(),
            self.vols.clone(),
        )
    }
}

/// Mirror of [`EndCriteria`] with serde defaults.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EndCriteriaConfig {
    /// Maximum iterations.
    pub max_iterations: Size,
    /// Maximum iterations without progress.
    pub max_stationary_state_iterations: Size,
    /// Cost tolerance.
    pub root_epsilon: Real,
    /// Cost-change tolerance.
    pub function_epsilon: Real,
    /// Gradient tolerance.
    pub gradient_norm_epsilon: Real,
    /// Step tolerance.
    pub step_epsilon: Real,
}

impl Default for EndCriteriaConfig {
    fn default() -> Self {
        let d = EndCriteria::default();
        Self {
            max_iterations: d.max_iterations,
            max_stationary_state_iterations: d.max_stationary_state_iterations,
            root_epsilon: d.root_epsilon,
            function_epsilon: d.function_epsilon,
            gradient_norm_epsilon: d.gradient_norm_epsilon,
            step_epsilon: d.step_epsilon,
        }
    }
}

/// G2++ engine integration settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct G2EngineConfig {
    /// Half width of the integration domain in standard deviations.
    pub range: Real,
    /// Trapezoid segments.
    pub intervals: Size,
}

impl Default for G2EngineConfig {
    fn default() -> Self {
        Self {
            range: 6.0,
            intervals: 16,
        }
    }
}

/// Hull-White finite-difference grid.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FdConfig {
    /// Time steps.
    pub time_steps: Size,
    /// State grid points.
    pub state_points: Size,
    /// Grid half width in standard deviations.
    pub range: Real,
}

impl Default for FdConfig {
    fn default() -> Self {
        let d = FdGridSettings::default();
        Self {
            time_steps: d.time_steps,
            state_points: d.state_points,
            range: d.range,
        }
    }
}

impl From<FdConfig> for FdGridSettings {
    fn from(c: FdConfig) -> Self {
        Self {
            time_steps: c.time_steps,
            state_points: c.state_points,
            range: c.range,
        }
    }
}
