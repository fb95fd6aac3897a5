//! A calibration session: the curve, the helper ensemble built from the
//! grid, and the rounds that fit each model to it.
//!
//! Helpers are built once, in row-major grid order, and shared by every
//! round; each round re-slates them for its model family and binds a
//! fresh engine before calibrating.

use crate::config::{CalibrationConfig, HwEngineKind};
use crate::grid::MarketGrid;
use crate::report::ModelReport;
use ratecal_core::utilities::data_formatters::format_rate;
use ratecal_core::{errors::Result, Compounding, Handle};
use ratecal_instruments::{IborConvention, SwaptionEngine, SwaptionHelper};
use ratecal_math::LevenbergMarquardt;
use ratecal_models::{CalibratedModel, CalibrationHelper, G2Model, HullWhite, ModelFamily};
use ratecal_pricingengines::{
    FdHullWhiteSwaptionEngine, G2SwaptionEngine, JamshidianSwaptionEngine,
};
use ratecal_quotes::SimpleQuote;
use ratecal_termstructures::{FlatForward, YieldTermStructure};
use ratecal_time::{Actual365Fixed, EvaluationContext};
use std::sync::Arc;
use tracing::{info, info_span};

/// The models a run can calibrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelChoice {
    /// G2++ with the analytic engine.
    G2,
    /// Hull-White with the configured engine.
    HullWhite,
}

/// Market objects and helpers shared by the rounds of one run.
#[derive(Debug)]
pub struct CalibrationSession {
    config: CalibrationConfig,
    context: EvaluationContext,
    grid: MarketGrid,
    rate: Handle<SimpleQuote>,
    curve: Handle<dyn YieldTermStructure>,
    helpers: Vec<Arc<SwaptionHelper>>,
}

impl CalibrationSession {
    /// Build the curve and one helper per grid cell.
    pub fn new(config: CalibrationConfig) -> Result<Self> {
        let context = config.context()?;
        let grid = config.market_grid()?;
        config.end_criteria()?;

        let rate = Handle::new(SimpleQuote::new(config.flat_rate));
        let curve = Handle::from_arc(Arc::new(FlatForward::new(
            context.settlement_date(),
            rate.clone(),
            Actual365Fixed,
            Compounding::Continuous,
        )) as Arc<dyn YieldTermStructure>);
        let index = IborConvention::euribor_6m().with_calendar(context.calendar().clone());

        let helpers = grid
            .points()
            .map(|p| {
                SwaptionHelper::new(
                    p.option_maturity,
                    p.swap_tenor,
                    Handle::new(SimpleQuote::new(p.quoted_vol)),
                    &index,
                    index.tenor(),
                    config.fixed_day_counter.day_counter(),
                    &curve,
                    ModelFamily::G2,
                    config.error_type,
                )
                .map(Arc::new)
            })
            .collect::<Result<Vec<_>>>()?;
        grid.check_ensemble_size(helpers.len())?;
        info!(
            evaluation = %context.evaluation_date(),
            settlement = %context.settlement_date(),
            rate = %format_rate(config.flat_rate),
            helpers = helpers.len(),
            "calibration session ready"
        );

        Ok(Self {
            config,
            context,
            grid,
            rate,
            curve,
            helpers,
        })
    }

    /// The run configuration.
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Valuation and settlement dates.
    pub fn context(&self) -> &EvaluationContext {
        &self.context
    }

    /// The market grid.
    pub fn grid(&self) -> &MarketGrid {
        &self.grid
    }

    /// The flat-rate quote driving the curve.
    pub fn rate(&self) -> &Handle<SimpleQuote> {
        &self.rate
    }

    /// The discount curve.
    pub fn curve(&self) -> &Handle<dyn YieldTermStructure> {
        &self.curve
    }

    /// Helpers in row-major grid order.
    pub fn helpers(&self) -> &[Arc<SwaptionHelper>] {
        &self.helpers
    }

    fn dyn_helpers(&self) -> Vec<Arc<dyn CalibrationHelper>> {
        self.helpers
            .iter()
            .map(|h| h.clone() as Arc<dyn CalibrationHelper>)
            .collect()
    }

    /// Slate every helper for `family` and bind `engine`.
    pub fn bind(&self, family: ModelFamily, engine: Arc<dyn SwaptionEngine>) -> Result<()> {
        for h in &self.helpers {
            h.slate_for(family);
            h.attach_engine(engine.clone())?;
        }
        Ok(())
    }

    /// Calibrate `model` to the currently bound helpers and report.
    pub fn calibrate_and_report(
        &self,
        title: &str,
        model: &dyn CalibratedModel,
    ) -> Result<ModelReport> {
        let helpers = self.dyn_helpers();
        let outcome = model.calibrate(
            &helpers,
            &LevenbergMarquardt::default(),
            &self.config.end_criteria()?,
        )?;
        ModelReport::build(
            title,
            model,
            &helpers,
            outcome,
            &self.config.implied_vol,
            self.config.implied_vol_policy,
        )
    }

    /// The G2++ round.
    pub fn calibrate_g2(&self) -> Result<(Arc<G2Model>, ModelReport)> {
        let _span = info_span!("round", model = %ModelFamily::G2).entered();
        let model = Arc::new(G2Model::new(self.curve.clone())?);
        let g2 = &self.config.g2;
        let engine = G2SwaptionEngine::new(model.clone(), g2.range, g2.intervals)?;
        self.bind(ModelFamily::G2, Arc::new(engine))?;
        let report = self.calibrate_and_report("G2 (analytic formulae) calibration", &*model)?;
        Ok((model, report))
    }

    /// The Hull-White round with the given engine.
    pub fn calibrate_hull_white(&self, kind: HwEngineKind) -> Result<(Arc<HullWhite>, ModelReport)> {
        let _span = info_span!("round", model = %ModelFamily::HullWhite, engine = ?kind).entered();
        let model = Arc::new(HullWhite::new(self.curve.clone())?);
        let (engine, title): (Arc<dyn SwaptionEngine>, &str) = match kind {
            HwEngineKind::Jamshidian => (
                Arc::new(JamshidianSwaptionEngine::new(model.clone())),
                "Hull-White (analytic formulae) calibration",
            ),
            HwEngineKind::FiniteDifference => (
                Arc::new(FdHullWhiteSwaptionEngine::new(model.clone(), self.config.fd.into())?),
                "Hull-White (numerical) calibration",
            ),
        };
        self.bind(ModelFamily::HullWhite, engine)?;
        let report = self.calibrate_and_report(title, &*model)?;
        Ok((model, report))
    }

    /// Run the requested rounds in order.
    pub fn run(&self, choices: &[ModelChoice]) -> Result<Vec<ModelReport>> {
        choices
            .iter()
            .map(|choice| match choice {
                ModelChoice::G2 => self.calibrate_g2().map(|(_, r)| r),
                ModelChoice::HullWhite => self
                    .calibrate_hull_white(self.config.hw_engine)
                    .map(|(_, r)| r),
            })
            .collect()
    }
}
