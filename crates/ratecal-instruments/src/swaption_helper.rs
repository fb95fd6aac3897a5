//! `SwaptionHelper`: one quoted swaption volatility as a calibration
//! instrument.
//!
//! The helper observes its volatility quote and caches the Black market
//! value until the quote moves. It is slated for one model family at a
//! time and refuses engines of any other family; re-slating it for a new
//! family drops the current engine.

use crate::ibor_convention::IborConvention;
use crate::pricing_engine::SwaptionEngine;
use crate::swaption::SwaptionArguments;
use ratecal_core::{
    errors::{Error, Result},
    patterns::observable::{Observable, Observer},
    Handle, Real, Volatility,
};
use ratecal_math::Array;
use ratecal_models::{CalibrationErrorType, CalibrationHelper, ModelFamily};
use ratecal_quotes::{Quote, SimpleQuote};
use ratecal_termstructures::YieldTermStructure;
use ratecal_time::{DayCounter, Period};
use std::sync::{Arc, RwLock, Weak};
use tracing::debug;

/// Cached Black value, cleared by quote notifications.
#[derive(Debug, Default)]
struct MarketValueCache(RwLock<Option<Real>>);

impl MarketValueCache {
    fn get(&self) -> Option<Real> {
        *self.0.read().unwrap_or_else(|p| p.into_inner())
    }

    fn set(&self, value: Real) {
        *self.0.write().unwrap_or_else(|p| p.into_inner()) = Some(value);
    }
}

impl Observer for MarketValueCache {
    fn update(&self) {
        self.0.write().unwrap_or_else(|p| p.into_inner()).take();
    }
}

/// Calibration helper for an ATM European payer swaption.
#[derive(Debug)]
pub struct SwaptionHelper {
    maturity: Period,
    length: Period,
    volatility: Handle<SimpleQuote>,
    arguments: SwaptionArguments,
    error_type: CalibrationErrorType,
    model_family: RwLock<ModelFamily>,
    engine: RwLock<Option<Arc<dyn SwaptionEngine>>>,
    market_value: Arc<MarketValueCache>,
}

impl SwaptionHelper {
    /// Build the helper for the `maturity` × `length` cell quoted at
    /// `volatility`, slated for `model_family`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        maturity: Period,
        length: Period,
        volatility: Handle<SimpleQuote>,
        index: &IborConvention,
        fixed_tenor: Period,
        fixed_day_counter: &dyn DayCounter,
        term_structure: &Handle<dyn YieldTermStructure>,
        model_family: ModelFamily,
        error_type: CalibrationErrorType,
    ) -> Result<Self> {
        let arguments = SwaptionArguments::atm(
            term_structure.try_get()?,
            index,
            maturity,
            length,
            fixed_tenor,
            fixed_day_counter,
        )?;
        let market_value = Arc::new(MarketValueCache::default());
        volatility
            .try_get()?
            .register_observer(Arc::downgrade(&market_value) as Weak<dyn Observer>);
        Ok(Self {
            maturity,
            length,
            volatility,
            arguments,
            error_type,
            model_family: RwLock::new(model_family),
            engine: RwLock::new(None),
            market_value,
        })
    }

    /// Option maturity.
    pub fn maturity(&self) -> Period {
        self.maturity
    }

    /// Underlying swap length.
    pub fn length(&self) -> Period {
        self.length
    }

    /// The observed volatility quote.
    pub fn volatility(&self) -> &Handle<SimpleQuote> {
        &self.volatility
    }

    /// The swaption as engines see it.
    pub fn arguments(&self) -> &SwaptionArguments {
        &self.arguments
    }

    /// Re-slate the helper for another model family. An attached engine
    /// of a different family is dropped.
    pub fn slate_for(&self, family: ModelFamily) {
        *self.model_family.write().unwrap_or_else(|p| p.into_inner()) = family;
        let mut engine = self.engine.write().unwrap_or_else(|p| p.into_inner());
        if engine.as_ref().is_some_and(|e| e.model_family() != family) {
            *engine = None;
        }
    }

    /// Bind a pricing engine, which must price the family this helper is
    /// slated for.
    pub fn attach_engine(&self, engine: Arc<dyn SwaptionEngine>) -> Result<()> {
        let family = self.model_family();
        if engine.model_family() != family {
            return Err(Error::InvalidEngine(format!(
                "{} prices {} swaptions, {} is slated for {family}",
                engine.name(),
                engine.model_family(),
                self.label()
            )));
        }
        debug!(helper = %self.label(), engine = engine.name(), "engine attached");
        *self.engine.write().unwrap_or_else(|p| p.into_inner()) = Some(engine);
        Ok(())
    }

    fn engine(&self) -> Result<Arc<dyn SwaptionEngine>> {
        self.engine
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
            .ok_or_else(|| Error::NoEngine(self.label()))
    }
}

impl CalibrationHelper for SwaptionHelper {
    fn label(&self) -> String {
        format!("{}x{}", self.maturity, self.length)
    }

    fn model_family(&self) -> ModelFamily {
        *self.model_family.read().unwrap_or_else(|p| p.into_inner())
    }

    fn engine_family(&self) -> Option<ModelFamily> {
        self.engine
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .as_ref()
            .map(|e| e.model_family())
    }

    fn error_type(&self) -> CalibrationErrorType {
        self.error_type
    }

    fn market_volatility(&self) -> Result<Volatility> {
        self.volatility.try_get()?.try_value()
    }

    fn market_value(&self) -> Result<Real> {
        if let Some(v) = self.market_value.get() {
            return Ok(v);
        }
        let value = self.black_price(self.market_volatility()?)?;
        self.market_value.set(value);
        Ok(value)
    }

    fn black_price(&self, vol: Volatility) -> Result<Real> {
        self.arguments.black_price(vol)
    }

    fn model_value_with(&self, params: &Array) -> Result<Real> {
        self.engine()?.calculate_with(&self.arguments, params)
    }

    fn model_value(&self) -> Result<Real> {
        self.engine()?.calculate(&self.arguments)
    }
}
