//! The swaption pricing-engine contract.
//!
//! An engine is bound to one model family and prices swaptions under that
//! family's parameter vector. The calibration loop prices under trial
//! vectors through [`SwaptionEngine::calculate_with`] without touching the
//! model, and reporting prices under the model's current parameters
//! through [`SwaptionEngine::calculate`].

use crate::swaption::SwaptionArguments;
use ratecal_core::{errors::Result, Real};
use ratecal_math::Array;
use ratecal_models::ModelFamily;

/// A pricing engine for European swaptions under a short-rate model.
pub trait SwaptionEngine: std::fmt::Debug + Send + Sync {
    /// Short engine name for logs.
    fn name(&self) -> &'static str;

    /// The model family whose parameters this engine consumes.
    fn model_family(&self) -> ModelFamily;

    /// Snapshot of the bound model's current parameters.
    fn model_params(&self) -> Array;

    /// Price `args` under the parameter vector `params`.
    fn calculate_with(&self, args: &SwaptionArguments, params: &Array) -> Result<Real>;

    /// Price `args` under the bound model's current parameters.
    fn calculate(&self, args: &SwaptionArguments) -> Result<Real> {
        self.calculate_with(args, &self.model_params())
    }
}
