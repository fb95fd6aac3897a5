//! Calibrated-model infrastructure: `Parameter`, `ModelParameters` and the
//! `CalibratedModel` trait with its calibration loop.
//!
//! A model owns its parameter vector behind a lock. Calibration builds a
//! pure cost function (trial parameters → residuals) from the helper
//! ensemble, hands it to the optimizer, and writes the optimizer's final
//! iterate back exactly once.

use crate::calibration_helper::CalibrationHelper;
use ratecal_core::{
    errors::{Error, Result},
    Real, Size,
};
use ratecal_math::{
    Array, Constraint, EndCriteria, EndCriteriaType, LevenbergMarquardt, ParameterTransform,
};
use serde::Deserialize;
use std::fmt;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, info_span, warn};

// ────────────────────────────────────────────────────────────────────────────
// Model family and calibration state
// ────────────────────────────────────────────────────────────────────────────

/// The short-rate model families engines and helpers are bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelFamily {
    /// Two-factor Gaussian G2++.
    G2,
    /// One-factor Hull-White.
    HullWhite,
}

impl ModelFamily {
    /// Length of the family's parameter vector.
    pub fn parameter_count(self) -> Size {
        match self {
            ModelFamily::G2 => 5,
            ModelFamily::HullWhite => 2,
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelFamily::G2 => f.write_str("G2++"),
            ModelFamily::HullWhite => f.write_str("Hull-White"),
        }
    }
}

/// Where a model stands with respect to calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalibrationState {
    /// Parameters are still the construction values.
    Uninitialized,
    /// An optimization is running.
    Calibrating,
    /// The last optimization met a tolerance.
    Calibrated,
    /// The last optimization gave up or was aborted.
    CalibrationFailed,
}

impl fmt::Display for CalibrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CalibrationState::Uninitialized => "uninitialized",
            CalibrationState::Calibrating => "calibrating",
            CalibrationState::Calibrated => "calibrated",
            CalibrationState::CalibrationFailed => "calibration failed",
        };
        f.write_str(s)
    }
}

/// Summary of one `calibrate()` call.
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationOutcome {
    /// Why the optimizer stopped.
    pub end_type: EndCriteriaType,
    /// Optimizer iterations.
    pub iterations: Size,
    /// Sum of squared calibration errors at the final parameters.
    pub function_value: Real,
    /// Model state after the call.
    pub state: CalibrationState,
}

impl CalibrationOutcome {
    /// Whether the optimizer stopped on a tolerance.
    pub fn is_converged(&self) -> bool {
        self.end_type.is_converged()
    }

    /// The outcome as an error when the optimizer did not converge.
    pub fn ensure_converged(&self) -> Result<()> {
        if self.is_converged() {
            Ok(())
        } else {
            Err(Error::CalibrationFailed(format!(
                "optimizer stopped at {} after {} iterations",
                self.end_type, self.iterations
            )))
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Parameter
// ────────────────────────────────────────────────────────────────────────────

/// One named slot of a model's parameter vector and its admissible domain.
#[derive(Debug, Clone)]
pub struct Parameter {
    name: &'static str,
    constraint: Arc<dyn Constraint>,
}

impl Parameter {
    /// Create a parameter slot.
    pub fn new(name: &'static str, constraint: impl Constraint + 'static) -> Self {
        Self {
            name,
            constraint: Arc::new(constraint),
        }
    }

    /// Label used in reports.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `value` lies in the parameter's domain.
    pub fn is_valid(&self, value: Real) -> bool {
        self.constraint.test(value)
    }

    /// Access the constraint.
    pub fn constraint(&self) -> &Arc<dyn Constraint> {
        &self.constraint
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ModelParameters
// ────────────────────────────────────────────────────────────────────────────

/// The mutable parameter vector of a model plus its calibration state.
#[derive(Debug)]
pub struct ModelParameters {
    family: ModelFamily,
    parameters: Vec<Parameter>,
    values: RwLock<Array>,
    state: RwLock<CalibrationState>,
}

impl ModelParameters {
    /// Create the parameter set of a `family` model with initial values.
    pub fn new(family: ModelFamily, parameters: Vec<Parameter>, initial: Array) -> Result<Self> {
        if parameters.len() != family.parameter_count() {
            return Err(Error::InvalidArgument(format!(
                "{family} has {} parameters, {} slots given",
                family.parameter_count(),
                parameters.len()
            )));
        }
        check_values(&parameters, &initial)?;
        Ok(Self {
            family,
            parameters,
            values: RwLock::new(initial),
            state: RwLock::new(CalibrationState::Uninitialized),
        })
    }

    /// The model family.
    pub fn family(&self) -> ModelFamily {
        self.family
    }

    /// Parameter slots in vector order.
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Parameter labels in vector order.
    pub fn names(&self) -> Vec<&'static str> {
        self.parameters.iter().map(Parameter::name).collect()
    }

    /// Snapshot of the current values.
    pub fn values(&self) -> Array {
        self.values.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Replace all values at once, after checking length and domains.
    pub fn set_values(&self, values: &Array) -> Result<()> {
        check_values(&self.parameters, values)?;
        *self.values.write().unwrap_or_else(|p| p.into_inner()) = values.clone();
        Ok(())
    }

    /// Current calibration state.
    pub fn state(&self) -> CalibrationState {
        *self.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn set_state(&self, state: CalibrationState) {
        *self.state.write().unwrap_or_else(|p| p.into_inner()) = state;
    }

    /// The transform mapping the parameter domains to the real line.
    pub fn transform(&self) -> ParameterTransform {
        ParameterTransform::new(self.parameters.iter().map(|p| p.constraint.clone()).collect())
    }
}

fn check_values(parameters: &[Parameter], values: &Array) -> Result<()> {
    if values.size() != parameters.len() {
        return Err(Error::InvalidArgument(format!(
            "expected {} parameter values, got {}",
            parameters.len(),
            values.size()
        )));
    }
    for (p, &v) in parameters.iter().zip(values.iter()) {
        if !p.is_valid(v) {
            return Err(Error::InvalidArgument(format!(
                "parameter {} = {v} is outside its domain",
                p.name
            )));
        }
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// CalibratedModel trait
// ────────────────────────────────────────────────────────────────────────────

/// A model that can be calibrated to market data.
pub trait CalibratedModel: fmt::Debug + Send + Sync {
    /// The model's parameter set.
    fn parameters(&self) -> &ModelParameters;

    /// The model family.
    fn family(&self) -> ModelFamily {
        self.parameters().family()
    }

    /// Read-only snapshot of the parameter vector.
    fn params(&self) -> Array {
        self.parameters().values()
    }

    /// Overwrite the parameter vector.
    fn set_params(&self, values: &Array) -> Result<()> {
        self.parameters().set_values(values)
    }

    /// Current calibration state.
    fn state(&self) -> CalibrationState {
        self.parameters().state()
    }

    /// Fit the parameters to `helpers` by minimizing the sum of squared
    /// calibration errors.
    ///
    /// Structural problems (empty ensemble, helpers slated for another
    /// model, missing or mismatched engines, mixed error definitions) fail
    /// before the optimizer starts. Non-convergence is not an error: it is
    /// reported through the outcome and the model state, with the
    /// parameters left at the last iterate.
    fn calibrate(
        &self,
        helpers: &[Arc<dyn CalibrationHelper>],
        method: &LevenbergMarquardt,
        end_criteria: &EndCriteria,
    ) -> Result<CalibrationOutcome> {
        let core = self.parameters();
        let family = core.family();
        let span = info_span!("calibrate", model = %family, helpers = helpers.len());
        let _enter = span.enter();

        check_ensemble(family, helpers)?;
        core.set_state(CalibrationState::Calibrating);

        let cost = |x: &Array| -> Result<Array> {
            helpers.iter().map(|h| h.calibration_error_with(x)).collect()
        };
        let result = match method.minimize(&cost, &core.transform(), &core.values(), end_criteria)
        {
            Ok(r) => r,
            Err(e) => {
                core.set_state(CalibrationState::CalibrationFailed);
                warn!(error = %e, "calibration aborted");
                return Err(e);
            }
        };

        if let Err(e) = core.set_values(&result.x) {
            core.set_state(CalibrationState::CalibrationFailed);
            warn!(error = %e, "optimizer returned an inadmissible point");
            return Err(e);
        }
        let state = if result.end_type.is_converged() {
            CalibrationState::Calibrated
        } else {
            CalibrationState::CalibrationFailed
        };
        core.set_state(state);

        let outcome = CalibrationOutcome {
            end_type: result.end_type,
            iterations: result.iterations,
            function_value: result.value,
            state,
        };
        if outcome.is_converged() {
            info!(
                end = %outcome.end_type,
                iterations = outcome.iterations,
                cost = outcome.function_value,
                params = %result.x,
                "calibration finished"
            );
        } else {
            warn!(
                end = %outcome.end_type,
                iterations = outcome.iterations,
                cost = outcome.function_value,
                "calibration did not converge"
            );
        }
        Ok(outcome)
    }
}

/// Check that an ensemble can be calibrated by a `family` model.
pub fn check_ensemble(family: ModelFamily, helpers: &[Arc<dyn CalibrationHelper>]) -> Result<()> {
    let Some(first) = helpers.first() else {
        return Err(Error::DataShape("no calibration helpers".into()));
    };
    let error_type = first.error_type();
    for h in helpers {
        if h.model_family() != family {
            return Err(Error::InvalidEngine(format!(
                "{} is slated for {}, not {family}",
                h.label(),
                h.model_family()
            )));
        }
        match h.engine_family() {
            None => return Err(Error::NoEngine(h.label())),
            Some(f) if f != family => {
                return Err(Error::InvalidEngine(format!(
                    "{} has a {f} engine attached, calibrating {family}",
                    h.label()
                )))
            }
            Some(_) => {}
        }
        if h.error_type() != error_type {
            return Err(Error::InvalidArgument(format!(
                "{} uses {:?}, the ensemble uses {error_type:?}",
                h.label(),
                h.error_type()
            )));
        }
    }
    debug!(helpers = helpers.len(), ?error_type, "ensemble checked");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratecal_math::{BoundaryConstraint, PositiveConstraint};

    fn hw_parameters() -> ModelParameters {
        ModelParameters::new(
            ModelFamily::HullWhite,
            vec![
                Parameter::new("a", PositiveConstraint),
                Parameter::new("sigma", PositiveConstraint),
            ],
            Array::from_slice(&[0.1, 0.01]),
        )
        .unwrap()
    }

    #[test]
    fn parameter_domains() {
        let p = Parameter::new("rho", BoundaryConstraint::new(-1.0, 1.0).unwrap());
        assert_eq!(p.name(), "rho");
        assert!(p.is_valid(-0.75));
        assert!(!p.is_valid(1.5));
    }

    #[test]
    fn set_values_checks_domain_and_length() {
        let params = hw_parameters();
        assert!(params.set_values(&Array::from_slice(&[0.2, 0.02])).is_ok());
        assert_eq!(params.values().as_slice(), &[0.2, 0.02]);
        assert!(params.set_values(&Array::from_slice(&[-0.2, 0.02])).is_err());
        assert!(params.set_values(&Array::from_slice(&[0.2])).is_err());
        assert_eq!(params.values().as_slice(), &[0.2, 0.02]);
    }

    #[test]
    fn slot_count_must_match_family() {
        let r = ModelParameters::new(
            ModelFamily::G2,
            vec![Parameter::new("a", PositiveConstraint)],
            Array::from_slice(&[0.1]),
        );
        assert!(matches!(r, Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn starts_uninitialized() {
        let params = hw_parameters();
        assert_eq!(params.state(), CalibrationState::Uninitialized);
        assert_eq!(params.names(), vec!["a", "sigma"]);
    }

    #[test]
    fn empty_ensemble_is_a_shape_error() {
        assert!(matches!(
            check_ensemble(ModelFamily::G2, &[]),
            Err(Error::DataShape(_))
        ));
    }

    #[test]
    fn outcome_convergence() {
        let outcome = CalibrationOutcome {
            end_type: EndCriteriaType::MaxIterations,
            iterations: 400,
            function_value: 1e-3,
            state: CalibrationState::CalibrationFailed,
        };
        assert!(!outcome.is_converged());
        assert!(matches!(outcome.ensure_converged(), Err(Error::CalibrationFailed(_))));
        assert_eq!(ModelFamily::G2.to_string(), "G2++");
        assert_eq!(ModelFamily::HullWhite.parameter_count(), 2);
    }
}
