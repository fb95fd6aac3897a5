//! `CalibrationHelper`: a market instrument as seen by the calibration loop.
//!
//! A helper knows its market value (from a quoted volatility), can price
//! itself under trial model parameters through its attached engine, and
//! turns the two into a residual.

use crate::calibrated_model::ModelFamily;
use ratecal_core::{errors::Result, Real, Size, Volatility};
use ratecal_math::{Array, Brent};
use serde::Deserialize;
use std::fmt;

/// How a helper's residual is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CalibrationErrorType {
    /// `(model − market) / market`
    #[default]
    RelativePriceError,
    /// `model − market`
    PriceError,
    /// `implied_vol(model) − quoted_vol`
    ImpliedVolError,
}

/// Bracket, accuracy and budget of an implied-volatility search.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct ImpliedVolSettings {
    /// Accuracy on the volatility.
    pub accuracy: Real,
    /// Maximum Black-price evaluations.
    pub max_evaluations: Size,
    /// Lower end of the bracket.
    pub min_vol: Volatility,
    /// Upper end of the bracket.
    pub max_vol: Volatility,
}

impl Default for ImpliedVolSettings {
    fn default() -> Self {
        Self {
            accuracy: 1e-4,
            max_evaluations: 1000,
            min_vol: 0.05,
            max_vol: 0.50,
        }
    }
}

impl ImpliedVolSettings {
    /// Settings for the implied-volatility residual: tight and wide.
    pub const RESIDUAL: Self = Self {
        accuracy: 1e-12,
        max_evaluations: 5000,
        min_vol: 0.001,
        max_vol: 10.0,
    };
}

/// A calibration instrument.
pub trait CalibrationHelper: fmt::Debug + Send + Sync {
    /// Short label for logs and reports, e.g. `1Yx5Y`.
    fn label(&self) -> String;

    /// The model family this helper is slated to calibrate.
    fn model_family(&self) -> ModelFamily;

    /// Family of the attached engine, if any.
    fn engine_family(&self) -> Option<ModelFamily>;

    /// Residual definition.
    fn error_type(&self) -> CalibrationErrorType;

    /// The quoted volatility.
    fn market_volatility(&self) -> Result<Volatility>;

    /// Black price at the quoted volatility.
    fn market_value(&self) -> Result<Real>;

    /// Black price at volatility `vol`.
    fn black_price(&self, vol: Volatility) -> Result<Real>;

    /// Model price under trial parameters `params`.
    fn model_value_with(&self, params: &Array) -> Result<Real>;

    /// Model price under the model's current parameters.
    fn model_value(&self) -> Result<Real>;

    /// The Black volatility reproducing `target_value`, by Brent search
    /// over `[min_vol, max_vol]`.
    fn implied_volatility(
        &self,
        target_value: Real,
        accuracy: Real,
        max_evaluations: Size,
        min_vol: Volatility,
        max_vol: Volatility,
    ) -> Result<Volatility> {
        Brent::new(accuracy, max_evaluations)
            .try_solve(|v| Ok(self.black_price(v)? - target_value), min_vol, max_vol)
            .map(|s| s.root)
    }

    /// [`implied_volatility`](Self::implied_volatility) with bundled settings.
    fn implied_volatility_with(
        &self,
        target_value: Real,
        settings: &ImpliedVolSettings,
    ) -> Result<Volatility> {
        self.implied_volatility(
            target_value,
            settings.accuracy,
            settings.max_evaluations,
            settings.min_vol,
            settings.max_vol,
        )
    }

    /// Residual of a model price against the market.
    fn residual(&self, model_value: Real) -> Result<Real> {
        match self.error_type() {
            CalibrationErrorType::RelativePriceError => {
                let market = self.market_value()?;
                Ok((model_value - market) / market)
            }
            CalibrationErrorType::PriceError => Ok(model_value - self.market_value()?),
            CalibrationErrorType::ImpliedVolError => {
                let implied =
                    self.implied_volatility_with(model_value, &ImpliedVolSettings::RESIDUAL)?;
                Ok(implied - self.market_volatility()?)
            }
        }
    }

    /// Residual under trial parameters.
    fn calibration_error_with(&self, params: &Array) -> Result<Real> {
        self.residual(self.model_value_with(params)?)
    }

    /// Residual under the model's current parameters.
    fn calibration_error(&self) -> Result<Real> {
        self.residual(self.model_value()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ratecal_core::Error;
    use ratecal_math::{black_formula, OptionType};

    /// A one-year ATM option on a 6% forward whose "model" is Black itself
    /// at the volatility held in `params[0]`.
    #[derive(Debug)]
    struct BlackStub {
        quoted: Volatility,
        error_type: CalibrationErrorType,
    }

    impl CalibrationHelper for BlackStub {
        fn label(&self) -> String {
            "stub".into()
        }
        fn model_family(&self) -> ModelFamily {
            ModelFamily::HullWhite
        }
        fn engine_family(&self) -> Option<ModelFamily> {
            Some(ModelFamily::HullWhite)
        }
        fn error_type(&self) -> CalibrationErrorType {
            self.error_type
        }
        fn market_volatility(&self) -> Result<Volatility> {
            Ok(self.quoted)
        }
        fn market_value(&self) -> Result<Real> {
            self.black_price(self.quoted)
        }
        fn black_price(&self, vol: Volatility) -> Result<Real> {
            black_formula(OptionType::Call, 0.06, 0.06, vol, 4.2)
        }
        fn model_value_with(&self, params: &Array) -> Result<Real> {
            self.black_price(params[0])
        }
        fn model_value(&self) -> Result<Real> {
            self.market_value()
        }
    }

    fn stub(error_type: CalibrationErrorType) -> BlackStub {
        BlackStub {
            quoted: 0.164,
            error_type,
        }
    }

    #[test]
    fn implied_volatility_round_trip() {
        let h = stub(CalibrationErrorType::default());
        let npv = h.model_value().unwrap();
        let vol = h
            .implied_volatility_with(npv, &ImpliedVolSettings::default())
            .unwrap();
        assert_abs_diff_eq!(vol, 0.164, epsilon = 1e-4);
    }

    #[test]
    fn implied_volatility_outside_bracket() {
        let h = stub(CalibrationErrorType::default());
        let npv = h.black_price(0.9).unwrap();
        let err = h
            .implied_volatility_with(npv, &ImpliedVolSettings::default())
            .unwrap_err();
        assert!(matches!(err, Error::RootNotBracketed { .. }));
    }

    #[test]
    fn residual_definitions() {
        let at = |v: Real| Array::from_slice(&[v]);
        let rel = stub(CalibrationErrorType::RelativePriceError);
        assert_abs_diff_eq!(rel.calibration_error().unwrap(), 0.0, epsilon = 1e-15);
        let expected = (rel.black_price(0.2).unwrap() - rel.market_value().unwrap())
            / rel.market_value().unwrap();
        assert_abs_diff_eq!(rel.calibration_error_with(&at(0.2)).unwrap(), expected, epsilon = 1e-15);

        let price = stub(CalibrationErrorType::PriceError);
        let expected = price.black_price(0.2).unwrap() - price.market_value().unwrap();
        assert_abs_diff_eq!(price.calibration_error_with(&at(0.2)).unwrap(), expected, epsilon = 1e-15);

        let vol = stub(CalibrationErrorType::ImpliedVolError);
        assert_abs_diff_eq!(vol.calibration_error_with(&at(0.2)).unwrap(), 0.2 - 0.164, epsilon = 1e-9);
    }

    #[test]
    fn default_settings() {
        let s = ImpliedVolSettings::default();
        assert_eq!(s.accuracy, 1e-4);
        assert_eq!(s.max_evaluations, 1000);
        assert_eq!((s.min_vol, s.max_vol), (0.05, 0.50));
    }
}
