//! The fit report: model against market volatility per helper, then the
//! calibrated parameters.
//!
//! ```text
//! G2 (analytic formulae) calibration
//! 1Yx1Y: model 16.4012 %, market 16.4000 % (+0.0012 %)
//! ...
//! calibrated to:
//! a     = 0.051, sigma = 0.0094
//! b     = 0.051, eta   = 0.0094
//! rho   = -0.63
//! ```

use ratecal_core::{
    errors::{Error, Result},
    utilities::data_formatters::{format_signed_volatility, format_volatility},
    Real, Volatility,
};
use ratecal_models::{CalibratedModel, CalibrationHelper, CalibrationOutcome, ImpliedVolSettings};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

const VOL_WIDTH: usize = 7;
const VOL_DECIMALS: usize = 4;

/// What to do when a helper's implied volatility cannot be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImpliedVolPolicy {
    /// Fail the whole report with the first error.
    AbortOnFirst,
    /// Print an error marker for the helper and carry on.
    #[default]
    CollectAll,
}

/// One line of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct HelperLine {
    /// Helper label, e.g. `1Yx5Y`.
    pub label: String,
    /// Volatility implied by the model price, or why it could not be found.
    pub model_vol: Result<Volatility>,
    /// Quoted volatility.
    pub market_vol: Volatility,
}

impl HelperLine {
    /// `model − market`, when the model volatility is known.
    pub fn difference(&self) -> Option<Volatility> {
        self.model_vol.as_ref().ok().map(|v| v - self.market_vol)
    }
}

impl fmt::Display for HelperLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let market = format_volatility(self.market_vol, VOL_WIDTH, VOL_DECIMALS);
        match &self.model_vol {
            Ok(v) => write!(
                f,
                "{}: model {}, market {} ({})",
                self.label,
                format_volatility(*v, VOL_WIDTH, VOL_DECIMALS),
                market,
                format_signed_volatility(v - self.market_vol, VOL_WIDTH, VOL_DECIMALS)
            ),
            Err(e) => write!(f, "{}: model   ERROR, market {} [{e}]", self.label, market),
        }
    }
}

/// Report of one calibration round.
#[derive(Debug, Clone)]
pub struct ModelReport {
    /// Heading, e.g. `G2 (analytic formulae) calibration`.
    pub title: String,
    /// One line per helper, in grid order.
    pub lines: Vec<HelperLine>,
    /// Parameter labels.
    pub names: Vec<&'static str>,
    /// Calibrated values.
    pub params: Vec<Real>,
    /// How the optimizer ended.
    pub outcome: CalibrationOutcome,
}

impl ModelReport {
    /// Price every helper under `model`'s current parameters and collect
    /// the report.
    pub fn build(
        title: impl Into<String>,
        model: &dyn CalibratedModel,
        helpers: &[Arc<dyn CalibrationHelper>],
        outcome: CalibrationOutcome,
        settings: &ImpliedVolSettings,
        policy: ImpliedVolPolicy,
    ) -> Result<Self> {
        let mut lines = Vec::with_capacity(helpers.len());
        for h in helpers {
            let model_vol = h
                .model_value()
                .and_then(|npv| h.implied_volatility_with(npv, settings));
            if let Err(e) = &model_vol {
                if e.is_structural() || policy == ImpliedVolPolicy::AbortOnFirst {
                    return Err(e.clone());
                }
                warn!(helper = %h.label(), error = %e, "implied volatility not found");
            }
            lines.push(HelperLine {
                label: h.label(),
                model_vol,
                market_vol: h.market_volatility()?,
            });
        }
        Ok(Self {
            title: title.into(),
            lines,
            names: model.parameters().names(),
            params: model.params().as_slice().to_vec(),
            outcome,
        })
    }

    /// Lines whose implied volatility could not be found.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &Error)> {
        self.lines
            .iter()
            .filter_map(|l| l.model_vol.as_ref().err().map(|e| (l.label.as_str(), e)))
    }

    fn write_params(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Labels line up when parameters are printed two per line.
        let width = if self.names.len() > 2 {
            self.names.iter().map(|n| n.len()).max().unwrap_or(0)
        } else {
            0
        };
        let pairs: Vec<String> = self
            .names
            .iter()
            .zip(&self.params)
            .map(|(n, v)| format!("{n:<width$} = {v}"))
            .collect();
        for chunk in pairs.chunks(2) {
            writeln!(f, "{}", chunk.join(", "))?;
        }
        Ok(())
    }
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.title)?;
        if !self.outcome.is_converged() {
            write!(f, " [NOT CONVERGED]")?;
        }
        writeln!(f)?;
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        writeln!(f, "calibrated to:")?;
        self.write_params(f)?;
        writeln!(
            f,
            "end criteria: {} after {} iterations",
            self.outcome.end_type, self.outcome.iterations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratecal_core::{Compounding, Handle};
    use ratecal_math::{black_formula, Array, EndCriteriaType, OptionType};
    use ratecal_models::{CalibrationErrorType, CalibrationState, HullWhite, ModelFamily};
    use ratecal_quotes::SimpleQuote;
    use ratecal_termstructures::{FlatForward, YieldTermStructure};
    use ratecal_time::{Actual365Fixed, Date};

    /// Prices a one-year ATM option at `model_vol`, quoted at 16.4%.
    #[derive(Debug)]
    struct FixedVolHelper {
        label: &'static str,
        model_vol: Volatility,
    }

    impl CalibrationHelper for FixedVolHelper {
        fn label(&self) -> String {
            self.label.into()
        }
        fn model_family(&self) -> ModelFamily {
            ModelFamily::HullWhite
        }
        fn engine_family(&self) -> Option<ModelFamily> {
            Some(ModelFamily::HullWhite)
        }
        fn error_type(&self) -> CalibrationErrorType {
            CalibrationErrorType::RelativePriceError
        }
        fn market_volatility(&self) -> Result<Volatility> {
            Ok(0.164)
        }
        fn market_value(&self) -> Result<Real> {
            self.black_price(0.164)
        }
        fn black_price(&self, vol: Volatility) -> Result<Real> {
            black_formula(OptionType::Call, 0.06, 0.06, vol, 4.2)
        }
        fn model_value_with(&self, _params: &Array) -> Result<Real> {
            self.model_value()
        }
        fn model_value(&self) -> Result<Real> {
            self.black_price(self.model_vol)
        }
    }

    fn hull_white() -> HullWhite {
        let reference = Date::from_ymd(2016, 2, 17).unwrap();
        let curve = FlatForward::new(
            reference,
            Handle::new(SimpleQuote::new(0.06215)),
            Actual365Fixed,
            Compounding::Continuous,
        );
        HullWhite::new(Handle::from_arc(Arc::new(curve) as Arc<dyn YieldTermStructure>)).unwrap()
    }

    /// The second helper's model price lies above the default bracket.
    fn helpers() -> Vec<Arc<dyn CalibrationHelper>> {
        vec![
            Arc::new(FixedVolHelper {
                label: "1Yx1Y",
                model_vol: 0.165,
            }),
            Arc::new(FixedVolHelper {
                label: "1Yx2Y",
                model_vol: 0.9,
            }),
        ]
    }

    fn outcome(end_type: EndCriteriaType) -> CalibrationOutcome {
        CalibrationOutcome {
            end_type,
            iterations: 12,
            function_value: 1e-6,
            state: if end_type.is_converged() {
                CalibrationState::Calibrated
            } else {
                CalibrationState::CalibrationFailed
            },
        }
    }

    #[test]
    fn helper_line_format() {
        let line = HelperLine {
            label: "1Yx5Y".into(),
            model_vol: Ok(0.1251),
            market_vol: 0.1240,
        };
        assert_eq!(line.to_string(), "1Yx5Y: model 12.5100 %, market 12.4000 % (+0.1100 %)");
        assert!((line.difference().unwrap() - 0.0011).abs() < 1e-12);
    }

    #[test]
    fn failed_line_keeps_the_market_quote() {
        let line = HelperLine {
            label: "5Yx5Y".into(),
            model_vol: Err(Error::RootNotBracketed {
                lower: 0.05,
                upper: 0.5,
                reason: "same sign".into(),
            }),
            market_vol: 0.11,
        };
        let s = line.to_string();
        assert!(s.starts_with("5Yx5Y: model   ERROR, market 11.0000 %"), "{s}");
        assert_eq!(line.difference(), None);
    }

    #[test]
    fn g2_parameter_layout() {
        let report = ModelReport {
            title: "G2 (analytic formulae) calibration".into(),
            lines: vec![],
            names: vec!["a", "sigma", "b", "eta", "rho"],
            params: vec![0.1, 0.01, 0.2, 0.02, -0.5],
            outcome: outcome(EndCriteriaType::FunctionEpsilon),
        };
        let text = report.to_string();
        assert!(text.contains("a     = 0.1, sigma = 0.01\nb     = 0.2, eta   = 0.02\nrho   = -0.5\n"));
        assert!(!text.contains("NOT CONVERGED"));
    }

    #[test]
    fn hull_white_layout_and_not_converged_tag() {
        let report = ModelReport {
            title: "Hull-White (analytic formulae) calibration".into(),
            lines: vec![],
            names: vec!["a", "sigma"],
            params: vec![0.05, 0.008],
            outcome: outcome(EndCriteriaType::MaxIterations),
        };
        let text = report.to_string();
        assert!(text.starts_with("Hull-White (analytic formulae) calibration [NOT CONVERGED]\n"));
        assert!(text.contains("a = 0.05, sigma = 0.008\n"));
        assert!(text.contains("end criteria: MaxIterations after 12 iterations"));
    }

    #[test]
    fn collect_all_marks_the_failed_line() {
        let report = ModelReport::build(
            "Hull-White (analytic formulae) calibration",
            &hull_white(),
            &helpers(),
            outcome(EndCriteriaType::FunctionEpsilon),
            &ImpliedVolSettings::default(),
            ImpliedVolPolicy::CollectAll,
        )
        .unwrap();

        assert_eq!(report.lines.len(), 2);
        assert!((report.lines[0].model_vol.as_ref().unwrap() - 0.165).abs() < 1e-3);
        let failed: Vec<_> = report.failures().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0, "1Yx2Y");
        assert!(matches!(failed[0].1, Error::RootNotBracketed { .. }));
        assert!(report.to_string().contains("1Yx2Y: model   ERROR"));
        assert_eq!(report.names, vec!["a", "sigma"]);
    }

    #[test]
    fn abort_on_first_returns_the_search_error() {
        let err = ModelReport::build(
            "Hull-White (analytic formulae) calibration",
            &hull_white(),
            &helpers(),
            outcome(EndCriteriaType::FunctionEpsilon),
            &ImpliedVolSettings::default(),
            ImpliedVolPolicy::AbortOnFirst,
        )
        .unwrap_err();
        assert!(matches!(err, Error::RootNotBracketed { .. }), "{err}");
    }
}
