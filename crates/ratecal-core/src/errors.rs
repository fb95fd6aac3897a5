//! Error types for ratecal.
//!
//! A single `thiserror`-derived enum covers both the generic precondition
//! failures raised through the `ensure!` and `fail!` macros and the
//! calibration-specific taxonomy: data-shape errors, engine mismatches,
//! failed implied-volatility searches and non-converged calibrations.

use thiserror::Error;

/// The top-level error type used throughout ratecal.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error (raised by `fail!`).
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated (raised by `ensure!`).
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Index out of range.
    #[error("index ({index}) out of range [0, {size})")]
    IndexOutOfRange {
        /// The index that was out of range.
        index: usize,
        /// The size of the container.
        size: usize,
    },

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The market grid and the instrument ensemble disagree in shape.
    #[error("data shape error: {0}")]
    DataShape(String),

    /// A pricing engine was bound to an instrument it cannot price.
    #[error("invalid engine: {0}")]
    InvalidEngine(String),

    /// A value was requested from an instrument with no engine attached.
    #[error("no pricing engine attached to {0}")]
    NoEngine(String),

    /// A one-dimensional root search found no root in its bracket.
    #[error("root not bracketed in [{lower}, {upper}]: {reason}")]
    RootNotBracketed {
        /// Lower end of the search interval.
        lower: f64,
        /// Upper end of the search interval.
        upper: f64,
        /// Why the search failed.
        reason: String,
    },

    /// The optimizer stopped without meeting any convergence tolerance.
    #[error("calibration failed: {0}")]
    CalibrationFailed(String),

    /// Configuration could not be read or is inconsistent.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error is structural (bad inputs or wiring) rather
    /// than numerical.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Error::DataShape(_) | Error::InvalidEngine(_) | Error::NoEngine(_)
        )
    }
}

/// Shorthand `Result` type used throughout ratecal.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ratecal_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ratecal_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ));
        }
    };
}

/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use ratecal_core::{fail, errors::Error};
/// fn always_err() -> ratecal_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_classification() {
        assert!(Error::DataShape("3 != 4".into()).is_structural());
        assert!(Error::InvalidEngine("g2 on hw".into()).is_structural());
        assert!(!Error::CalibrationFailed("max iterations".into()).is_structural());
        assert!(!Error::RootNotBracketed {
            lower: 0.05,
            upper: 0.5,
            reason: "same sign".into()
        }
        .is_structural());
    }

    #[test]
    fn root_not_bracketed_message() {
        let e = Error::RootNotBracketed {
            lower: 0.05,
            upper: 0.5,
            reason: "f(lower) and f(upper) have the same sign".into(),
        };
        assert_eq!(
            e.to_string(),
            "root not bracketed in [0.05, 0.5]: f(lower) and f(upper) have the same sign"
        );
    }
}
