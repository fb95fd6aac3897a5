//! Compounding conventions.

use crate::{Rate, Real, Time};

/// How interest is compounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compounding {
    /// Simple interest: `1 + r·t`
    Simple,
    /// Compounded annually: `(1 + r)^t`
    Compounded,
    /// Continuously compounded: `e^(r·t)`
    Continuous,
}

impl Compounding {
    /// Growth factor of one unit invested at `rate` for time `t`.
    pub fn compound_factor(self, rate: Rate, t: Time) -> Real {
        match self {
            Compounding::Simple => 1.0 + rate * t,
            Compounding::Compounded => (1.0 + rate).powf(t),
            Compounding::Continuous => (rate * t).exp(),
        }
    }

    /// The continuously-compounded rate equivalent to `rate` under this
    /// convention over a horizon of one year.
    pub fn to_continuous(self, rate: Rate) -> Rate {
        match self {
            Compounding::Continuous => rate,
            _ => self.compound_factor(rate, 1.0).ln(),
        }
    }
}
