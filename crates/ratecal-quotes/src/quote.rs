//! `Quote` trait and `SimpleQuote` implementation.
//!
//! A `SimpleQuote` is shared through a `Handle` by every object priced off
//! it (the flat curve reads its rate quote, each swaption helper reads its
//! volatility quote). Setting a new value notifies registered observers.

use ratecal_core::{
    errors::{Error, Result},
    patterns::observable::{Observable, ObservableImpl, Observer},
    Real,
};
use std::sync::{RwLock, Weak};

/// A market-observable value.
pub trait Quote: Observable + std::fmt::Debug + Send + Sync {
    /// Return the current value, or `None` if the quote is not set.
    fn value(&self) -> Option<Real>;

    /// Return `true` if the quote is currently valid.
    fn is_valid(&self) -> bool {
        self.value().is_some()
    }

    /// The current value, failing when the quote is not set.
    fn try_value(&self) -> Result<Real> {
        self.value()
            .ok_or_else(|| Error::Precondition("quote has no value".into()))
    }
}

/// A simple, mutable market quote.
#[derive(Debug, Default)]
pub struct SimpleQuote {
    value: RwLock<Option<Real>>,
    observable: ObservableImpl,
}

impl SimpleQuote {
    /// Create a new quote with the given value.
    pub fn new(value: Real) -> Self {
        Self {
            value: RwLock::new(Some(value)),
            observable: ObservableImpl::new(),
        }
    }

    /// Create an empty (invalid) quote.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set a new value and notify observers if it changed. Returns the
    /// difference from the previous value (zero for a previously empty
    /// quote).
    pub fn set_value(&self, value: Real) -> Real {
        let previous = {
            let mut slot = self.value.write().unwrap_or_else(|p| p.into_inner());
            slot.replace(value)
        };
        if previous != Some(value) {
            self.observable.notify();
        }
        previous.map_or(0.0, |p| value - p)
    }

    /// Clear the value, making the quote invalid.
    pub fn reset(&self) {
        let previous = self
            .value
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .take();
        if previous.is_some() {
            self.observable.notify();
        }
    }
}

impl Observable for SimpleQuote {
    fn register_observer(&self, observer: Weak<dyn Observer>) {
        self.observable.register(observer);
    }

    fn unregister_observer(&self, observer: &Weak<dyn Observer>) {
        self.observable.unregister(observer);
    }

    fn notify_observers(&self) {
        self.observable.notify();
    }
}

impl Quote for SimpleQuote {
    fn value(&self) -> Option<Real> {
        *self.value.read().unwrap_or_else(|p| p.into_inner())
    }
}
