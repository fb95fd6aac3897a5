//! # ratecal-quotes
//!
//! Observable market quotes.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// `Quote` trait and the mutable `SimpleQuote`.
pub mod quote;

pub use quote::{Quote, SimpleQuote};
