//! Miscellaneous utilities.

pub mod data_formatters;
