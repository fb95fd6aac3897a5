//! Data formatting helpers for rates and volatilities.

use crate::{Rate, Volatility};

/// Format a rate as a percentage string (e.g. `0.05` → `"5.000000 %"`).
pub fn format_rate(r: Rate) -> String {
    format!("{:.6} %", r * 100.0)
}

/// Format a volatility as a percentage with `decimals` digits after the
/// point, right-aligned so the number occupies `width` characters.
///
/// `format_volatility(0.164, 7, 4)` → `"16.4000 %"`.
pub fn format_volatility(v: Volatility, width: usize, decimals: usize) -> String {
    format!("{:>width$.prec$} %", v * 100.0, width = width, prec = decimals)
}

/// Like [`format_volatility`] but always shows the sign, for differences.
///
/// `format_signed_volatility(-0.0012, 7, 4)` → `"-0.1200 %"`.
pub fn format_signed_volatility(v: Volatility, width: usize, decimals: usize) -> String {
    format!("{:>+width$.prec$} %", v * 100.0, width = width, prec = decimals)
}
