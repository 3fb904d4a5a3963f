//! Coverage ratios
//!
//! A ratio over zero declared elements is undefined and reported as NaN,
//! never as 0 or 1.

/// Covered over declared; NaN when nothing is declared
#[must_use]
pub fn coverage_ratio(covered: usize, declared: usize) -> f64 {
    if declared == 0 {
        return f64::NAN;
    }
    covered as f64 / declared as f64
}

/// Render a ratio as a percentage, or "undefined" for NaN
#[must_use]
pub fn format_ratio(ratio: f64) -> String {
    if ratio.is_nan() {
        "undefined".to_string()
    } else {
        format!("{:.1}%", ratio * 100.0)
    }
}

/// Map NaN to `None` for serialization
#[must_use]
pub fn defined(ratio: f64) -> Option<f64> {
    if ratio.is_nan() {
        None
    } else {
        Some(ratio)
    }
}
