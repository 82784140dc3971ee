//! Indicator preprocessing.
//!
//! Indicators are pure functions of the bar series, computed once before the
//! replay and attached per bar. Recomputing them on the same series yields
//! identical values.

pub mod bands;
pub mod sma;

pub use bands::{DipGainBands, IndicatorSet};
pub use sma::{RollingMean, TrailingMean};

/// Create daily bars from close prices for testing.
///
/// The first bar is Tuesday 2024-01-02 at midnight; bars are one day apart.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    make_bars_every(closes, chrono::Duration::days(1))
}

/// Create bars from close prices spaced `step` apart, starting 2024-01-02.
#[cfg(test)]
pub fn make_bars_every(closes: &[f64], step: chrono::Duration) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| Bar::new(base + step * i as i32, close))
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
