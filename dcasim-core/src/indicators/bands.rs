//! Rolling average with dip and gain bands.
//!
//! The dip line is where the strategy considers a price "cheap" relative to
//! its recent average; the gain line is the matching upper band. Both are
//! fixed multiples of the rolling mean.

use serde::{Deserialize, Serialize};

use super::sma::RollingMean;
use crate::domain::Bar;

/// Per-bar indicator values. All three are `None` during warmup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSet {
    pub rolling_avg: Option<f64>,
    pub dip_line: Option<f64>,
    pub gain_line: Option<f64>,
}

/// Band preprocessor: window size plus the two band multipliers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DipGainBands {
    mean: RollingMean,
    dip_threshold: f64,
    gain_threshold: f64,
}

impl DipGainBands {
    pub fn new(window: usize, dip_threshold: f64, gain_threshold: f64) -> Self {
        Self {
            mean: RollingMean::new(window),
            dip_threshold,
            gain_threshold,
        }
    }

    pub fn window(&self) -> usize {
        self.mean.period()
    }

    /// Warmup length: bars before the first defined value.
    pub fn lookback(&self) -> usize {
        self.mean.lookback()
    }

    pub fn compute(&self, bars: &[Bar]) -> Vec<IndicatorSet> {
        self.mean
            .compute(bars)
            .into_iter()
            .map(|avg| IndicatorSet {
                rolling_avg: avg,
                dip_line: avg.map(|a| a * self.dip_threshold),
                gain_line: avg.map(|a| a * self.gain_threshold),
            })
            .collect()
    }
}
