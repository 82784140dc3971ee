//! Rolling mean of close prices.
//!
//! Lookback: period - 1 (first defined value at index period-1).

use crate::domain::Bar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingMean {
    period: usize,
}

impl RollingMean {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "rolling mean period must be >= 1");
        Self { period }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    pub fn lookback(&self) -> usize {
        self.period.saturating_sub(1)
    }

    /// Rolling mean over the trailing `period` closes ending at each index
    /// (inclusive). `None` until `period` bars exist.
    pub fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let n = bars.len();
        let mut result = vec![None; n];

        if n < self.period {
            return result;
        }

        let mut sum: f64 = bars.iter().take(self.period).map(|b| b.close).sum();
        result[self.period - 1] = Some(sum / self.period as f64);

        for i in self.period..n {
            sum += bars[i].close - bars[i - self.period].close;
            result[i] = Some(sum / self.period as f64);
        }

        result
    }
}

/// Mean of the closes *preceding* each bar, over up to `window` bars.
///
/// The bar at index 0 has no history and takes its own close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrailingMean {
    window: usize,
}

impl TrailingMean {
    pub fn new(window: usize) -> Self {
        assert!(window >= 1, "trailing mean window must be >= 1");
        Self { window }
    }

    pub fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let mut result = Vec::with_capacity(bars.len());
        // Sum of bars[i - min(i, window) .. i]
        let mut sum = 0.0;

        for (i, bar) in bars.iter().enumerate() {
            let len = i.min(self.window);
            result.push(if len == 0 { bar.close } else { sum / len as f64 });

            sum += bar.close;
            if i >= self.window {
                sum -= bars[i - self.window].close;
            }
        }

        result
    }
}
