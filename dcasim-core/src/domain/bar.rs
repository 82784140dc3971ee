//! Bar: the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// One sampled close observation.
///
/// Bars are produced by the input collaborator (CSV loader, synthetic
/// generator) and never mutated afterwards. The engine only reads `close`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub close: f64,
}

impl Bar {
    pub fn new(timestamp: NaiveDateTime, close: f64) -> Self {
        Self { timestamp, close }
    }

    /// Basic sanity check: the close is a finite, strictly positive price.
    ///
    /// The engine does not call this; loaders use it to reject bad rows.
    pub fn is_sane(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Check that a bar series is non-empty and strictly increasing in time.
///
/// Equal timestamps are rejected as duplicates; gaps of any size are fine.
pub fn check_series(bars: &[Bar]) -> Result<(), InputError> {
    if bars.is_empty() {
        return Err(InputError::Empty);
    }
    for (i, pair) in bars.windows(2).enumerate() {
        let (prev, cur) = (pair[0].timestamp, pair[1].timestamp);
        if cur == prev {
            return Err(InputError::DuplicateTimestamp {
                index: i + 1,
                timestamp: cur,
            });
        }
        if cur < prev {
            return Err(InputError::OutOfOrder {
                index: i + 1,
                previous: prev,
                current: cur,
            });
        }
    }
    Ok(())
}
