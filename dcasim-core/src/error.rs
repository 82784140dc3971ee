//! Error taxonomy for a simulation run.
//!
//! Both kinds are detected before the first bar is replayed. Once a run has
//! started it cannot fail.

use chrono::NaiveDateTime;
use thiserror::Error;

pub use crate::engine::config::ConfigError;

/// Problems with the bar series handed to the engine.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("bar series is empty")]
    Empty,

    #[error("bar {index} at {current} is earlier than the previous bar at {previous}")]
    OutOfOrder {
        index: usize,
        previous: NaiveDateTime,
        current: NaiveDateTime,
    },

    #[error("bar {index} repeats timestamp {timestamp}")]
    DuplicateTimestamp {
        index: usize,
        timestamp: NaiveDateTime,
    },

    #[error("indicator series has {indicators} entries for {bars} bars")]
    IndicatorLength { bars: usize, indicators: usize },
}

/// Any error that aborts a run before replay.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("invalid input: {0}")]
    Input(#[from] InputError),
}
