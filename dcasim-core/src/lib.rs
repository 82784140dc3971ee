//! DCA Sim Core: domain types, rolling indicators, and the simulation engine.
//!
//! This crate contains the whole decision procedure of the backtester:
//! - Domain types (bars, sampling intervals, calendar-week buckets)
//! - Indicator preprocessing (rolling average with dip/gain bands)
//! - Portfolio state and the per-bar buy/sell/hold step
//! - The replay loop with eager config/input validation and cancellation
//!
//! Data acquisition, reporting and plotting live outside this crate.

pub mod domain;
pub mod engine;
pub mod error;
pub mod indicators;

pub use domain::{Bar, Interval, WeekBucket};
pub use engine::{
    run, simulate, simulate_with_cancel, CancelToken, ConfigError, EventKind, PortfolioState,
    SimulationRecord, SimulationResult, StrategyConfig, TradeEvent, Trigger,
};
pub use error::{InputError, SimError};
pub use indicators::{DipGainBands, IndicatorSet};
