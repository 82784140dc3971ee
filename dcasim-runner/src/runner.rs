//! Simulation runner: wires together config, data loading, engine, and metrics.
//!
//! Two entry points:
//! - `run_simulation()`: loads bars as the config describes, then runs. Used by the CLI.
//! - `run_on_bars()`: takes pre-loaded bars, no I/O. Used by the sweep.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use dcasim_core::{Bar, CancelToken, Interval, SimError, SimulationResult};

use crate::config::{ConfigError, RunId, SimulationConfig};
use crate::data_loader::{load_bars, LoadError};
use crate::metrics::SummaryMetrics;

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimError),
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub symbol: String,
    pub interval: Interval,
    pub window: usize,
    pub start: String,
    pub end: String,
    pub dataset_hash: String,
    pub has_synthetic: bool,
    pub config: SimulationConfig,
    pub metrics: SummaryMetrics,
    pub result: SimulationResult,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Load bars for `config` and run the simulation.
pub fn run_simulation(config: &SimulationConfig) -> Result<SimulationReport, RunError> {
    config.validate()?;
    let loaded = load_bars(&config.data)?;
    run_on_bars(config, &loaded.bars, &loaded.dataset_hash, loaded.has_synthetic)
}

/// Run with pre-loaded bars.
pub fn run_on_bars(
    config: &SimulationConfig,
    bars: &[Bar],
    dataset_hash: &str,
    has_synthetic: bool,
) -> Result<SimulationReport, RunError> {
    run_on_bars_with_cancel(config, bars, dataset_hash, has_synthetic, &CancelToken::new())
}

/// Run with pre-loaded bars, stopping early if `cancel` is set.
pub fn run_on_bars_with_cancel(
    config: &SimulationConfig,
    bars: &[Bar],
    dataset_hash: &str,
    has_synthetic: bool,
    cancel: &CancelToken,
) -> Result<SimulationReport, RunError> {
    let strategy = config.to_strategy_config();
    strategy.validate().map_err(ConfigError::from)?;
    if strategy.uses_fallback_window() {
        warn!(
            "Unknown interval '{}', falling back to a {}-bar window",
            strategy.interval,
            strategy.window_size()
        );
    }

    let indicators = strategy.bands().compute(bars);
    let result = dcasim_core::simulate_with_cancel(bars, &indicators, &strategy, cancel)?;
    let metrics = SummaryMetrics::compute(&result);

    info!(
        "{}: final value ${:.2}, P/L ${:.2} ({} buys, {} sells)",
        config.data.symbol,
        metrics.final_value,
        metrics.profit_loss,
        metrics.buy_count,
        metrics.sell_count
    );

    let start = result
        .records
        .first()
        .map(|r| r.timestamp.to_string())
        .unwrap_or_default();
    let end = result
        .records
        .last()
        .map(|r| r.timestamp.to_string())
        .unwrap_or_default();

    Ok(SimulationReport {
        schema_version: SCHEMA_VERSION,
        run_id: config.run_id(),
        symbol: config.data.symbol.clone(),
        interval: strategy.interval.clone(),
        window: result.window,
        start,
        end,
        dataset_hash: dataset_hash.to_string(),
        has_synthetic,
        config: config.clone(),
        metrics,
        result,
    })
}
