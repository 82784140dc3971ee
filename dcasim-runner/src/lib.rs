//! DCA Sim Runner: config files, data loading, reporting, and sweeps.
//!
//! This crate builds on `dcasim-core` to provide:
//! - TOML simulation configs with content-hashed run ids
//! - Bar loading from CSV, or a seeded synthetic random walk
//! - Single-run orchestration with summary metrics
//! - JSON / CSV / Markdown artifact export
//! - Parallel parameter sweeps over the trigger thresholds

pub mod config;
pub mod data_loader;
pub mod export;
pub mod metrics;
pub mod runner;
pub mod sweep;

pub use config::{ConfigError, DataSection, RunId, SimulationConfig, StrategySection};
pub use data_loader::{load_bars, load_csv, DataSource, LoadError, LoadedData};
pub use export::{format_summary, generate_report, save_artifacts};
pub use metrics::SummaryMetrics;
pub use runner::{
    run_on_bars, run_on_bars_with_cancel, run_simulation, RunError, SimulationReport,
    SCHEMA_VERSION,
};
pub use sweep::{ParamGrid, ParamSweep, SweepEntry, SweepResults};
