//! Parameter sweep over the trigger thresholds.

use rayon::prelude::*;
use std::collections::HashMap;
use tracing::{debug, info};

use dcasim_core::Bar;

use crate::config::SimulationConfig;
use crate::runner::{run_on_bars, RunError, SimulationReport};

/// Parameter grid specification.
///
/// Every combination of the three threshold lists is one configuration.
#[derive(Debug, Clone)]
pub struct ParamGrid {
    pub dip_thresholds: Vec<f64>,
    pub gain_thresholds: Vec<f64>,
    pub stop_loss_thresholds: Vec<f64>,
}

impl ParamGrid {
    /// A small grid around the reference parameters.
    pub fn around_defaults() -> Self {
        Self {
            dip_thresholds: vec![0.90, 0.95, 0.98],
            gain_thresholds: vec![1.05, 1.08, 1.15],
            stop_loss_thresholds: vec![0.85, 0.93],
        }
    }

    /// Total number of combinations, invalid ones included.
    pub fn size(&self) -> usize {
        self.dip_thresholds.len() * self.gain_thresholds.len() * self.stop_loss_thresholds.len()
    }

    /// Generates all valid configurations in the grid.
    ///
    /// Combinations the engine would reject (e.g. a gain threshold below 1)
    /// are skipped rather than reported as errors.
    pub fn generate_configs(&self, base_config: &SimulationConfig) -> Vec<SimulationConfig> {
        let mut configs = Vec::new();

        for &dip in &self.dip_thresholds {
            for &gain in &self.gain_thresholds {
                for &stop in &self.stop_loss_thresholds {
                    let mut config = base_config.clone();
                    config.strategy.dip_threshold = dip;
                    config.strategy.gain_threshold = gain;
                    config.strategy.stop_loss_threshold = stop;

                    if let Err(e) = config.to_strategy_config().validate() {
                        debug!("Skipping dip={dip} gain={gain} stop={stop}: {e}");
                        continue;
                    }
                    configs.push(config);
                }
            }
        }

        configs
    }
}

/// Parameter sweep executor over one pre-loaded series.
pub struct ParamSweep<'a> {
    bars: &'a [Bar],
    dataset_hash: String,
    has_synthetic: bool,
    parallel: bool,
}

impl<'a> ParamSweep<'a> {
    pub fn new(bars: &'a [Bar], dataset_hash: &str, has_synthetic: bool) -> Self {
        Self {
            bars,
            dataset_hash: dataset_hash.to_string(),
            has_synthetic,
            parallel: true,
        }
    }

    /// Enables or disables parallel execution.
    pub fn with_parallelism(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Runs every valid configuration in `grid`.
    pub fn sweep(
        &self,
        grid: &ParamGrid,
        base_config: &SimulationConfig,
    ) -> Result<SweepResults, RunError> {
        let configs = grid.generate_configs(base_config);
        info!(
            "Sweeping {} of {} combinations over {} bars",
            configs.len(),
            grid.size(),
            self.bars.len()
        );

        let run = |config: &SimulationConfig| {
            run_on_bars(config, self.bars, &self.dataset_hash, self.has_synthetic)
        };
        let reports: Vec<SimulationReport> = if self.parallel {
            configs.par_iter().map(run).collect::<Result<Vec<_>, _>>()?
        } else {
            configs.iter().map(run).collect::<Result<Vec<_>, _>>()?
        };

        Ok(SweepResults::new(reports))
    }
}

/// Compact view of one sweep run, for ranking tables.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepEntry {
    pub run_id: String,
    pub dip_threshold: f64,
    pub gain_threshold: f64,
    pub stop_loss_threshold: f64,
    pub final_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub buy_count: usize,
    pub sell_count: usize,
}

impl From<&SimulationReport> for SweepEntry {
    fn from(r: &SimulationReport) -> Self {
        let s = &r.config.strategy;
        Self {
            run_id: r.run_id.clone(),
            dip_threshold: s.dip_threshold,
            gain_threshold: s.gain_threshold,
            stop_loss_threshold: s.stop_loss_threshold,
            final_value: r.metrics.final_value,
            profit_loss: r.metrics.profit_loss,
            profit_loss_pct: r.metrics.profit_loss_pct,
            buy_count: r.metrics.buy_count,
            sell_count: r.metrics.sell_count,
        }
    }
}

/// Results from a parameter sweep.
#[derive(Debug)]
pub struct SweepResults {
    reports: Vec<SimulationReport>,
    by_run_id: HashMap<String, usize>,
}

impl SweepResults {
    fn new(reports: Vec<SimulationReport>) -> Self {
        let by_run_id = reports
            .iter()
            .enumerate()
            .map(|(i, r)| (r.run_id.clone(), i))
            .collect();
        Self { reports, by_run_id }
    }

    pub fn all(&self) -> &[SimulationReport] {
        &self.reports
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    pub fn get(&self, run_id: &str) -> Option<&SimulationReport> {
        self.by_run_id.get(run_id).map(|&i| &self.reports[i])
    }

    /// Reports sorted by profit/loss, best first.
    pub fn sorted_by_profit(&self) -> Vec<&SimulationReport> {
        let mut sorted: Vec<_> = self.reports.iter().collect();
        sorted.sort_by(|a, b| {
            b.metrics
                .profit_loss
                .partial_cmp(&a.metrics.profit_loss)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        sorted
    }

    /// The top `n` runs as ranking entries.
    pub fn top_n(&self, n: usize) -> Vec<SweepEntry> {
        self.sorted_by_profit()
            .into_iter()
            .take(n)
            .map(SweepEntry::from)
            .collect()
    }

    pub fn best(&self) -> Option<&SimulationReport> {
        self.sorted_by_profit().into_iter().next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::data_loader::{compute_dataset_hash, generate_synthetic_bars};

    fn base_config() -> SimulationConfig {
        let mut config = SimulationConfig::default_for("SWEEP");
        config.data.synthetic = true;
        config
    }

    fn bars() -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2022, 1, 3).unwrap();
        generate_synthetic_bars("SWEEP", &base_config().data.interval, start, 150).unwrap()
    }

    #[test]
    fn grid_size() {
        let grid = ParamGrid {
            dip_thresholds: vec![0.9, 0.95],
            gain_thresholds: vec![1.05, 1.1],
            stop_loss_thresholds: vec![0.9],
        };
        // 2 dip × 2 gain × 1 stop
        assert_eq!(grid.size(), 4);
        assert_eq!(ParamGrid::around_defaults().size(), 18);
    }

    #[test]
    fn grid_skips_invalid_combinations() {
        let grid = ParamGrid {
            dip_thresholds: vec![0.9, 1.2],
            gain_thresholds: vec![0.8, 1.1],
            stop_loss_thresholds: vec![0.9, 0.0],
        };
        let configs = grid.generate_configs(&base_config());
        // Only (0.9, 1.1, 0.9) survives
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].strategy.dip_threshold, 0.9);
        assert_eq!(configs[0].strategy.gain_threshold, 1.1);
        assert_eq!(configs[0].strategy.stop_loss_threshold, 0.9);
    }

    #[test]
    fn sequential_and_parallel_agree() {
        let bars = bars();
        let hash = compute_dataset_hash(&bars);
        let grid = ParamGrid::around_defaults();
        let base = base_config();

        let seq = ParamSweep::new(&bars, &hash, true)
            .with_parallelism(false)
            .sweep(&grid, &base)
            .unwrap();
        let par = ParamSweep::new(&bars, &hash, true).sweep(&grid, &base).unwrap();

        assert_eq!(seq.len(), 18);
        assert_eq!(par.len(), 18);
        for report in seq.all() {
            let other = par.get(&report.run_id).unwrap();
            assert_eq!(report.metrics, other.metrics);
        }
    }

    #[test]
    fn results_sorted_by_profit() {
        let bars = bars();
        let hash = compute_dataset_hash(&bars);
        let results = ParamSweep::new(&bars, &hash, true)
            .sweep(&ParamGrid::around_defaults(), &base_config())
            .unwrap();

        let sorted = results.sorted_by_profit();
        for pair in sorted.windows(2) {
            assert!(pair[0].metrics.profit_loss >= pair[1].metrics.profit_loss);
        }
        let top = results.top_n(3);
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].run_id, results.best().unwrap().run_id);
    }

    #[test]
    fn empty_grid_yields_no_results() {
        let bars = bars();
        let grid = ParamGrid {
            dip_thresholds: vec![],
            gain_thresholds: vec![1.1],
            stop_loss_thresholds: vec![0.9],
        };
        let results = ParamSweep::new(&bars, "", false).sweep(&grid, &base_config()).unwrap();
        assert!(results.is_empty());
        assert!(results.best().is_none());
    }
}
