//! DCA Sim CLI: run, sweep and validate commands.
//!
//! Commands:
//! - `run`: simulate one strategy from a TOML config, or from a CSV plus flags
//! - `sweep`: grid-search the dip/gain/stop-loss thresholds on one series
//! - `validate`: parse and validate a config file without running it

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dcasim_core::Interval;
use dcasim_runner::export::format_summary;
use dcasim_runner::{
    load_bars, run_on_bars, save_artifacts, ParamGrid, ParamSweep, SimulationConfig,
    SimulationReport,
};

#[derive(Parser)]
#[command(
    name = "dcasim",
    about = "DCA Sim: dollar-cost-averaging strategy backtester"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate one strategy over a price series.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// CSV file with a timestamp column and a close column.
        #[arg(long)]
        data: Option<PathBuf>,

        /// Symbol label for reports. Defaults to SPY.
        #[arg(long)]
        symbol: Option<String>,

        /// Sampling interval (1m, 15m, 1h, 90m, 4h, 1d).
        #[arg(long)]
        interval: Option<String>,

        /// Start date filter (YYYY-MM-DD).
        #[arg(long)]
        start: Option<String>,

        /// End date filter (YYYY-MM-DD).
        #[arg(long)]
        end: Option<String>,

        /// Use a seeded synthetic random walk instead of a CSV file.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        #[command(flatten)]
        strategy: StrategyArgs,

        /// Output directory for result artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,

        /// Print the summary only; write no files.
        #[arg(long, default_value_t = false)]
        no_artifacts: bool,
    },
    /// Grid-search the trigger thresholds.
    Sweep {
        /// Path to a TOML config file (supplies data and the other parameters).
        #[arg(long)]
        config: PathBuf,

        /// Dip thresholds to try, comma separated.
        #[arg(long, value_delimiter = ',')]
        dip: Vec<f64>,

        /// Gain thresholds to try, comma separated.
        #[arg(long, value_delimiter = ',')]
        gain: Vec<f64>,

        /// Stop-loss thresholds to try, comma separated.
        #[arg(long, value_delimiter = ',')]
        stop: Vec<f64>,

        /// How many of the best runs to print.
        #[arg(long, default_value_t = 10)]
        top: usize,

        /// Run the grid on one thread.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// Parse and validate a config file.
    Validate {
        #[arg(long)]
        config: PathBuf,
    },
}

/// Strategy overrides, applied on top of the config file or the defaults.
#[derive(clap::Args)]
struct StrategyArgs {
    #[arg(long)]
    initial_investment: Option<f64>,
    #[arg(long)]
    weekly_deposit: Option<f64>,
    #[arg(long)]
    dip_threshold: Option<f64>,
    #[arg(long)]
    gain_threshold: Option<f64>,
    #[arg(long)]
    stop_loss_threshold: Option<f64>,
    #[arg(long)]
    buy_cooldown_secs: Option<i64>,
    #[arg(long)]
    max_consecutive_buys: Option<u32>,
    /// Override the interval's rolling window size.
    #[arg(long)]
    window: Option<usize>,
}

impl StrategyArgs {
    fn apply(&self, config: &mut SimulationConfig) {
        let s = &mut config.strategy;
        if let Some(v) = self.initial_investment {
            s.initial_investment = v;
        }
        if let Some(v) = self.weekly_deposit {
            s.weekly_deposit = v;
        }
        if let Some(v) = self.dip_threshold {
            s.dip_threshold = v;
        }
        if let Some(v) = self.gain_threshold {
            s.gain_threshold = v;
        }
        if let Some(v) = self.stop_loss_threshold {
            s.stop_loss_threshold = v;
        }
        if let Some(v) = self.buy_cooldown_secs {
            s.buy_cooldown_secs = v;
        }
        if let Some(v) = self.max_consecutive_buys {
            s.max_consecutive_buys = v;
        }
        if self.window.is_some() {
            s.window = self.window;
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        Commands::Run {
            config,
            data,
            symbol,
            interval,
            start,
            end,
            synthetic,
            strategy,
            output_dir,
            no_artifacts,
        } => {
            let sim_config = build_run_config(
                config, data, symbol, interval, start, end, synthetic, &strategy,
            )?;
            run_cmd(&sim_config, (!no_artifacts).then_some(output_dir))
        }
        Commands::Sweep {
            config,
            dip,
            gain,
            stop,
            top,
            sequential,
        } => sweep_cmd(&config, dip, gain, stop, top, sequential),
        Commands::Validate { config } => validate_cmd(&config),
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")
}

fn parse_date(flag: &str, s: Option<String>) -> Result<Option<NaiveDate>> {
    s.as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .with_context(|| format!("--{flag} must be YYYY-MM-DD"))
}

#[allow(clippy::too_many_arguments)]
fn build_run_config(
    config_path: Option<PathBuf>,
    data: Option<PathBuf>,
    symbol: Option<String>,
    interval: Option<String>,
    start: Option<String>,
    end: Option<String>,
    synthetic: bool,
    strategy: &StrategyArgs,
) -> Result<SimulationConfig> {
    if config_path.is_some() && data.is_some() {
        bail!("--config and --data are mutually exclusive");
    }

    let mut config = match config_path {
        Some(path) => SimulationConfig::from_file(&path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => {
            if data.is_none() && !synthetic {
                bail!("one of --config, --data or --synthetic is required");
            }
            SimulationConfig::default_for(symbol.as_deref().unwrap_or("SPY"))
        }
    };

    if let Some(symbol) = symbol {
        config.data.symbol = symbol;
    }
    if data.is_some() {
        config.data.path = data;
    }
    if let Some(interval) = interval {
        config.data.interval = Interval::parse(&interval);
    }
    if let Some(d) = parse_date("start", start)? {
        config.data.start = Some(d);
    }
    if let Some(d) = parse_date("end", end)? {
        config.data.end = Some(d);
    }
    if synthetic {
        config.data.synthetic = true;
    }
    strategy.apply(&mut config);

    config.validate().context("invalid run configuration")?;
    Ok(config)
}

fn run_cmd(config: &SimulationConfig, output_dir: Option<PathBuf>) -> Result<()> {
    let loaded = load_bars(&config.data)
        .with_context(|| format!("loading bars for {}", config.data.symbol))?;
    let report = run_on_bars(config, &loaded.bars, &loaded.dataset_hash, loaded.has_synthetic)?;

    print_summary(&report);

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&report, &dir)?;
        println!("Artifacts saved to: {}", run_dir.display());
    }
    Ok(())
}

fn sweep_cmd(
    config_path: &Path,
    dip: Vec<f64>,
    gain: Vec<f64>,
    stop: Vec<f64>,
    top: usize,
    sequential: bool,
) -> Result<()> {
    let config = SimulationConfig::from_file(config_path)
        .with_context(|| format!("loading config {}", config_path.display()))?;

    // Unspecified axes sweep the defaults
    let defaults = ParamGrid::around_defaults();
    let or_default = |v: Vec<f64>, d: Vec<f64>| if v.is_empty() { d } else { v };
    let grid = ParamGrid {
        dip_thresholds: or_default(dip, defaults.dip_thresholds),
        gain_thresholds: or_default(gain, defaults.gain_thresholds),
        stop_loss_thresholds: or_default(stop, defaults.stop_loss_thresholds),
    };

    let loaded = load_bars(&config.data)
        .with_context(|| format!("loading bars for {}", config.data.symbol))?;
    let results = ParamSweep::new(&loaded.bars, &loaded.dataset_hash, loaded.has_synthetic)
        .with_parallelism(!sequential)
        .sweep(&grid, &config)?;

    if results.is_empty() {
        bail!("no valid parameter combinations in the grid");
    }
    info!("Sweep finished: {} runs", results.len());

    println!();
    println!(
        "=== Sweep: {} ({} of {} combinations) ===",
        config.data.symbol,
        results.len(),
        grid.size()
    );
    println!(
        "{:<4} {:>6} {:>6} {:>6} {:>12} {:>12} {:>9} {:>5} {:>5}",
        "#", "Dip", "Gain", "Stop", "Final", "P/L", "P/L %", "Buys", "Sells"
    );
    println!("{}", "-".repeat(75));
    for (i, e) in results.top_n(top).iter().enumerate() {
        println!(
            "{:<4} {:>6.3} {:>6.3} {:>6.3} {:>12.2} {:>12.2} {:>8.2}% {:>5} {:>5}",
            i + 1,
            e.dip_threshold,
            e.gain_threshold,
            e.stop_loss_threshold,
            e.final_value,
            e.profit_loss,
            e.profit_loss_pct,
            e.buy_count,
            e.sell_count
        );
    }
    if loaded.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
    Ok(())
}

fn validate_cmd(config_path: &Path) -> Result<()> {
    let config = SimulationConfig::from_file(config_path)
        .with_context(|| format!("validating {}", config_path.display()))?;
    let strategy = config.to_strategy_config();
    println!("Config OK: {}", config_path.display());
    println!("Symbol:   {}", config.data.symbol);
    println!(
        "Interval: {} (window {})",
        config.data.interval,
        strategy.window_size()
    );
    println!("Run ID:   {}", config.run_id());
    if strategy.uses_fallback_window() {
        println!("NOTE: unknown interval, window falls back to the default");
    }
    Ok(())
}

fn print_summary(report: &SimulationReport) {
    println!();
    println!("=== DCA Simulation ===");
    println!("Symbol:         {}", report.symbol);
    println!("Period:         {} to {}", report.start, report.end);
    println!(
        "Bars:           {} (window {})",
        report.metrics.bar_count, report.window
    );
    println!("Run ID:         {}", report.run_id);
    println!();
    println!("{}", format_summary(&report.metrics));
    println!(
        "Max Drawdown: {:.2}%",
        report.metrics.max_drawdown * 100.0
    );
    if report.has_synthetic {
        println!();
        println!("WARNING: Results based on SYNTHETIC data");
    }
}
