//! Reporting and export: JSON, CSV, Markdown and plain-text artifacts.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: per-bar series and the trade event log
//! - **Markdown**: a human-readable single-run report
//! - **Text**: the short summary printed after a run
//!
//! Persisted reports carry a `schema_version`. Newer versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use dcasim_core::{EventKind, SimulationRecord, TradeEvent};

use crate::metrics::SummaryMetrics;
use crate::runner::{SimulationReport, SCHEMA_VERSION};

/// Length of the run-id prefix used in artifact directory names.
const RUN_ID_PREFIX: usize = 12;

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(report: &SimulationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize SimulationReport to JSON")
}

/// Deserialize a `SimulationReport`, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<SimulationReport> {
    let report: SimulationReport =
        serde_json::from_str(json).context("failed to deserialize SimulationReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Per-bar series.
///
/// Columns: timestamp, close, rolling_avg, dip_line, gain_line,
/// portfolio_value, invested_so_far, pnl. Warm-up bars leave the band
/// columns empty.
pub fn export_series_csv(records: &[SimulationRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "timestamp",
        "close",
        "rolling_avg",
        "dip_line",
        "gain_line",
        "portfolio_value",
        "invested_so_far",
        "pnl",
    ])?;

    let opt = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
    for r in records {
        wtr.write_record([
            &r.timestamp.to_string(),
            &format!("{:.6}", r.close),
            &opt(r.indicators.rolling_avg),
            &opt(r.indicators.dip_line),
            &opt(r.indicators.gain_line),
            &format!("{:.2}", r.portfolio_value),
            &format!("{:.2}", r.invested_so_far),
            &format!("{:.2}", r.pnl),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Trade event log. Columns: timestamp, kind, trigger, price, quantity.
pub fn export_events_csv(events: &[TradeEvent]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["timestamp", "kind", "trigger", "price", "quantity"])?;
    for e in events {
        let kind = match e.kind {
            EventKind::Buy => "buy",
            EventKind::Sell => "sell",
        };
        wtr.write_record([
            e.timestamp.to_string(),
            kind.to_string(),
            e.trigger.as_str().to_string(),
            format!("{:.6}", e.price),
            format!("{:.6}", e.quantity),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Text and Markdown ──────────────────────────────────────────────

/// The short run summary, one metric per line.
pub fn format_summary(m: &SummaryMetrics) -> String {
    format!(
        "Market Return: {:.2}%\n\
         Total Invested: ${:.2}\n\
         Final Value: ${:.2}\n\
         Profit/Loss: ${:.2} ({:.2}%)\n\
         Total Buys: {}\n\
         Total Sells: {}",
        m.market_return_pct,
        m.total_invested,
        m.final_value,
        m.profit_loss,
        m.profit_loss_pct,
        m.buy_count,
        m.sell_count
    )
}

/// Markdown report for a single run.
pub fn generate_report(report: &SimulationReport) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# DCA Simulation Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Symbol | {} |\n", report.symbol));
    md.push_str(&format!("| Period | {} to {} |\n", report.start, report.end));
    md.push_str(&format!(
        "| Interval | {} (window {}) |\n",
        report.interval, report.window
    ));
    md.push_str(&format!("| Bars | {} |\n", report.metrics.bar_count));
    md.push_str(&format!("| Run ID | {} |\n", report.run_id));
    md.push_str(&format!("| Dataset Hash | {} |\n", report.dataset_hash));
    if report.has_synthetic {
        md.push_str("| Data | **SYNTHETIC** |\n");
    }
    if report.result.cancelled {
        md.push_str("| Status | **CANCELLED** (partial series) |\n");
    }
    md.push('\n');

    let s = &report.config.strategy;
    md.push_str("## Strategy\n\n");
    md.push_str("| Parameter | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Initial Investment | ${:.2} |\n", s.initial_investment));
    md.push_str(&format!("| Weekly Deposit | ${:.2} |\n", s.weekly_deposit));
    md.push_str(&format!("| Dip Threshold | {:.4} |\n", s.dip_threshold));
    md.push_str(&format!("| Gain Threshold | {:.4} |\n", s.gain_threshold));
    md.push_str(&format!("| Stop Loss Threshold | {:.4} |\n", s.stop_loss_threshold));
    md.push_str(&format!("| Buy Cooldown | {}s |\n", s.buy_cooldown_secs));
    md.push_str(&format!("| Max Consecutive Buys | {} |\n", s.max_consecutive_buys));
    md.push('\n');

    let m = &report.metrics;
    md.push_str("## Performance Summary\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Market Return | {:.2}% |\n", m.market_return_pct));
    md.push_str(&format!("| Total Invested | ${:.2} |\n", m.total_invested));
    md.push_str(&format!("| Final Value | ${:.2} |\n", m.final_value));
    md.push_str(&format!(
        "| Profit/Loss | ${:.2} ({:.2}%) |\n",
        m.profit_loss, m.profit_loss_pct
    ));
    md.push_str(&format!("| Max Drawdown | {:.2}% |\n", m.max_drawdown * 100.0));
    md.push_str(&format!("| Weekly Deposits | {} |\n", m.deposit_count));
    md.push_str(&format!("| Buys | {} |\n", m.buy_count));
    md.push_str(&format!(
        "| Sells | {} ({} profit-take, {} stop-loss) |\n",
        m.sell_count, m.profit_take_count, m.stop_loss_count
    ));
    md.push('\n');

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for a single run.
///
/// Creates `{symbol}_{run_id prefix}/` under `output_dir` containing
/// `report.json`, `series.csv`, `events.csv` and `report.md`. Returns the
/// path to the created directory.
pub fn save_artifacts(report: &SimulationReport, output_dir: &Path) -> Result<PathBuf> {
    let prefix: String = report.run_id.chars().take(RUN_ID_PREFIX).collect();
    let name = format!("{}_{}", dir_safe_symbol(&report.symbol), prefix);
    let run_dir = output_dir.join(name);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("report.json"), export_json(report)?)?;
    std::fs::write(
        run_dir.join("series.csv"),
        export_series_csv(&report.result.records)?,
    )?;
    std::fs::write(
        run_dir.join("events.csv"),
        export_events_csv(&report.result.events)?,
    )?;
    std::fs::write(run_dir.join("report.md"), generate_report(report))?;

    Ok(run_dir)
}

/// Symbol reduced to a single path component that stays inside the output
/// directory. Ticker punctuation (`.`, `^`, `=`, `-`) survives.
fn dir_safe_symbol(symbol: &str) -> String {
    let mapped: String = symbol
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = mapped.trim_start_matches('.');
    if trimmed.is_empty() {
        "run".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Load a report from an artifact directory's `report.json`.
pub fn load_artifacts(dir: &Path) -> Result<SimulationReport> {
    let path = dir.join("report.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}
