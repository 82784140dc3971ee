//! Summary metrics for a finished simulation.
//!
//! Plain functions over the result series; no I/O.

use dcasim_core::{EventKind, SimulationResult, Trigger};
use serde::{Deserialize, Serialize};

/// Headline numbers for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryMetrics {
    /// Buy-and-hold return of the asset, in percent.
    pub market_return_pct: f64,
    pub total_invested: f64,
    pub final_value: f64,
    pub profit_loss: f64,
    pub profit_loss_pct: f64,
    pub buy_count: usize,
    pub sell_count: usize,
    pub profit_take_count: usize,
    pub stop_loss_count: usize,
    pub deposit_count: usize,
    /// Largest peak-to-trough fall of portfolio value, as a fraction (<= 0).
    pub max_drawdown: f64,
    pub bar_count: usize,
}

impl SummaryMetrics {
    pub fn compute(result: &SimulationResult) -> Self {
        let closes: Vec<f64> = result.records.iter().map(|r| r.close).collect();
        let total_invested = result.total_invested();
        let profit_loss = result.profit_loss();
        Self {
            market_return_pct: market_return_pct(&closes),
            total_invested,
            final_value: result.final_value(),
            profit_loss,
            profit_loss_pct: pct_of(profit_loss, total_invested),
            buy_count: result.count(EventKind::Buy),
            sell_count: result.count(EventKind::Sell),
            profit_take_count: result.count_trigger(Trigger::ProfitTake),
            stop_loss_count: result.count_trigger(Trigger::StopLoss),
            deposit_count: result.deposit_count,
            max_drawdown: max_drawdown(&result.portfolio_values()),
            bar_count: result.records.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Last close versus first close, in percent.
pub fn market_return_pct(closes: &[f64]) -> f64 {
    match (closes.first(), closes.last()) {
        (Some(&first), Some(&last)) if first > 0.0 => (last - first) / first * 100.0,
        _ => 0.0,
    }
}

/// Maximum drawdown as a negative fraction of the running peak.
pub fn max_drawdown(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mut peak = values[0];
    let mut max_dd = 0.0_f64;

    for &v in values {
        if v > peak {
            peak = v;
        }
        if peak > 0.0 {
            let dd = (v - peak) / peak;
            if dd < max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

fn pct_of(amount: f64, base: f64) -> f64 {
    if base.abs() < f64::EPSILON {
        return 0.0;
    }
    amount / base * 100.0
}
