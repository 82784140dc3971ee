//! Per-bar records, trade events, and the run result.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::state::PortfolioState;
use crate::indicators::IndicatorSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Buy,
    Sell,
}

/// Which decision branch fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    DipBuy,
    ProfitTake,
    StopLoss,
}

impl Trigger {
    pub fn kind(self) -> EventKind {
        match self {
            Self::DipBuy => EventKind::Buy,
            Self::ProfitTake | Self::StopLoss => EventKind::Sell,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::DipBuy => "dip_buy",
            Self::ProfitTake => "profit_take",
            Self::StopLoss => "stop_loss",
        }
    }
}

/// One executed buy or sell.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TradeEvent {
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub quantity: f64,
    pub kind: EventKind,
    pub trigger: Trigger,
}

/// Output for a single bar, taken after that bar's action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub indicators: IndicatorSet,
    /// Mean of the closes preceding this bar within the window.
    pub reference_price: f64,
    pub portfolio_value: f64,
    pub invested_so_far: f64,
    /// portfolio_value - invested_so_far
    pub pnl: f64,
    pub cash_available: f64,
    pub holding_qty: f64,
    pub consecutive_buys: u32,
    pub deposited: bool,
    pub event: Option<TradeEvent>,
}

/// Result of a complete (or cancelled) simulation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// One record per processed bar, aligned with the input series.
    pub records: Vec<SimulationRecord>,
    /// All buy/sell events in bar order.
    pub events: Vec<TradeEvent>,
    pub base_qty: f64,
    pub starting_price: f64,
    pub window: usize,
    pub deposit_count: usize,
    /// True if the run stopped early; `records` then covers a prefix of the bars.
    pub cancelled: bool,
    pub final_state: PortfolioState,
}

impl SimulationResult {
    pub fn final_value(&self) -> f64 {
        self.records.last().map_or(0.0, |r| r.portfolio_value)
    }

    pub fn total_invested(&self) -> f64 {
        self.final_state.invested_so_far
    }

    pub fn profit_loss(&self) -> f64 {
        self.final_value() - self.total_invested()
    }

    pub fn portfolio_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.portfolio_value).collect()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }

    pub fn count_trigger(&self, trigger: Trigger) -> usize {
        self.events.iter().filter(|e| e.trigger == trigger).count()
    }

    pub fn buys(&self) -> impl Iterator<Item = &TradeEvent> {
        self.events.iter().filter(|e| e.kind == EventKind::Buy)
    }
}
