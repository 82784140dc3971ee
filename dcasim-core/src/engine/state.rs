//! Portfolio state threaded through a simulation run.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::{Bar, WeekBucket};

/// Mutable accumulator for one run.
///
/// Holdings are split into a permanent base position, bought with the initial
/// investment at the first close, and an extra tranche above it built by dip
/// buys. Only the tranche is ever sold, so `holding_qty >= base_qty` always.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioState {
    pub base_qty: f64,
    pub holding_qty: f64,
    pub cash_available: f64,
    /// Prices paid for the current tranche, in buy order.
    pub buy_prices: Vec<f64>,
    pub consecutive_buys: u32,
    pub last_buy_timestamp: Option<NaiveDateTime>,
    /// Capital contributed so far: initial investment plus deposits.
    pub invested_so_far: f64,
    /// Week of the most recently processed bar.
    pub current_bucket: WeekBucket,
    pub starting_price: f64,
    pub deposit_count: usize,
}

impl PortfolioState {
    /// Open the base position at the first bar's close.
    pub fn open(first: &Bar, initial_investment: f64) -> Self {
        let base_qty = initial_investment / first.close;
        Self {
            base_qty,
            holding_qty: base_qty,
            cash_available: 0.0,
            buy_prices: Vec::new(),
            consecutive_buys: 0,
            last_buy_timestamp: None,
            invested_so_far: initial_investment,
            current_bucket: WeekBucket::of(first.timestamp),
            starting_price: first.close,
            deposit_count: 0,
        }
    }

    /// Units held above the base position.
    pub fn extra_qty(&self) -> f64 {
        self.holding_qty - self.base_qty
    }

    pub fn has_tranche(&self) -> bool {
        self.holding_qty > self.base_qty
    }

    /// Mean tranche entry price, or the starting price with no open tranche.
    pub fn avg_buy_price(&self) -> f64 {
        if self.buy_prices.is_empty() {
            self.starting_price
        } else {
            self.buy_prices.iter().sum::<f64>() / self.buy_prices.len() as f64
        }
    }

    /// Mark-to-market value: cash plus holdings at `price`.
    pub fn value_at(&self, price: f64) -> f64 {
        self.cash_available + self.holding_qty * price
    }

    /// Track the week of `timestamp`; deposit once if it differs from the last.
    ///
    /// Returns true when a deposit was applied.
    pub fn roll_bucket(&mut self, timestamp: NaiveDateTime, weekly_deposit: f64) -> bool {
        let bucket = WeekBucket::of(timestamp);
        if bucket == self.current_bucket {
            return false;
        }
        self.invested_so_far += weekly_deposit;
        self.cash_available += weekly_deposit;
        self.current_bucket = bucket;
        self.deposit_count += 1;
        true
    }

    /// True if a buy at `timestamp` respects the cooldown.
    pub fn cooldown_elapsed(&self, timestamp: NaiveDateTime, cooldown: Duration) -> bool {
        match self.last_buy_timestamp {
            None => true,
            Some(last) => timestamp - last >= cooldown,
        }
    }

    /// Spend `fraction` of available cash at `price`. Returns units bought.
    pub fn buy(&mut self, price: f64, timestamp: NaiveDateTime, fraction: f64) -> f64 {
        let spend = self.cash_available * fraction;
        let qty = spend / price;
        self.holding_qty += qty;
        self.cash_available -= spend;
        self.buy_prices.push(price);
        self.consecutive_buys += 1;
        self.last_buy_timestamp = Some(timestamp);
        qty
    }

    /// Sell the whole tranche at `price`. Returns units sold.
    pub fn liquidate_tranche(&mut self, price: f64) -> f64 {
        let qty = self.extra_qty();
        self.cash_available += qty * price;
        self.holding_qty = self.base_qty;
        self.buy_prices.clear();
        self.consecutive_buys = 0;
        qty
    }
}
