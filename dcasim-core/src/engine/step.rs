//! The per-bar decision step.
//!
//! Each bar runs five phases in a fixed order:
//! 1. Calendar rollover: deposit on a new ISO week
//! 2. Reference price: mean of the preceding window (supplied by the caller)
//! 3. Average buy price of the open tranche
//! 4. Decision: dip buy, profit take, stop loss, or hold (first match wins)
//! 5. Valuation: mark-to-market at the bar's close

use super::config::StrategyConfig;
use super::result::{SimulationRecord, TradeEvent, Trigger};
use super::state::PortfolioState;
use crate::domain::Bar;
use crate::indicators::IndicatorSet;

/// Share of available cash spent by one dip buy.
pub const BUY_CASH_FRACTION: f64 = 0.5;

/// Everything the step needs to know about the current bar.
#[derive(Debug, Clone, Copy)]
pub struct BarContext<'a> {
    pub bar: &'a Bar,
    pub reference_price: f64,
    pub indicators: IndicatorSet,
}

/// Pick the branch that fires for this bar, if any.
///
/// Reads the state after the calendar rollover has been applied.
pub fn decide(state: &PortfolioState, config: &StrategyConfig, ctx: &BarContext) -> Option<Trigger> {
    let price = ctx.bar.close;
    let avg_buy = state.avg_buy_price();

    let dip = price <= ctx.reference_price * config.dip_threshold;
    if dip
        && state.cash_available > 0.0
        && state.consecutive_buys < config.max_consecutive_buys
        && state.cooldown_elapsed(ctx.bar.timestamp, config.buy_cooldown())
    {
        return Some(Trigger::DipBuy);
    }

    if !state.has_tranche() {
        return None;
    }
    if price >= avg_buy * config.gain_threshold {
        Some(Trigger::ProfitTake)
    } else if price <= avg_buy * config.stop_loss_threshold {
        Some(Trigger::StopLoss)
    } else {
        None
    }
}

/// Advance `state` by one bar and return the bar's record.
pub fn step(state: &mut PortfolioState, config: &StrategyConfig, ctx: &BarContext) -> SimulationRecord {
    let bar = ctx.bar;
    let deposited = state.roll_bucket(bar.timestamp, config.weekly_deposit);

    let event = decide(state, config, ctx).map(|trigger| {
        let quantity = match trigger {
            Trigger::DipBuy => state.buy(bar.close, bar.timestamp, BUY_CASH_FRACTION),
            Trigger::ProfitTake | Trigger::StopLoss => state.liquidate_tranche(bar.close),
        };
        TradeEvent {
            timestamp: bar.timestamp,
            price: bar.close,
            quantity,
            kind: trigger.kind(),
            trigger,
        }
    });

    let portfolio_value = state.value_at(bar.close);
    SimulationRecord {
        timestamp: bar.timestamp,
        close: bar.close,
        indicators: ctx.indicators,
        reference_price: ctx.reference_price,
        portfolio_value,
        invested_so_far: state.invested_so_far,
        pnl: portfolio_value - state.invested_so_far,
        cash_available: state.cash_available,
        holding_qty: state.holding_qty,
        consecutive_buys: state.consecutive_buys,
        deposited,
        event,
    }
}
