//! Integration tests for the simulation replay.
//!
//! Tests:
//! 1. Flat series: no trades, constant value
//! 2. Dip buy: one buy, cash halved, holdings up
//! 3. Profit take and stop loss: tranche liquidated back to base
//! 4. Weekly deposits: one step per ISO-week change
//! 5. Cooldown and consecutive-buy cap on an hourly series
//! 6. Out-of-range cooldown rejected before the replay

use chrono::{Duration, NaiveDate, NaiveDateTime};
use dcasim_core::{run, ConfigError, EventKind, Interval, SimError, StrategyConfig, Trigger};
use dcasim_core::Bar;

fn start() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

fn bars_from(start: NaiveDateTime, step: Duration, closes: &[f64]) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar::new(start + step * i as i32, c))
        .collect()
}

fn daily(closes: &[f64]) -> Vec<Bar> {
    bars_from(start(), Duration::days(1), closes)
}

fn approx(a: f64, b: f64) {
    assert!((a - b).abs() < 1e-9, "expected {b}, got {a}");
}

/// Seven flat days (deposit lands on Monday 2024-01-08, index 6) then `tail`.
fn after_first_deposit(tail: &[f64]) -> Vec<Bar> {
    let mut closes = vec![100.0; 7];
    closes.extend_from_slice(tail);
    daily(&closes)
}

fn config(weekly_deposit: f64) -> StrategyConfig {
    StrategyConfig {
        initial_investment: 1000.0,
        weekly_deposit,
        ..StrategyConfig::default()
    }
}

#[test]
fn constant_price_never_trades() {
    let bars = daily(&[100.0; 10]);
    let result = run(&bars, &config(0.0)).unwrap();

    assert!(result.events.is_empty());
    assert_eq!(result.records.len(), 10);
    for r in &result.records {
        approx(r.portfolio_value, 1000.0);
        approx(r.invested_so_far, 1000.0);
        approx(r.pnl, 0.0);
        assert!(r.event.is_none());
    }
}

#[test]
fn sharp_dip_buys_once() {
    let bars = after_first_deposit(&[50.0]);
    let result = run(&bars, &config(100.0)).unwrap();

    assert_eq!(result.events.len(), 1);
    let buy = result.events[0];
    assert_eq!(buy.kind, EventKind::Buy);
    assert_eq!(buy.trigger, Trigger::DipBuy);
    assert_eq!(buy.timestamp, bars[7].timestamp);
    approx(buy.quantity, 1.0);

    let before = &result.records[6];
    let after = &result.records[7];
    approx(before.cash_available, 100.0);
    approx(after.cash_available, 50.0);
    approx(after.holding_qty, before.holding_qty + 1.0);
    approx(after.portfolio_value, 600.0);
    assert_eq!(after.consecutive_buys, 1);
}

#[test]
fn gain_threshold_takes_profit() {
    let bars = after_first_deposit(&[50.0, 54.0]);
    let cfg = StrategyConfig {
        window: Some(1),
        ..config(100.0)
    };
    let result = run(&bars, &cfg).unwrap();

    let kinds: Vec<Trigger> = result.events.iter().map(|e| e.trigger).collect();
    assert_eq!(kinds, vec![Trigger::DipBuy, Trigger::ProfitTake]);

    let last = result.records.last().unwrap();
    assert_eq!(last.holding_qty, result.base_qty);
    assert_eq!(last.consecutive_buys, 0);
    approx(last.cash_available, 104.0);
    approx(last.portfolio_value, 644.0);
    assert!(result.final_state.buy_prices.is_empty());
}

#[test]
fn stop_loss_liquidates_tranche() {
    let bars = after_first_deposit(&[50.0, 46.0]);
    let cfg = StrategyConfig {
        window: Some(1),
        max_consecutive_buys: 1,
        ..config(100.0)
    };
    let result = run(&bars, &cfg).unwrap();

    assert_eq!(result.count_trigger(Trigger::DipBuy), 1);
    assert_eq!(result.count_trigger(Trigger::StopLoss), 1);
    assert_eq!(result.count(EventKind::Sell), 1);

    let last = result.records.last().unwrap();
    assert_eq!(last.holding_qty, result.base_qty);
    approx(last.cash_available, 96.0);
    approx(last.portfolio_value, 556.0);
}

#[test]
fn four_week_changes_add_four_deposits() {
    // 2024-01-02 .. 2024-01-29: Mondays at indices 6, 13, 20, 27
    let bars = daily(&[10.0; 28]);
    let cfg = StrategyConfig {
        initial_investment: 500.0,
        ..config(50.0)
    };
    let result = run(&bars, &cfg).unwrap();

    let steps: Vec<(usize, f64)> = result
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.deposited)
        .map(|(i, r)| (i, r.invested_so_far))
        .collect();
    assert_eq!(
        steps,
        vec![(6, 550.0), (13, 600.0), (20, 650.0), (27, 700.0)]
    );
    assert_eq!(result.deposit_count, 4);
    approx(result.total_invested() - 500.0, 200.0);
    approx(result.records[0].invested_so_far, 500.0);
}

#[test]
fn hourly_cooldown_spaces_buys() {
    // Sunday 22:00; the deposit lands at Monday 00:00 (index 2)
    let first = NaiveDate::from_ymd_opt(2024, 1, 7)
        .unwrap()
        .and_hms_opt(22, 0, 0)
        .unwrap();
    let mut closes = vec![100.0, 100.0];
    closes.extend((1..12).map(|k| 100.0 * 0.9_f64.powi(k)));
    let bars = bars_from(first, Duration::hours(1), &closes);

    let cfg = StrategyConfig {
        interval: Interval::OneHour,
        window: Some(1),
        max_consecutive_buys: 5,
        ..config(100.0)
    };
    let result = run(&bars, &cfg).unwrap();

    let buy_idx: Vec<usize> = result
        .records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.event.map(|e| e.kind) == Some(EventKind::Buy))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(buy_idx, vec![2, 6, 10]);

    let buys: Vec<_> = result.buys().collect();
    for pair in buys.windows(2) {
        assert!(pair[1].timestamp - pair[0].timestamp >= Duration::hours(4));
    }
    // Each buy is followed by a stop-loss on the next, lower bar
    assert_eq!(result.count_trigger(Trigger::StopLoss), 3);
}

#[test]
fn consecutive_buy_cap_holds() {
    // Steady 10% daily decline with plenty of cash from a first-week deposit
    let mut closes = vec![100.0; 7];
    closes.extend((1..8).map(|k| 100.0 * 0.9_f64.powi(k)));
    let bars = daily(&closes);
    let cfg = StrategyConfig {
        window: Some(1),
        stop_loss_threshold: 0.01,
        ..config(1000.0)
    };
    let result = run(&bars, &cfg).unwrap();

    assert_eq!(result.count(EventKind::Buy), 2);
    assert!(result.records.iter().all(|r| r.consecutive_buys <= 2));
}

#[test]
fn huge_cooldown_is_rejected_not_panicking() {
    // The dip on day 8 would reach the cooldown check
    let bars = after_first_deposit(&[50.0]);
    let cfg = StrategyConfig {
        buy_cooldown_secs: i64::MAX,
        ..config(1000.0)
    };
    match run(&bars, &cfg) {
        Err(SimError::Config(ConfigError::CooldownOutOfRange(secs))) => {
            assert_eq!(secs, i64::MAX);
        }
        other => panic!("expected cooldown range error, got {other:?}"),
    }
}
