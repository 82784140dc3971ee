//! Replay loop: the heart of the simulation engine.

use tracing::{debug, info, warn};

use super::cancel::CancelToken;
use super::config::StrategyConfig;
use super::result::SimulationResult;
use super::state::PortfolioState;
use super::step::{step, BarContext};
use crate::domain::{check_series, Bar};
use crate::error::{InputError, SimError};
use crate::indicators::{IndicatorSet, TrailingMean};

/// Compute indicators for `bars` and run the simulation.
///
/// This is the main entry point when the caller has no precomputed
/// indicator series.
pub fn run(bars: &[Bar], config: &StrategyConfig) -> Result<SimulationResult, SimError> {
    config.validate()?;
    let indicators = config.bands().compute(bars);
    simulate(bars, &indicators, config)
}

/// Run the simulation over bars with their indicator sets attached.
pub fn simulate(
    bars: &[Bar],
    indicators: &[IndicatorSet],
    config: &StrategyConfig,
) -> Result<SimulationResult, SimError> {
    simulate_with_cancel(bars, indicators, config, &CancelToken::new())
}

/// Run the simulation, checking `cancel` once before each bar.
///
/// Configuration and input are validated up front; nothing can fail once the
/// first bar is processed. A cancelled run returns the records of every bar
/// processed before the flag was seen, with `cancelled` set.
pub fn simulate_with_cancel(
    bars: &[Bar],
    indicators: &[IndicatorSet],
    config: &StrategyConfig,
    cancel: &CancelToken,
) -> Result<SimulationResult, SimError> {
    config.validate()?;
    check_series(bars)?;
    if indicators.len() != bars.len() {
        return Err(InputError::IndicatorLength {
            bars: bars.len(),
            indicators: indicators.len(),
        }
        .into());
    }

    let window = config.window_size();
    let references = TrailingMean::new(window).compute(bars);
    let mut state = PortfolioState::open(&bars[0], config.initial_investment);
    let mut records = Vec::with_capacity(bars.len());
    let mut events = Vec::new();
    let mut cancelled = false;

    info!(
        "Simulating {} bars ({} to {}), window={}, base_qty={:.6}",
        bars.len(),
        bars[0].timestamp,
        bars[bars.len() - 1].timestamp,
        window,
        state.base_qty
    );

    for (i, bar) in bars.iter().enumerate() {
        if cancel.is_cancelled() {
            warn!("Simulation cancelled after {} of {} bars", i, bars.len());
            cancelled = true;
            break;
        }

        let ctx = BarContext {
            bar,
            reference_price: references[i],
            indicators: indicators[i],
        };
        let record = step(&mut state, config, &ctx);

        debug_assert!(
            state.holding_qty >= state.base_qty,
            "base position violated at bar {i}: holding={} < base={}",
            state.holding_qty,
            state.base_qty
        );

        if record.deposited {
            debug!(
                "Deposit {:.2} at {} (week {}), invested={:.2}",
                config.weekly_deposit, bar.timestamp, state.current_bucket, state.invested_so_far
            );
        }
        if let Some(event) = record.event {
            debug!(
                "{:?} ({}) {:.6} units at {:.4} on {}",
                event.kind,
                event.trigger.as_str(),
                event.quantity,
                event.price,
                event.timestamp
            );
            events.push(event);
        }
        records.push(record);
    }

    let result = SimulationResult {
        records,
        events,
        base_qty: state.base_qty,
        starting_price: state.starting_price,
        window,
        deposit_count: state.deposit_count,
        cancelled,
        final_state: state,
    };

    info!(
        "Simulation finished: final value {:.2}, invested {:.2}, {} events",
        result.final_value(),
        result.total_invested(),
        result.events.len()
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ConfigError;
    use crate::indicators::make_bars;

    #[test]
    fn empty_series_is_input_error() {
        let err = run(&[], &StrategyConfig::default()).unwrap_err();
        assert_eq!(err, SimError::Input(InputError::Empty));
    }

    #[test]
    fn config_is_checked_before_input() {
        let config = StrategyConfig {
            max_consecutive_buys: 0,
            ..StrategyConfig::default()
        };
        let err = simulate(&[], &[], &config).unwrap_err();
        assert_eq!(err, SimError::Config(ConfigError::MaxConsecutiveBuys));
    }

    #[test]
    fn indicator_length_mismatch() {
        let bars = make_bars(&[1.0, 2.0, 3.0]);
        let indicators = vec![IndicatorSet::default(); 2];
        let err = simulate(&bars, &indicators, &StrategyConfig::default()).unwrap_err();
        assert_eq!(
            err,
            SimError::Input(InputError::IndicatorLength {
                bars: 3,
                indicators: 2
            })
        );
    }

    #[test]
    fn unsorted_series_rejected() {
        let mut bars = make_bars(&[1.0, 2.0, 3.0]);
        bars.swap(0, 2);
        let err = run(&bars, &StrategyConfig::default()).unwrap_err();
        assert!(matches!(err, SimError::Input(InputError::OutOfOrder { .. })));
    }

    #[test]
    fn pre_cancelled_run_has_no_records() {
        let bars = make_bars(&[10.0, 11.0, 12.0]);
        let config = StrategyConfig::default();
        let token = CancelToken::new();
        token.cancel();
        let result =
            simulate_with_cancel(&bars, &config.bands().compute(&bars), &config, &token).unwrap();
        assert!(result.cancelled);
        assert!(result.records.is_empty());
        assert_eq!(result.final_state.holding_qty, result.base_qty);
    }

    #[test]
    fn records_align_with_bars() {
        let bars = make_bars(&[10.0, 9.0, 12.0, 8.0, 15.0]);
        let result = run(&bars, &StrategyConfig::default()).unwrap();
        assert!(!result.cancelled);
        assert_eq!(result.records.len(), bars.len());
        for (record, bar) in result.records.iter().zip(&bars) {
            assert_eq!(record.timestamp, bar.timestamp);
            assert_eq!(record.close, bar.close);
        }
        assert_eq!(result.window, 3);
        assert_eq!(result.starting_price, 10.0);
    }
}
