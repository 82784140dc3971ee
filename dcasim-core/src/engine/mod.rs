//! Simulation engine: bar-by-bar replay of the DCA strategy.
//!
//! The engine consumes a validated bar series and its precomputed indicator
//! sets, opens the base position at the first close, then folds every bar
//! through `step()`:
//!
//! 1. Calendar rollover and weekly deposit
//! 2. Reference price from the preceding window
//! 3. Average buy price of the open tranche
//! 4. Buy / profit-take / stop-loss / hold decision
//! 5. Mark-to-market valuation

pub mod cancel;
pub mod config;
pub mod loop_runner;
pub mod result;
pub mod state;
pub mod step;

pub use cancel::CancelToken;
pub use config::{ConfigError, StrategyConfig};
pub use loop_runner::{run, simulate, simulate_with_cancel};
pub use result::{EventKind, SimulationRecord, SimulationResult, TradeEvent, Trigger};
pub use state::PortfolioState;
pub use step::{decide, step, BarContext, BUY_CASH_FRACTION};
