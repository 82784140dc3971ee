//! Strategy configuration and eager validation.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Interval;
use crate::indicators::DipGainBands;

/// Rejected configuration. Raised before any bar is processed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("initial investment must be positive and finite, got {0}")]
    InitialInvestment(f64),

    #[error("weekly deposit must be non-negative and finite, got {0}")]
    WeeklyDeposit(f64),

    #[error("{name} must be in {range}, got {value}")]
    Threshold {
        name: &'static str,
        range: &'static str,
        value: f64,
    },

    #[error("buy cooldown must be non-negative, got {0}s")]
    NegativeCooldown(i64),

    #[error("buy cooldown of {0}s is out of range")]
    CooldownOutOfRange(i64),

    #[error("max consecutive buys must be at least 1")]
    MaxConsecutiveBuys,

    #[error("window size must be at least 1")]
    ZeroWindow,
}

/// Parameters of a single simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Converted entirely into the base position at the first bar's close.
    pub initial_investment: f64,
    /// Added to cash and invested capital on every calendar-week change.
    pub weekly_deposit: f64,
    /// Buy when price ≤ reference × dip_threshold.
    pub dip_threshold: f64,
    /// Take profit when price ≥ average buy × gain_threshold.
    pub gain_threshold: f64,
    /// Cut the tranche when price ≤ average buy × stop_loss_threshold.
    pub stop_loss_threshold: f64,
    /// Minimum seconds between two buys.
    pub buy_cooldown_secs: i64,
    pub max_consecutive_buys: u32,
    /// Sampling interval; picks the window size from the lookup table.
    pub interval: Interval,
    /// Explicit window size, overriding the interval table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            initial_investment: 500.0,
            weekly_deposit: 50.0,
            dip_threshold: 0.95,
            gain_threshold: 1.08,
            stop_loss_threshold: 0.93,
            buy_cooldown_secs: 4 * 3600,
            max_consecutive_buys: 2,
            interval: Interval::OneDay,
            window: None,
        }
    }
}

impl StrategyConfig {
    /// Saturates for values `validate()` rejects.
    pub fn buy_cooldown(&self) -> Duration {
        Duration::try_seconds(self.buy_cooldown_secs).unwrap_or(Duration::MAX)
    }

    /// Effective rolling window: the override if set, else the interval table.
    pub fn window_size(&self) -> usize {
        self.window.unwrap_or_else(|| self.interval.window())
    }

    /// True when the window comes from the default for an unknown interval.
    pub fn uses_fallback_window(&self) -> bool {
        self.window.is_none() && !self.interval.is_known()
    }

    /// Indicator preprocessor for this configuration.
    ///
    /// Panics on a zero window; call `validate()` first.
    pub fn bands(&self) -> DipGainBands {
        DipGainBands::new(self.window_size(), self.dip_threshold, self.gain_threshold)
    }

    /// Reject malformed parameters.
    ///
    /// Thresholds equal to 1.0 are accepted: the zero-width configuration is
    /// degenerate but well defined.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_investment.is_finite() && self.initial_investment > 0.0) {
            return Err(ConfigError::InitialInvestment(self.initial_investment));
        }
        if !(self.weekly_deposit.is_finite() && self.weekly_deposit >= 0.0) {
            return Err(ConfigError::WeeklyDeposit(self.weekly_deposit));
        }
        check_unit_threshold("dip_threshold", self.dip_threshold)?;
        check_unit_threshold("stop_loss_threshold", self.stop_loss_threshold)?;
        if !(self.gain_threshold.is_finite() && self.gain_threshold >= 1.0) {
            return Err(ConfigError::Threshold {
                name: "gain_threshold",
                range: "[1, inf)",
                value: self.gain_threshold,
            });
        }
        if self.buy_cooldown_secs < 0 {
            return Err(ConfigError::NegativeCooldown(self.buy_cooldown_secs));
        }
        if Duration::try_seconds(self.buy_cooldown_secs).is_none() {
            return Err(ConfigError::CooldownOutOfRange(self.buy_cooldown_secs));
        }
        if self.max_consecutive_buys == 0 {
            return Err(ConfigError::MaxConsecutiveBuys);
        }
        if self.window_size() == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        Ok(())
    }
}

fn check_unit_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Threshold {
            name,
            range: "(0, 1]",
            value,
        })
    }
}
