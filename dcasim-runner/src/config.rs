//! Serializable simulation configuration (TOML).

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use dcasim_core::{Interval, StrategyConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Content hash identifying a configuration.
pub type RunId = String;

/// Synthetic series length when the config gives no date range.
pub const DEFAULT_SYNTHETIC_BARS: usize = 500;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid strategy: {0}")]
    Strategy(#[from] dcasim_core::ConfigError),

    #[error("[data] needs either `path` or `synthetic = true`")]
    NoDataSource,

    #[error("start date {start} is after end date {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },
}

/// A full simulation config file: where the bars come from and how to trade them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationConfig {
    pub data: DataSection,
    pub strategy: StrategySection,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSection {
    pub symbol: String,
    /// CSV file with a timestamp column and a close column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    pub interval: Interval,
    /// Inclusive start date filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<NaiveDate>,
    /// Inclusive end date filter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<NaiveDate>,
    /// Generate a seeded random walk instead of reading `path`.
    #[serde(default)]
    pub synthetic: bool,
    #[serde(default = "default_synthetic_bars")]
    pub synthetic_bars: usize,
}

fn default_synthetic_bars() -> usize {
    DEFAULT_SYNTHETIC_BARS
}

/// Strategy parameters as written in the `[strategy]` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StrategySection {
    pub initial_investment: f64,
    pub weekly_deposit: f64,
    pub dip_threshold: f64,
    pub gain_threshold: f64,
    pub stop_loss_threshold: f64,
    pub buy_cooldown_secs: i64,
    pub max_consecutive_buys: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
}

impl SimulationConfig {
    pub fn from_toml(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Reference parameters: $500 up front, $50 a week, daily bars.
    pub fn default_for(symbol: &str) -> Self {
        let s = StrategyConfig::default();
        Self {
            data: DataSection {
                symbol: symbol.to_string(),
                path: None,
                interval: s.interval.clone(),
                start: None,
                end: None,
                synthetic: false,
                synthetic_bars: DEFAULT_SYNTHETIC_BARS,
            },
            strategy: StrategySection {
                initial_investment: s.initial_investment,
                weekly_deposit: s.weekly_deposit,
                dip_threshold: s.dip_threshold,
                gain_threshold: s.gain_threshold,
                stop_loss_threshold: s.stop_loss_threshold,
                buy_cooldown_secs: s.buy_cooldown_secs,
                max_consecutive_buys: s.max_consecutive_buys,
                window: s.window,
            },
        }
    }

    /// Engine configuration: the strategy table plus the data interval.
    pub fn to_strategy_config(&self) -> StrategyConfig {
        let s = &self.strategy;
        StrategyConfig {
            initial_investment: s.initial_investment,
            weekly_deposit: s.weekly_deposit,
            dip_threshold: s.dip_threshold,
            gain_threshold: s.gain_threshold,
            stop_loss_threshold: s.stop_loss_threshold,
            buy_cooldown_secs: s.buy_cooldown_secs,
            max_consecutive_buys: s.max_consecutive_buys,
            interval: self.data.interval.clone(),
            window: s.window,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.to_strategy_config().validate()?;
        if self.data.path.is_none() && !self.data.synthetic {
            return Err(ConfigError::NoDataSource);
        }
        if let (Some(start), Some(end)) = (self.data.start, self.data.end) {
            if start > end {
                return Err(ConfigError::DateRange { start, end });
            }
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deterministic BLAKE3 hash of the configuration.
    ///
    /// Two runs with identical configs share a RunId.
    pub fn run_id(&self) -> RunId {
        // Plain data with string keys; serialization cannot fail.
        let json = serde_json::to_vec(self).unwrap_or_default();
        blake3::hash(&json).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[data]
symbol = "RKLB"
path = "data/rklb.csv"
interval = "1d"
start = "2022-01-08"
end = "2025-03-16"

[strategy]
initial_investment = 500.0
weekly_deposit = 50.0
dip_threshold = 0.95
gain_threshold = 1.08
stop_loss_threshold = 0.93
buy_cooldown_secs = 14400
max_consecutive_buys = 2
"#;

    #[test]
    fn parses_sample() {
        let config = SimulationConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.data.symbol, "RKLB");
        assert_eq!(config.data.interval, Interval::OneDay);
        assert_eq!(config.data.start, NaiveDate::from_ymd_opt(2022, 1, 8));
        assert!(!config.data.synthetic);
        assert_eq!(config.data.synthetic_bars, DEFAULT_SYNTHETIC_BARS);

        let strategy = config.to_strategy_config();
        assert_eq!(strategy, StrategyConfig::default());
        assert_eq!(strategy.window_size(), 3);
    }

    #[test]
    fn window_override_and_unknown_interval() {
        let toml = SAMPLE
            .replace("interval = \"1d\"", "interval = \"1wk\"")
            .replace("max_consecutive_buys = 2", "max_consecutive_buys = 2\nwindow = 20");
        let config = SimulationConfig::from_toml(&toml).unwrap();
        assert_eq!(config.data.interval, Interval::Other("1wk".into()));
        let strategy = config.to_strategy_config();
        assert_eq!(strategy.window_size(), 20);
        assert!(!strategy.uses_fallback_window());

        let fallback = SimulationConfig::from_toml(&SAMPLE.replace("\"1d\"", "\"1wk\"")).unwrap();
        assert!(fallback.to_strategy_config().uses_fallback_window());
    }

    #[test]
    fn huge_cooldown_is_strategy_error() {
        let toml = SAMPLE.replace(
            "buy_cooldown_secs = 14400",
            &format!("buy_cooldown_secs = {}", i64::MAX),
        );
        assert!(matches!(
            SimulationConfig::from_toml(&toml),
            Err(ConfigError::Strategy(_))
        ));
    }

    #[test]
    fn missing_field_is_parse_error() {
        let toml = SAMPLE.replace("weekly_deposit = 50.0\n", "");
        assert!(matches!(
            SimulationConfig::from_toml(&toml),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn invalid_threshold_is_strategy_error() {
        let toml = SAMPLE.replace("gain_threshold = 1.08", "gain_threshold = 0.5");
        assert!(matches!(
            SimulationConfig::from_toml(&toml),
            Err(ConfigError::Strategy(_))
        ));
    }

    #[test]
    fn requires_a_data_source() {
        let toml = SAMPLE.replace("path = \"data/rklb.csv\"\n", "");
        assert!(matches!(
            SimulationConfig::from_toml(&toml),
            Err(ConfigError::NoDataSource)
        ));
        let synthetic = toml.replace("interval = \"1d\"", "interval = \"1d\"\nsynthetic = true");
        assert!(SimulationConfig::from_toml(&synthetic).is_ok());
    }

    #[test]
    fn rejects_inverted_dates() {
        let toml = SAMPLE.replace("start = \"2022-01-08\"", "start = \"2026-01-01\"");
        assert!(matches!(
            SimulationConfig::from_toml(&toml),
            Err(ConfigError::DateRange { .. })
        ));
    }

    #[test]
    fn toml_round_trip() {
        let config = SimulationConfig::from_toml(SAMPLE).unwrap();
        let back = SimulationConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn run_id_deterministic_and_param_sensitive() {
        let a = SimulationConfig::from_toml(SAMPLE).unwrap();
        let mut b = a.clone();
        assert_eq!(a.run_id(), b.run_id());
        assert_eq!(a.run_id().len(), 64);

        b.strategy.dip_threshold = 0.9;
        assert_ne!(a.run_id(), b.run_id());
    }

    #[test]
    fn default_for_matches_engine_defaults() {
        let mut config = SimulationConfig::default_for("SPY");
        config.data.synthetic = true;
        assert!(config.validate().is_ok());
        assert_eq!(config.to_strategy_config(), StrategyConfig::default());
    }
}
