//! Sampling interval and the interval → lookback window table.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Window used when the interval is not in the lookup table.
pub const DEFAULT_WINDOW: usize = 96;

/// Bar sampling interval, as written in provider notation (`"15m"`, `"1d"`).
///
/// Only used to pick the rolling window size. Unknown strings are kept
/// verbatim in `Other` so they round-trip through config files.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Interval {
    OneMinute,
    FifteenMinutes,
    OneHour,
    NinetyMinutes,
    FourHours,
    OneDay,
    Other(String),
}

impl Interval {
    pub fn parse(s: &str) -> Self {
        match s.trim() {
            "1m" => Self::OneMinute,
            "15m" => Self::FifteenMinutes,
            "1h" => Self::OneHour,
            "90m" => Self::NinetyMinutes,
            "4h" => Self::FourHours,
            "1d" => Self::OneDay,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::OneMinute => "1m",
            Self::FifteenMinutes => "15m",
            Self::OneHour => "1h",
            Self::NinetyMinutes => "90m",
            Self::FourHours => "4h",
            Self::OneDay => "1d",
            Self::Other(s) => s,
        }
    }

    /// Rolling window size for this interval.
    ///
    /// Intraday intervals map to roughly one day of bars; daily bars use a
    /// three-bar window.
    pub fn window(&self) -> usize {
        match self {
            Self::OneMinute => 60 * 24,
            Self::FifteenMinutes => 4 * 24,
            Self::OneHour => 24,
            Self::NinetyMinutes => 18,
            Self::FourHours => 6,
            Self::OneDay => 3,
            Self::Other(_) => DEFAULT_WINDOW,
        }
    }

    /// Bar spacing, if known. `None` for unrecognized intervals.
    pub fn duration(&self) -> Option<Duration> {
        match self {
            Self::OneMinute => Some(Duration::minutes(1)),
            Self::FifteenMinutes => Some(Duration::minutes(15)),
            Self::OneHour => Some(Duration::hours(1)),
            Self::NinetyMinutes => Some(Duration::minutes(90)),
            Self::FourHours => Some(Duration::hours(4)),
            Self::OneDay => Some(Duration::days(1)),
            Self::Other(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self::OneDay
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Interval {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for Interval {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<Interval> for String {
    fn from(interval: Interval) -> Self {
        interval.as_str().to_string()
    }
}
