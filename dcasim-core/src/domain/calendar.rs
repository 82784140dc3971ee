//! Calendar-week buckets for deposit scheduling.
//!
//! Bars are grouped by ISO-8601 week: `(iso_year, iso_week)`, Monday start.
//! Ordering of buckets follows time, so a bucket change between two
//! consecutive bars always means a new week has begun. Around New Year the
//! ISO year may differ from the calendar year (2024-12-30 is `2025-W01`).

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekBucket {
    pub year: i32,
    pub week: u32,
}

impl WeekBucket {
    pub fn of(timestamp: NaiveDateTime) -> Self {
        let iso = timestamp.date().iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}

impl fmt::Display for WeekBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}
