//! Bar loading for the runner.
//!
//! Two sources feed the engine:
//! 1. A CSV file with a timestamp column and a close column
//! 2. A seeded random walk (`synthetic = true`), for development only
//!
//! Loaded bars are sorted, de-duplicated, filtered to the configured date
//! range, and fingerprinted with a BLAKE3 dataset hash.

use std::io::Read;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use dcasim_core::{Bar, Interval};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::DataSection;

/// Header names accepted for the timestamp column (case-insensitive).
const TIMESTAMP_COLUMNS: [&str; 4] = ["timestamp", "datetime", "date", "tradedate"];

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing '{column}' column (headers: {headers})")]
    MissingColumn {
        column: &'static str,
        headers: String,
    },

    #[error("row {row}: unparseable timestamp '{value}'")]
    BadTimestamp { row: usize, value: String },

    #[error("row {row}: close must be a positive number, got '{value}'")]
    BadPrice { row: usize, value: String },

    #[error("no bars left for '{symbol}' after loading and date filtering")]
    Empty { symbol: String },

    #[error("cannot generate synthetic bars for interval '{0}'")]
    UnknownInterval(String),
}

/// Where the bars came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DataSource {
    Csv { path: PathBuf },
    Synthetic,
}

/// Result of loading bars, including provenance.
#[derive(Debug, Clone)]
pub struct LoadedData {
    pub bars: Vec<Bar>,
    pub source: DataSource,
    /// BLAKE3 over every timestamp and close.
    pub dataset_hash: String,
    pub has_synthetic: bool,
}

/// Load bars as described by the `[data]` section.
pub fn load_bars(data: &DataSection) -> Result<LoadedData, LoadError> {
    let (bars, source) = match (&data.path, data.synthetic) {
        (_, true) => {
            warn!(
                "Generating synthetic data for {}; results are tagged as synthetic",
                data.symbol
            );
            let start = data
                .start
                .unwrap_or_else(|| NaiveDate::from_ymd_opt(2022, 1, 3).unwrap_or_default());
            let bars = generate_synthetic_bars(&data.symbol, &data.interval, start, data.synthetic_bars)?;
            (bars, DataSource::Synthetic)
        }
        (Some(path), false) => (load_csv(path)?, DataSource::Csv { path: path.clone() }),
        (None, false) => {
            return Err(LoadError::Empty {
                symbol: data.symbol.clone(),
            })
        }
    };

    let bars = filter_dates(bars, data.start, data.end);
    if bars.is_empty() {
        return Err(LoadError::Empty {
            symbol: data.symbol.clone(),
        });
    }

    info!(
        "Loaded {} bars for {} from {} to {}",
        bars.len(),
        data.symbol,
        bars[0].timestamp,
        bars[bars.len() - 1].timestamp
    );

    Ok(LoadedData {
        dataset_hash: compute_dataset_hash(&bars),
        has_synthetic: source == DataSource::Synthetic,
        bars,
        source,
    })
}

/// Load bars from a CSV file. Sorted by time, duplicate timestamps dropped.
pub fn load_csv(path: &Path) -> Result<Vec<Bar>, LoadError> {
    info!("Loading data from: {}", path.display());
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(file)
}

/// Parse bars from any CSV reader.
pub fn read_csv<R: Read>(reader: R) -> Result<Vec<Bar>, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    let find = |names: &[&str]| {
        headers
            .iter()
            .position(|h| names.iter().any(|n| h.eq_ignore_ascii_case(n)))
    };
    let missing = |column| LoadError::MissingColumn {
        column,
        headers: headers.iter().collect::<Vec<_>>().join(","),
    };
    let ts_col = find(&TIMESTAMP_COLUMNS).ok_or_else(|| missing("timestamp"))?;
    let close_col = find(&["close"]).ok_or_else(|| missing("close"))?;

    let mut bars = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is row 1
        let row = i + 2;
        let raw_ts = record.get(ts_col).unwrap_or("");
        let raw_close = record.get(close_col).unwrap_or("");

        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| LoadError::BadTimestamp {
            row,
            value: raw_ts.to_string(),
        })?;
        let bar = raw_close
            .parse::<f64>()
            .ok()
            .map(|close| Bar::new(timestamp, close))
            .filter(Bar::is_sane)
            .ok_or_else(|| LoadError::BadPrice {
                row,
                value: raw_close.to_string(),
            })?;
        bars.push(bar);
    }
    debug!("Parsed {} CSV rows", bars.len());

    Ok(sort_and_dedup(bars))
}

/// Parse a timestamp in any of the supported layouts.
///
/// Offsets are dropped after parsing: bars keep the exchange-local wall
/// time, which is what calendar-week bucketing should see.
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_local());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(dt.naive_local());
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn sort_and_dedup(mut bars: Vec<Bar>) -> Vec<Bar> {
    bars.sort_by_key(|b| b.timestamp);
    let original_len = bars.len();
    bars.dedup_by_key(|b| b.timestamp);
    if bars.len() < original_len {
        warn!("Removed {} duplicate timestamps", original_len - bars.len());
    }
    bars
}

/// Keep bars whose date lies in `[start, end]` (either bound optional).
pub fn filter_dates(bars: Vec<Bar>, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Vec<Bar> {
    bars.into_iter()
        .filter(|b| {
            let d = b.timestamp.date();
            start.map_or(true, |s| d >= s) && end.map_or(true, |e| d <= e)
        })
        .collect()
}

/// Compute a deterministic BLAKE3 hash over all bar data.
pub fn compute_dataset_hash(bars: &[Bar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.timestamp.to_string().as_bytes());
        hasher.update(&bar.close.to_le_bytes());
    }
    hasher.finalize().to_hex().to_string()
}

/// Generate a synthetic random walk.
///
/// Starts at 100.0 and moves up to ±3% per bar. The RNG is seeded from the
/// symbol name, so the same symbol always produces the same series.
pub fn generate_synthetic_bars(
    symbol: &str,
    interval: &Interval,
    start: NaiveDate,
    count: usize,
) -> Result<Vec<Bar>, LoadError> {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let step = interval
        .duration()
        .ok_or_else(|| LoadError::UnknownInterval(interval.to_string()))?;

    let seed_bytes = blake3::hash(symbol.as_bytes());
    let seed: [u8; 32] = *seed_bytes.as_bytes();
    let mut rng = StdRng::from_seed(seed);

    let mut timestamp = start.and_time(chrono::NaiveTime::MIN);
    let mut price = 100.0_f64;
    let mut bars = Vec::with_capacity(count);
    for _ in 0..count {
        bars.push(Bar::new(timestamp, price));
        let ret: f64 = rng.gen_range(-0.03..0.03);
        price *= 1.0 + ret;
        timestamp += step;
    }
    Ok(bars)
}
