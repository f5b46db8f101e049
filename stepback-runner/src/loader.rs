//! CSV bar loading and writing.
//!
//! Input files carry at least `time, open, high, low, close` (header names
//! matched case-insensitively); `volume` (or `tick_volume`), `spread` and
//! `real_volume` are optional. Rows are sorted by timestamp after load, and
//! a file with two rows on the same timestamp is rejected rather than
//! silently deduplicated.

use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

use stepback_core::Bar;

/// Errors from the CSV loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column '{name}'")]
    MissingColumn { name: String },

    #[error("line {line}: bad {field} value '{value}'")]
    BadField {
        line: usize,
        field: String,
        value: String,
    },

    #[error("duplicate timestamp {time}")]
    DuplicateTimestamp { time: DateTime<Utc> },

    #[error("no data rows in {path}")]
    Empty { path: String },
}

/// Column positions resolved from the header row.
struct Columns {
    time: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
    spread: Option<usize>,
    real_volume: Option<usize>,
}

impl Columns {
    fn resolve(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let require = |name: &str| {
            find(name).ok_or_else(|| LoadError::MissingColumn {
                name: name.to_string(),
            })
        };

        Ok(Self {
            time: require("time")?,
            open: require("open")?,
            high: require("high")?,
            low: require("low")?,
            close: require("close")?,
            volume: find("volume").or_else(|| find("tick_volume")),
            spread: find("spread"),
            real_volume: find("real_volume"),
        })
    }
}

/// Load bars from a CSV file and return them sorted by timestamp.
pub fn load_csv(path: impl AsRef<Path>) -> Result<Vec<Bar>, LoadError> {
    let path = path.as_ref();
    let mut reader = csv::Reader::from_path(path)?;
    let columns = Columns::resolve(reader.headers()?)?;

    let mut bars = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let line = i + 2;

        let time = parse_time(record.get(columns.time).unwrap_or("")).ok_or_else(|| {
            bad_field(line, "time", record.get(columns.time))
        })?;
        let open = parse_price(&record, columns.open, "open", line)?;
        let high = parse_price(&record, columns.high, "high", line)?;
        let low = parse_price(&record, columns.low, "low", line)?;
        let close = parse_price(&record, columns.close, "close", line)?;
        let volume = match columns.volume {
            Some(idx) => parse_optional(&record, idx, "volume", line)?.unwrap_or(0.0),
            None => 0.0,
        };
        let spread = match columns.spread {
            Some(idx) => parse_optional(&record, idx, "spread", line)?,
            None => None,
        };
        let real_volume = match columns.real_volume {
            Some(idx) => parse_optional(&record, idx, "real_volume", line)?,
            None => None,
        };

        bars.push(Bar {
            time,
            open,
            high,
            low,
            close,
            volume,
            spread,
            real_volume,
        });
    }

    if bars.is_empty() {
        return Err(LoadError::Empty {
            path: path.display().to_string(),
        });
    }

    bars.sort_by_key(|b| b.time);
    if let Some(pair) = bars.windows(2).find(|w| w[0].time == w[1].time) {
        return Err(LoadError::DuplicateTimestamp { time: pair[0].time });
    }

    Ok(bars)
}

/// Write bars as `time,open,high,low,close,volume` with RFC 3339 timestamps.
pub fn write_csv(path: impl AsRef<Path>, bars: &[Bar]) -> Result<(), LoadError> {
    let mut writer = csv::Writer::from_path(path.as_ref())?;
    writer.write_record(["time", "open", "high", "low", "close", "volume"])?;
    for bar in bars {
        writer.write_record([
            &bar.time.to_rfc3339(),
            &bar.open.to_string(),
            &bar.high.to_string(),
            &bar.low.to_string(),
            &bar.close.to_string(),
            &bar.volume.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Parse a timestamp in any of the accepted formats.
///
/// Naive timestamps (no offset) are taken as UTC.
fn parse_time(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(t.and_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(d.and_hms_opt(0, 0, 0)?.and_utc());
    }
    None
}

fn parse_price(
    record: &csv::StringRecord,
    idx: usize,
    field: &str,
    line: usize,
) -> Result<f64, LoadError> {
    let raw = record.get(idx).unwrap_or("");
    raw.trim()
        .parse::<f64>()
        .map_err(|_| bad_field(line, field, Some(raw)))
}

/// An optional numeric cell: absent or blank means `None`, garbage is an error.
fn parse_optional(
    record: &csv::StringRecord,
    idx: usize,
    field: &str,
    line: usize,
) -> Result<Option<f64>, LoadError> {
    match record.get(idx).map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => raw
            .parse::<f64>()
            .map(Some)
            .map_err(|_| bad_field(line, field, Some(raw))),
    }
}

fn bad_field(line: usize, field: &str, value: Option<&str>) -> LoadError {
    LoadError::BadField {
        line,
        field: field.to_string(),
        value: value.unwrap_or("").to_string(),
    }
}
