//! Fixed bar timeframes and bucket arithmetic.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Bar interval, from one minute up to one day.
///
/// Parses from both the compact venue spelling (`"M15"`, `"H4"`) and the
/// duration spelling (`"15min"`, `"4h"`), case-insensitively. Displays as
/// the compact spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Timeframe {
    M1,
    M5,
    M15,
    M30,
    H1,
    H4,
    D1,
}

impl Timeframe {
    pub fn minutes(&self) -> i64 {
        match self {
            Timeframe::M1 => 1,
            Timeframe::M5 => 5,
            Timeframe::M15 => 15,
            Timeframe::M30 => 30,
            Timeframe::H1 => 60,
            Timeframe::H4 => 240,
            Timeframe::D1 => 1440,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(self.minutes())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Timeframe::M1 => "M1",
            Timeframe::M5 => "M5",
            Timeframe::M15 => "M15",
            Timeframe::M30 => "M30",
            Timeframe::H1 => "H1",
            Timeframe::H4 => "H4",
            Timeframe::D1 => "D1",
        }
    }

    /// Start of the bucket containing `time` (left-closed, UTC-anchored).
    ///
    /// Idempotent: flooring a bucket start returns it unchanged.
    pub fn floor(&self, time: DateTime<Utc>) -> DateTime<Utc> {
        let secs = self.minutes() * 60;
        let t = time.timestamp();
        let floored = t - t.rem_euclid(secs);
        DateTime::from_timestamp(floored, 0).expect("floored timestamp in range")
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Error)]
#[error("unrecognized timeframe {0:?} (expected e.g. \"M15\" or \"15min\")")]
pub struct TimeframeParseError(pub String);

impl FromStr for Timeframe {
    type Err = TimeframeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "m1" | "1min" => Ok(Timeframe::M1),
            "m5" | "5min" => Ok(Timeframe::M5),
            "m15" | "15min" => Ok(Timeframe::M15),
            "m30" | "30min" => Ok(Timeframe::M30),
            "h1" | "1h" | "60min" => Ok(Timeframe::H1),
            "h4" | "4h" | "240min" => Ok(Timeframe::H4),
            "d1" | "1d" => Ok(Timeframe::D1),
            _ => Err(TimeframeParseError(s.to_string())),
        }
    }
}

impl Serialize for Timeframe {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Timeframe {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
