use std::fmt;
use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// Integers at or above this magnitude are read as milliseconds, below it as
/// seconds. 10^11 seconds is roughly the year 5138; 10^11 ms is early 1973.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// A point in time as epoch milliseconds, the only representation the engine
/// works with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub const fn as_millis(self) -> i64 {
        self.0
    }

    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(millis))
    }

    pub fn saturating_sub(self, duration: Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_sub(millis))
    }

    /// Time left from `self` until `later`; zero when `later` is not after `self`.
    pub fn duration_until(self, later: Timestamp) -> Duration {
        let delta = later.0.saturating_sub(self.0);
        Duration::from_millis(u64::try_from(delta).unwrap_or(0))
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.0).single()
    }

    /// Whole seconds, as used by Discord's `<t:...>` markup.
    pub fn as_unix_seconds(self) -> i64 {
        self.0.div_euclid(1000)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value.timestamp_millis())
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(datetime) => write!(f, "{}", datetime.to_rfc3339()),
            None => write!(f, "{}ms", self.0),
        }
    }
}

/// A deadline as it may have been persisted historically: unix seconds, epoch
/// milliseconds or a date string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTimestamp {
    Seconds(i64),
    Millis(i64),
    Text(String),
}

impl RawTimestamp {
    /// Classify a bare integer by magnitude.
    pub fn from_integer(value: i64) -> Self {
        if value.abs() >= MILLIS_THRESHOLD {
            RawTimestamp::Millis(value)
        } else {
            RawTimestamp::Seconds(value)
        }
    }

    pub fn normalize(&self) -> Result<Timestamp, StoreError> {
        match self {
            RawTimestamp::Seconds(seconds) => seconds
                .checked_mul(1000)
                .map(Timestamp)
                .ok_or_else(|| StoreError::Corrupt(format!("timestamp out of range: {seconds}s"))),
            RawTimestamp::Millis(millis) => Ok(Timestamp(*millis)),
            RawTimestamp::Text(text) => parse_text(text.trim()),
        }
    }
}

fn parse_text(text: &str) -> Result<Timestamp, StoreError> {
    if let Ok(value) = text.parse::<i64>() {
        return RawTimestamp::from_integer(value).normalize();
    }

    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Ok(Timestamp(datetime.timestamp_millis()));
    }

    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .map(|naive| Timestamp(Utc.from_utc_datetime(&naive).timestamp_millis()))
        .ok_or_else(|| StoreError::Corrupt(format!("unrecognized timestamp encoding: {text:?}")))
}
