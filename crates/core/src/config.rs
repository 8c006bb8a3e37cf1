//! # Engine Configuration
//!
//! Loaded from environment variables, with defaults for everything:
//!
//! - `GIVEAWAY_RETENTION_HOURS`: how long closed giveaways are kept (default: 24)
//! - `GIVEAWAY_SWEEP_INTERVAL_SECS`: retention sweep period (default: 3600)
//! - `GIVEAWAY_CLOSE_MAX_ATTEMPTS`: attempts to persist a closure (default: 5)
//! - `GIVEAWAY_CLOSE_BACKOFF_MS`: first retry delay (default: 200)
//! - `GIVEAWAY_CLOSE_BACKOFF_MAX_MS`: retry delay cap (default: 5000)
//! - `GIVEAWAY_BONUS_ENTRIES`: `participant:extra,...` bonus table (default: none)

use std::env;
use std::time::Duration;

use eyre::{Result, WrapErr, eyre};

use crate::lifecycle::RetryPolicy;
use crate::selector::BonusTable;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Grace period between closure and deletion
    pub retention: Duration,

    /// Period of the retention sweeper
    pub sweep_interval: Duration,

    /// Backoff applied when persisting a closure fails transiently
    pub close_retry: RetryPolicy,

    /// Extra draw entries per participant; empty means no bonus for anyone
    pub bonus_entries: BonusTable,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retention: Duration::from_secs(24 * 60 * 60),
            sweep_interval: Duration::from_secs(60 * 60),
            close_retry: RetryPolicy::default(),
            bonus_entries: BonusTable::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup, falling back to defaults for
    /// missing keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let number = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(value) => value
                    .trim()
                    .parse::<u64>()
                    .wrap_err_with(|| format!("Invalid {key} value: {value:?}")),
                None => Ok(default),
            }
        };

        let retention_hours = number("GIVEAWAY_RETENTION_HOURS", defaults.retention.as_secs() / 3600)?;
        let sweep_secs = number("GIVEAWAY_SWEEP_INTERVAL_SECS", defaults.sweep_interval.as_secs())?;
        if sweep_secs == 0 {
            return Err(eyre!("GIVEAWAY_SWEEP_INTERVAL_SECS must be greater than zero"));
        }

        let max_attempts = number(
            "GIVEAWAY_CLOSE_MAX_ATTEMPTS",
            u64::from(defaults.close_retry.max_attempts),
        )?;
        let max_attempts = u32::try_from(max_attempts)
            .ok()
            .filter(|attempts| *attempts > 0)
            .ok_or_else(|| eyre!("GIVEAWAY_CLOSE_MAX_ATTEMPTS must be between 1 and {}", u32::MAX))?;
        let initial_backoff_ms = number(
            "GIVEAWAY_CLOSE_BACKOFF_MS",
            defaults.close_retry.initial_backoff.as_millis() as u64,
        )?;
        let max_backoff_ms = number(
            "GIVEAWAY_CLOSE_BACKOFF_MAX_MS",
            defaults.close_retry.max_backoff.as_millis() as u64,
        )?;

        let bonus_entries = match lookup("GIVEAWAY_BONUS_ENTRIES") {
            Some(table) => BonusTable::parse(&table)
                .map_err(|e| eyre!("Invalid GIVEAWAY_BONUS_ENTRIES value: {e}"))?,
            None => BonusTable::default(),
        };

        Ok(Self {
            retention: Duration::from_secs(retention_hours.saturating_mul(3600)),
            sweep_interval: Duration::from_secs(sweep_secs),
            close_retry: RetryPolicy {
                max_attempts,
                initial_backoff: Duration::from_millis(initial_backoff_ms),
                max_backoff: Duration::from_millis(max_backoff_ms.max(initial_backoff_ms)),
            },
            bonus_entries,
        })
    }
}
