//! Time Window
//!
//! The `[start, end)` interval, in milliseconds since the epoch, over which
//! every metric in a run is queried. Built once per run from caller input.

use chrono::{DateTime, Utc};
use regex::Regex;
use thiserror::Error;

/// A half-open evaluation window in epoch milliseconds
///
/// Only constructible through [`TimeWindow::new`], so `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start_millis: i64,
    end_millis: i64,
}

impl TimeWindow {
    /// Create a window, rejecting `start >= end`
    pub fn new(start_millis: i64, end_millis: i64) -> Result<Self, TimeRangeError> {
        if start_millis >= end_millis {
            return Err(TimeRangeError::StartNotBeforeEnd {
                start: start_millis,
                end: end_millis,
            });
        }
        Ok(Self {
            start_millis,
            end_millis,
        })
    }

    /// Create a window from epoch seconds
    pub fn from_epoch_secs(start_secs: i64, end_secs: i64) -> Result<Self, TimeRangeError> {
        Self::new(secs_to_millis(start_secs)?, secs_to_millis(end_secs)?)
    }

    /// Start timestamp (inclusive), in milliseconds
    pub fn start_millis(&self) -> i64 {
        self.start_millis
    }

    /// End timestamp (exclusive), in milliseconds
    pub fn end_millis(&self) -> i64 {
        self.end_millis
    }

    /// Get the duration in milliseconds, saturating at `i64::MAX`
    pub fn duration_millis(&self) -> i64 {
        self.end_millis.saturating_sub(self.start_millis)
    }
}

impl std::fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fmt_ts = |ms: i64| {
            DateTime::from_timestamp_millis(ms)
                .map(|dt| dt.format("%Y-%m-%dT%H:%M:%SZ").to_string())
                .unwrap_or_else(|| ms.to_string())
        };
        write!(f, "[{}, {})", fmt_ts(self.start_millis), fmt_ts(self.end_millis))
    }
}

/// Errors in the time-window input
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimeRangeError {
    #[error("start time is required")]
    MissingStart,

    #[error("start time must be before end time (start={start}, end={end})")]
    StartNotBeforeEnd { start: i64, end: i64 },

    #[error("invalid time value '{0}': expected epoch seconds, 'now' or 'now-<n><s|m|h|d|w>'")]
    Invalid(String),

    #[error("time value {0} is out of range")]
    OutOfRange(i64),
}

/// Resolve `--start`/`--end` arguments into a window
///
/// `start` is required and must not be zero. A missing (or zero) `end`
/// defaults to `now`. Both are given in epoch seconds or as relative
/// expressions and converted to milliseconds.
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    now: DateTime<Utc>,
) -> Result<TimeWindow, TimeRangeError> {
    let start_secs = match start.map(|s| parse_time_arg(s, now)).transpose()? {
        None | Some(0) => return Err(TimeRangeError::MissingStart),
        Some(secs) => secs,
    };

    let end_secs = match end.map(|s| parse_time_arg(s, now)).transpose()? {
        None | Some(0) => now.timestamp(),
        Some(secs) => secs,
    };

    TimeWindow::from_epoch_secs(start_secs, end_secs)
}

/// Parse one time argument into epoch seconds
///
/// Accepts a plain integer (epoch seconds), `now`, or `now-<n><unit>` where
/// unit is one of `s`, `m`, `h`, `d`, `w`.
pub fn parse_time_arg(s: &str, now: DateTime<Utc>) -> Result<i64, TimeRangeError> {
    let s = s.trim();

    if let Ok(secs) = s.parse::<i64>() {
        return Ok(secs);
    }

    let re = Regex::new(r"^now(?:-(\d+)([smhdw]))?$")
        .map_err(|_| TimeRangeError::Invalid(s.to_string()))?;

    let caps = re
        .captures(s)
        .ok_or_else(|| TimeRangeError::Invalid(s.to_string()))?;

    let now_secs = now.timestamp();
    let (Some(amount), Some(unit)) = (caps.get(1), caps.get(2)) else {
        return Ok(now_secs);
    };

    let amount: i64 = amount
        .as_str()
        .parse()
        .map_err(|_| TimeRangeError::Invalid(s.to_string()))?;
    let unit_secs = match unit.as_str() {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        _ => 7 * 86_400,
    };

    amount
        .checked_mul(unit_secs)
        .and_then(|offset| now_secs.checked_sub(offset))
        .ok_or_else(|| TimeRangeError::Invalid(s.to_string()))
}

fn secs_to_millis(secs: i64) -> Result<i64, TimeRangeError> {
    secs.checked_mul(1000)
        .ok_or(TimeRangeError::OutOfRange(secs))
}
