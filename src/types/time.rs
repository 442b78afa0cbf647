//! Timestamps, dates and durations.
//!
//! Timestamps count microseconds and dates count days, both from
//! 2000-01-01 UTC, so that their binary encodings match the engine's wire
//! format.

use crate::error::{ChronotopeError, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Duration type used for time shifts and gaps.
pub type Interval = TimeDelta;

const EPOCH_OFFSET_SECS: i64 = 946_684_800;
/// `num_days_from_ce` of 2000-01-01.
const CE_DAYS_AT_EPOCH: i32 = 730_120;
pub(crate) const USECS_PER_SEC: i64 = 1_000_000;
pub(crate) const USECS_PER_DAY: i64 = 86_400 * USECS_PER_SEC;

/// A timestamp with time zone, stored in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimestampTz(i64);

impl TimestampTz {
    pub const MIN: Self = Self(i64::MIN);
    pub const MAX: Self = Self(i64::MAX);

    /// Microseconds since 2000-01-01 00:00:00 UTC.
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    pub const fn micros(self) -> i64 {
        self.0
    }

    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp_micros() - EPOCH_OFFSET_SECS * USECS_PER_SEC)
    }

    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        self.0
            .checked_add(EPOCH_OFFSET_SECS * USECS_PER_SEC)
            .and_then(DateTime::from_timestamp_micros)
    }

    /// Build a UTC timestamp from calendar fields.
    pub fn from_ymd_hms(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Result<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            ChronotopeError::OutOfRange(format!("Invalid date {year}-{month}-{day}"))
        })?;
        let time = NaiveTime::from_hms_opt(hour, min, sec).ok_or_else(|| {
            ChronotopeError::OutOfRange(format!("Invalid time {hour}:{min}:{sec}"))
        })?;
        Ok(Self::from_datetime(NaiveDateTime::new(date, time).and_utc()))
    }

    pub fn checked_add(self, delta: Interval) -> Result<Self> {
        let micros = delta.num_microseconds().ok_or_else(|| {
            ChronotopeError::OutOfRange("Interval too large for a timestamp shift".to_string())
        })?;
        self.0
            .checked_add(micros)
            .map(Self)
            .ok_or_else(|| ChronotopeError::OutOfRange("Timestamp out of range".to_string()))
    }

    /// Signed difference `self - earlier`.
    pub fn delta_since(self, earlier: Self) -> Interval {
        TimeDelta::microseconds(self.0.saturating_sub(earlier.0))
    }

    /// Timestamp at fraction `ratio` of the way from `self` to `other`.
    pub(crate) fn lerp(self, other: Self, ratio: f64) -> Self {
        let span = (other.0 - self.0) as f64;
        Self(self.0 + (span * ratio).round() as i64)
    }

    /// Fraction of the way `self` lies between `start` and `end`.
    pub(crate) fn ratio(self, start: Self, end: Self) -> f64 {
        if end.0 == start.0 {
            return 0.0;
        }
        (self.0 - start.0) as f64 / (end.0 - start.0) as f64
    }

    /// Parse the textual timestamp forms accepted by the engine.
    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim().replace('T', " ");
        if text.is_empty() {
            return Err(ChronotopeError::TextInput("Empty timestamp".to_string()));
        }

        let (body, offset_secs) = split_offset(&text)?;
        let (date_part, time_part) = match body.split_once(' ') {
            Some((d, t)) => (d.trim(), Some(t.trim())),
            None => (body.trim(), None),
        };

        let date = NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|e| {
            ChronotopeError::TextInput(format!("Invalid date '{}': {}", date_part, e))
        })?;
        let time = match time_part {
            None | Some("") => NaiveTime::MIN,
            Some(t) => NaiveTime::parse_from_str(t, "%H:%M:%S%.f")
                .or_else(|_| NaiveTime::parse_from_str(t, "%H:%M"))
                .map_err(|e| ChronotopeError::TextInput(format!("Invalid time '{}': {}", t, e)))?,
        };

        let utc = NaiveDateTime::new(date, time) - Duration::seconds(offset_secs);
        Ok(Self::from_datetime(utc.and_utc()))
    }
}

/// Split a trailing UTC offset (`Z`, `+HH`, `+HHMM`, `+HH:MM`) from a timestamp.
fn split_offset(text: &str) -> Result<(&str, i64)> {
    if let Some(body) = text.strip_suffix('Z') {
        return Ok((body, 0));
    }

    // Offsets can only follow the time part, which starts after the date.
    let Some(time_start) = text.find(' ') else {
        return Ok((text, 0));
    };
    let Some(rel) = text[time_start..].rfind(['+', '-']) else {
        return Ok((text, 0));
    };
    let pos = time_start + rel;
    let sign = if text.as_bytes()[pos] == b'-' { -1 } else { 1 };
    let digits: String = text[pos + 1..].chars().filter(|c| *c != ':').collect();

    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i64>(), Ok(0)),
        4 => (digits[..2].parse::<i64>(), digits[2..].parse::<i64>()),
        _ => {
            return Err(ChronotopeError::TextInput(format!(
                "Invalid time zone offset in '{}'",
                text
            )));
        }
    };
    let (Ok(hours), Ok(minutes)) = (hours, minutes) else {
        return Err(ChronotopeError::TextInput(format!(
            "Invalid time zone offset in '{}'",
            text
        )));
    };

    Ok((text[..pos].trim_end(), sign * (hours * 3600 + minutes * 60)))
}

impl fmt::Display for TimestampTz {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::MIN => return write!(f, "-infinity"),
            Self::MAX => return write!(f, "infinity"),
            _ => {}
        }
        let Some(dt) = self.to_datetime() else {
            return write!(f, "{}us", self.0);
        };
        write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S"))?;
        let micros = dt.timestamp_subsec_micros();
        if micros != 0 {
            let frac = format!("{:06}", micros);
            write!(f, ".{}", frac.trim_end_matches('0'))?;
        }
        write!(f, "+00")
    }
}

impl FromStr for TimestampTz {
    type Err = ChronotopeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Date(i32);

impl Date {
    /// Days since 2000-01-01.
    pub const fn from_days(days: i32) -> Self {
        Self(days)
    }

    pub const fn days(self) -> i32 {
        self.0
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        let date = NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
            ChronotopeError::OutOfRange(format!("Invalid date {year}-{month}-{day}"))
        })?;
        Ok(Self::from_naive(date))
    }

    fn from_naive(date: NaiveDate) -> Self {
        Self(date.num_days_from_ce() - CE_DAYS_AT_EPOCH)
    }

    fn to_naive(self) -> Option<NaiveDate> {
        NaiveDate::from_num_days_from_ce_opt(self.0.checked_add(CE_DAYS_AT_EPOCH)?)
    }

    /// Midnight UTC of this date.
    pub fn to_timestamp(self) -> TimestampTz {
        TimestampTz::from_micros(i64::from(self.0) * USECS_PER_DAY)
    }

    pub fn parse(input: &str) -> Result<Self> {
        let text = input.trim();
        NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Self::from_naive)
            .map_err(|e| ChronotopeError::TextInput(format!("Invalid date '{}': {}", text, e)))
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_naive() {
            Some(date) => write!(f, "{}", date.format("%Y-%m-%d")),
            None => write!(f, "{}d", self.0),
        }
    }
}

impl FromStr for Date {
    type Err = ChronotopeError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
