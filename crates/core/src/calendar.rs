//! Calendar helpers shared by the schedule resolver, completion index and
//! statistics engine.
//!
//! Every date the engine works with is a *local* calendar date: instants are
//! truncated with the snapshot's UTC offset before they are compared, so a
//! completion logged at 23:30 local time never lands on the next day.

use std::sync::LazyLock;

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveTime, Offset, TimeDelta, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Canonical date key format (`YYYY-MM-DD`).
pub const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Largest UTC offset accepted by [`parse_utc_offset`], in hours.
const MAX_OFFSET_HOURS: i32 = 14;

static UTC_OFFSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<sign>[+-])(?P<hours>\d{2}):?(?P<minutes>\d{2})$").expect("valid regex")
});

// ---------------------------------------------------------------------------
// Weekday
// ---------------------------------------------------------------------------

/// Day of the week, used as the key into a [`WeekdaySchedule`].
///
/// [`WeekdaySchedule`]: crate::routine::WeekdaySchedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// All weekdays, Monday first.
    pub const ALL: [Weekday; 7] = [
        Self::Monday,
        Self::Tuesday,
        Self::Wednesday,
        Self::Thursday,
        Self::Friday,
        Self::Saturday,
        Self::Sunday,
    ];

    /// The weekday a local calendar date falls on.
    pub fn from_date(date: NaiveDate) -> Self {
        match date.weekday() {
            chrono::Weekday::Mon => Self::Monday,
            chrono::Weekday::Tue => Self::Tuesday,
            chrono::Weekday::Wed => Self::Wednesday,
            chrono::Weekday::Thu => Self::Thursday,
            chrono::Weekday::Fri => Self::Friday,
            chrono::Weekday::Sat => Self::Saturday,
            chrono::Weekday::Sun => Self::Sunday,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monday => "monday",
            Self::Tuesday => "tuesday",
            Self::Wednesday => "wednesday",
            Self::Thursday => "thursday",
            Self::Friday => "friday",
            Self::Saturday => "saturday",
            Self::Sunday => "sunday",
        }
    }
}

/// Map a calendar date to its schedule key.
pub fn weekday_key(date: NaiveDate) -> Weekday {
    Weekday::from_date(date)
}

// ---------------------------------------------------------------------------
// Date keys
// ---------------------------------------------------------------------------

/// Format a date as its canonical `YYYY-MM-DD` key.
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

/// Parse a strict `YYYY-MM-DD` date key.
///
/// Rejects anything that is not exactly ten characters of zero-padded
/// digits, so `2024-1-5` and `2024-01-05T00:00` both fail instead of being
/// silently coerced.
pub fn parse_date_key(input: &str) -> Result<NaiveDate, CoreError> {
    let bytes = input.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !well_formed {
        return Err(CoreError::InvalidDate(format!(
            "'{input}' is not in YYYY-MM-DD format"
        )));
    }

    NaiveDate::parse_from_str(input, DATE_KEY_FORMAT)
        .map_err(|e| CoreError::InvalidDate(format!("'{input}' is not a calendar date: {e}")))
}

// ---------------------------------------------------------------------------
// Instants and local days
// ---------------------------------------------------------------------------

/// The local calendar date of an instant.
pub fn local_date(instant: Timestamp, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// The UTC instant at which `date` begins in the local timezone.
pub fn start_of_day(date: NaiveDate, offset: FixedOffset) -> Timestamp {
    let local_midnight = date.and_time(NaiveTime::MIN);
    let utc = local_midnight - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
    Timestamp::from_naive_utc_and_offset(utc, Utc)
}

/// Iterate every date from `start` to `end` inclusive.
///
/// Yields nothing when `start > end`.
pub fn dates_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

/// Number of dates in the inclusive range, or 0 when `start > end`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> i64 {
    if start > end {
        0
    } else {
        (end - start).num_days() + 1
    }
}

/// Parse a UTC offset such as `+05:30`, `-0800`, `Z` or `UTC`.
pub fn parse_utc_offset(input: &str) -> Result<FixedOffset, CoreError> {
    let trimmed = input.trim();
    if trimmed.eq_ignore_ascii_case("z") || trimmed.eq_ignore_ascii_case("utc") {
        return Ok(Utc.fix());
    }

    let caps = UTC_OFFSET_RE.captures(trimmed).ok_or_else(|| {
        CoreError::Validation(format!("Invalid UTC offset '{input}'. Expected e.g. +02:00"))
    })?;

    let hours: i32 = caps["hours"].parse().unwrap_or(i32::MAX);
    let minutes: i32 = caps["minutes"].parse().unwrap_or(i32::MAX);
    if hours > MAX_OFFSET_HOURS || minutes >= 60 {
        return Err(CoreError::Validation(format!(
            "UTC offset '{input}' is out of range"
        )));
    }

    let sign = if &caps["sign"] == "-" { -1 } else { 1 };
    let seconds = sign * (hours * 3600 + minutes * 60);
    FixedOffset::east_opt(seconds)
        .ok_or_else(|| CoreError::Validation(format!("UTC offset '{input}' is out of range")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
