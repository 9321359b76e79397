//! Routine, group, schedule and completion records plus the per-user
//! [`Snapshot`] the engine evaluates.
//!
//! These are plain data carriers. The `core` crate has no storage
//! dependencies; whatever backs a deployment materializes these structs and
//! hands them to the engine.

use std::cmp::Ordering;
use std::sync::LazyLock;

use chrono::FixedOffset;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::calendar::Weekday;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const PRIORITY_HIGH: &str = "high";
pub const PRIORITY_MEDIUM: &str = "medium";
pub const PRIORITY_LOW: &str = "low";

/// Maximum routine / group name length.
pub const MAX_NAME_LENGTH: u64 = 120;

/// Maximum icon identifier length.
pub const MAX_ICON_LENGTH: u64 = 64;

static TIME_OF_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Routine priority. Declaration order is display order: high first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// All priorities, high first.
    pub const ALL: [Priority; 3] = [Self::High, Self::Medium, Self::Low];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => PRIORITY_HIGH,
            Self::Medium => PRIORITY_MEDIUM,
            Self::Low => PRIORITY_LOW,
        }
    }
}

// ---------------------------------------------------------------------------
// Time of day
// ---------------------------------------------------------------------------

/// Minutes since midnight for an `HH:MM` string, or `None` if malformed.
pub fn minutes_of_day(time: &str) -> Option<u32> {
    let caps = TIME_OF_DAY_RE.captures(time)?;
    let hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;
    Some(hours * 60 + minutes)
}

fn validate_time_of_day(time: &str) -> Result<(), ValidationError> {
    if minutes_of_day(time).is_some() {
        Ok(())
    } else {
        let mut err = ValidationError::new("time_of_day");
        err.message = Some(format!("'{time}' is not a valid HH:MM time").into());
        Err(err)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A routine the user wants to perform on scheduled weekdays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Routine {
    pub id: DbId,
    pub user_id: DbId,
    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub name: String,
    /// Expected time of day, `HH:MM` in 24-hour local time.
    #[serde(default)]
    #[validate(custom(function = "validate_time_of_day"))]
    pub expected_time: Option<String>,
    pub priority: Priority,
    #[serde(default)]
    #[validate(length(max = MAX_ICON_LENGTH))]
    pub icon: Option<String>,
    /// Group reference carried on the routine itself (document-style
    /// storage). Overridden by [`GroupMembership`] rows when present.
    #[serde(default)]
    pub group_id: Option<DbId>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub archived_at: Option<Timestamp>,
    pub created_at: Timestamp,
}

impl Routine {
    /// Sort key for the expected time; routines without one sort last.
    pub fn time_sort_key(&self) -> u32 {
        self.expected_time
            .as_deref()
            .and_then(minutes_of_day)
            .unwrap_or(u32::MAX)
    }
}

/// Display order for routines: priority, then expected time (time-less
/// routines last within a tier), then id.
pub fn display_order(a: &Routine, b: &Routine) -> Ordering {
    a.priority
        .cmp(&b.priority)
        .then_with(|| a.time_sort_key().cmp(&b.time_sort_key()))
        .then_with(|| a.id.cmp(&b.id))
}

/// A named, user-owned bucket of routines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct Group {
    pub id: DbId,
    pub user_id: DbId,
    #[validate(length(min = 1, max = MAX_NAME_LENGTH))]
    pub name: String,
    #[serde(default)]
    #[validate(length(max = MAX_ICON_LENGTH))]
    pub icon: Option<String>,
    /// Free-text display hint such as `"06:00-09:00"`. Never used for
    /// scheduling.
    #[serde(default)]
    pub time_range: Option<String>,
}

/// Join row assigning a routine to a group (relational-style storage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMembership {
    pub id: DbId,
    pub routine_id: DbId,
    pub group_id: DbId,
}

/// Which weekdays a routine recurs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdaySchedule {
    pub routine_id: DbId,
    #[serde(default)]
    pub monday: bool,
    #[serde(default)]
    pub tuesday: bool,
    #[serde(default)]
    pub wednesday: bool,
    #[serde(default)]
    pub thursday: bool,
    #[serde(default)]
    pub friday: bool,
    #[serde(default)]
    pub saturday: bool,
    #[serde(default)]
    pub sunday: bool,
}

impl WeekdaySchedule {
    /// A schedule with every day set.
    pub fn daily(routine_id: DbId) -> Self {
        Self::on(routine_id, &Weekday::ALL)
    }

    /// A schedule with exactly the given days set.
    pub fn on(routine_id: DbId, days: &[Weekday]) -> Self {
        let mut schedule = Self {
            routine_id,
            ..Self::default()
        };
        for day in days {
            schedule.set(*day, true);
        }
        schedule
    }

    pub fn is_scheduled(&self, day: Weekday) -> bool {
        match day {
            Weekday::Monday => self.monday,
            Weekday::Tuesday => self.tuesday,
            Weekday::Wednesday => self.wednesday,
            Weekday::Thursday => self.thursday,
            Weekday::Friday => self.friday,
            Weekday::Saturday => self.saturday,
            Weekday::Sunday => self.sunday,
        }
    }

    pub fn set(&mut self, day: Weekday, scheduled: bool) {
        let flag = match day {
            Weekday::Monday => &mut self.monday,
            Weekday::Tuesday => &mut self.tuesday,
            Weekday::Wednesday => &mut self.wednesday,
            Weekday::Thursday => &mut self.thursday,
            Weekday::Friday => &mut self.friday,
            Weekday::Saturday => &mut self.saturday,
            Weekday::Sunday => &mut self.sunday,
        };
        *flag = scheduled;
    }

    /// Days this schedule is set for, Monday first.
    pub fn days(&self) -> Vec<Weekday> {
        Weekday::ALL
            .into_iter()
            .filter(|d| self.is_scheduled(*d))
            .collect()
    }
}

/// A timestamped record that a routine was performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub id: DbId,
    pub routine_id: DbId,
    pub user_id: DbId,
    pub completed_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// Everything the engine needs to answer queries for one user.
///
/// The offset defines the user's local calendar day; every completion
/// timestamp and archival instant is truncated with it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub user_id: DbId,
    pub utc_offset: FixedOffset,
    pub routines: Vec<Routine>,
    pub schedules: Vec<WeekdaySchedule>,
    pub groups: Vec<Group>,
    pub memberships: Vec<GroupMembership>,
    pub completions: Vec<Completion>,
}

impl Snapshot {
    /// An empty snapshot for `user_id`.
    pub fn empty(user_id: DbId, utc_offset: FixedOffset) -> Self {
        Self {
            user_id,
            utc_offset,
            routines: Vec::new(),
            schedules: Vec::new(),
            groups: Vec::new(),
            memberships: Vec::new(),
            completions: Vec::new(),
        }
    }

    /// Routines owned by the snapshot's user, in display order.
    pub fn owned_routines(&self) -> Vec<&Routine> {
        let mut routines: Vec<&Routine> = self
            .routines
            .iter()
            .filter(|r| r.user_id == self.user_id)
            .collect();
        routines.sort_by(|a, b| display_order(a, b));
        routines
    }

    /// Completions logged by the snapshot's user.
    pub fn owned_completions(&self) -> impl Iterator<Item = &Completion> {
        self.completions
            .iter()
            .filter(move |c| c.user_id == self.user_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
