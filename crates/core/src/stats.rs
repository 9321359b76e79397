//! Completion statistics over a date range.
//!
//! Every date in the range is resolved with the same due/completed rules as
//! the daily view. Overall totals are sums of the per-date rows, so
//! `overall.completed <= overall.total` always holds exactly.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{dates_between, days_inclusive, parse_date_key};
use crate::completion_index::RangeIndex;
use crate::error::CoreError;
use crate::routine::{Priority, Snapshot};
use crate::schedule::{index_schedules, is_due};
use crate::types::DbId;

/// Longest range, in days, a single statistics query may cover.
pub const MAX_STATS_RANGE_DAYS: i64 = 731;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateStat {
    pub date: NaiveDate,
    pub total: u32,
    pub completed: u32,
    pub percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriorityStat {
    pub priority: Priority,
    pub total: u32,
    pub completed: u32,
    pub percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineStat {
    pub routine_id: DbId,
    pub name: String,
    pub priority: Priority,
    pub total: u32,
    pub completed: u32,
    pub percentage: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallStat {
    /// Number of dates in the range.
    pub days: u32,
    pub total: u32,
    pub completed: u32,
    pub percentage: u8,
    /// Trailing run of days with at least one completion, ending at the
    /// most recent date. Days with nothing due are skipped.
    pub current_streak: u32,
    /// Longest such run anywhere in the range.
    pub longest_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsReport {
    pub user_id: DbId,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub by_date: Vec<DateStat>,
    pub by_priority: Vec<PriorityStat>,
    pub by_routine: Vec<RoutineStat>,
    pub overall: OverallStat,
}

// ---------------------------------------------------------------------------
// Arithmetic helpers
// ---------------------------------------------------------------------------

/// `round(completed / total * 100)`, or 0 when `total` is 0.
///
/// Rounds half up. Clamped to 100 so a caller passing `completed > total`
/// still gets a valid percentage.
pub fn percentage(completed: u32, total: u32) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = u64::from(completed.min(total));
    let total = u64::from(total);
    ((completed * 200 + total) / (total * 2)) as u8
}

/// Trailing streak ending at the last row, skipping zero-due days.
pub fn current_streak(by_date: &[DateStat]) -> u32 {
    let mut streak = 0;
    for day in by_date.iter().rev() {
        if day.total == 0 {
            continue;
        }
        if day.completed == 0 {
            break;
        }
        streak += 1;
    }
    streak
}

/// Longest run of days with a completion, skipping zero-due days.
pub fn longest_streak(by_date: &[DateStat]) -> u32 {
    let mut longest = 0;
    let mut run = 0;
    for day in by_date {
        if day.total == 0 {
            continue;
        }
        if day.completed == 0 {
            run = 0;
        } else {
            run += 1;
            longest = longest.max(run);
        }
    }
    longest
}

/// Validate a statistics range.
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> Result<(), CoreError> {
    if start > end {
        return Err(CoreError::Validation(format!(
            "Range start {start} is after end {end}"
        )));
    }
    let days = days_inclusive(start, end);
    if days > MAX_STATS_RANGE_DAYS {
        return Err(CoreError::Validation(format!(
            "Range covers {days} days; at most {MAX_STATS_RANGE_DAYS} are allowed"
        )));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Computation
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Tally {
    total: u32,
    completed: u32,
}

impl Tally {
    fn record(&mut self, completed: bool) {
        self.total += 1;
        if completed {
            self.completed += 1;
        }
    }
}

/// Compute statistics for `YYYY-MM-DD` range bounds (inclusive).
pub fn compute_stats(snapshot: &Snapshot, start: &str, end: &str) -> Result<StatsReport, CoreError> {
    let start = parse_date_key(start)?;
    let end = parse_date_key(end)?;
    compute_stats_between(snapshot, start, end)
}

/// Compute statistics for parsed local dates (inclusive).
pub fn compute_stats_between(
    snapshot: &Snapshot,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<StatsReport, CoreError> {
    validate_range(start, end)?;

    let offset = snapshot.utc_offset;
    let schedules = index_schedules(&snapshot.schedules);
    let routines = snapshot.owned_routines();
    let completions = RangeIndex::build(snapshot.owned_completions(), start, end, offset);

    let mut by_date = Vec::new();
    let mut per_priority: BTreeMap<Priority, Tally> = BTreeMap::new();
    let mut per_routine: BTreeMap<DbId, Tally> = BTreeMap::new();

    for date in dates_between(start, end) {
        let mut day = Tally::default();
        for routine in &routines {
            if !is_due(routine, schedules.get(&routine.id).copied(), date, offset) {
                continue;
            }
            let done = completions.contains(date, routine.id);
            day.record(done);
            per_priority.entry(routine.priority).or_default().record(done);
            per_routine.entry(routine.id).or_default().record(done);
        }
        by_date.push(DateStat {
            date,
            total: day.total,
            completed: day.completed,
            percentage: percentage(day.completed, day.total),
        });
    }

    let by_priority = Priority::ALL
        .into_iter()
        .map(|priority| {
            let tally = per_priority.remove(&priority).unwrap_or_default();
            PriorityStat {
                priority,
                total: tally.total,
                completed: tally.completed,
                percentage: percentage(tally.completed, tally.total),
            }
        })
        .collect();

    let by_routine = routines
        .iter()
        .filter_map(|routine| {
            let tally = per_routine.get(&routine.id)?;
            Some(RoutineStat {
                routine_id: routine.id,
                name: routine.name.clone(),
                priority: routine.priority,
                total: tally.total,
                completed: tally.completed,
                percentage: percentage(tally.completed, tally.total),
            })
        })
        .collect();

    let total: u32 = by_date.iter().map(|d| d.total).sum();
    let completed: u32 = by_date.iter().map(|d| d.completed).sum();
    let overall = OverallStat {
        days: by_date.len() as u32,
        total,
        completed,
        percentage: percentage(completed, total),
        current_streak: current_streak(&by_date),
        longest_streak: longest_streak(&by_date),
    };

    tracing::trace!(
        user_id = snapshot.user_id,
        %start,
        %end,
        total,
        completed,
        "Computed completion statistics"
    );

    Ok(StatsReport {
        user_id: snapshot.user_id,
        start,
        end,
        by_date,
        by_priority,
        by_routine,
        overall,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
