//! Due-date resolution for a single routine.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use chrono::{FixedOffset, NaiveDate};

use crate::calendar::{local_date, weekday_key};
use crate::routine::{Routine, WeekdaySchedule};
use crate::types::DbId;

/// Index schedules by routine id.
///
/// A routine has at most one schedule. If the input carries more than one
/// row for the same routine the first row wins and the rest are ignored.
pub fn index_schedules(schedules: &[WeekdaySchedule]) -> BTreeMap<DbId, &WeekdaySchedule> {
    let mut index = BTreeMap::new();
    for schedule in schedules {
        match index.entry(schedule.routine_id) {
            Entry::Vacant(slot) => {
                slot.insert(schedule);
            }
            Entry::Occupied(_) => {
                tracing::debug!(
                    routine_id = schedule.routine_id,
                    "Ignoring duplicate weekday schedule"
                );
            }
        }
    }
    index
}

/// Last local date on which an archived routine can still be due.
///
/// Returns `None` for routines that are not archived. An archived routine
/// without an archival timestamp has no known cut-over date; it yields
/// `Some(NaiveDate::MIN)` so it is never due.
pub fn archival_cutoff(routine: &Routine, offset: FixedOffset) -> Option<NaiveDate> {
    if !routine.archived {
        return None;
    }
    Some(
        routine
            .archived_at
            .map(|at| local_date(at, offset))
            .unwrap_or(NaiveDate::MIN),
    )
}

/// Decide whether `routine` is due on the local calendar date `date`.
///
/// - No schedule row: never due.
/// - Archived: not due after the local archival date; on or before it the
///   weekday flag still applies so history stays accurate.
/// - Otherwise: the schedule's flag for the date's weekday.
pub fn is_due(
    routine: &Routine,
    schedule: Option<&WeekdaySchedule>,
    date: NaiveDate,
    offset: FixedOffset,
) -> bool {
    let Some(schedule) = schedule else {
        return false;
    };

    if let Some(cutoff) = archival_cutoff(routine, offset) {
        if date > cutoff {
            return false;
        }
    }

    schedule.is_scheduled(weekday_key(date))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
