//! Daily routine resolution: which routines are due on a date, whether each
//! is done, and how they are grouped and ordered for display.
//!
//! Pure function of a [`Snapshot`]. Ordering never depends on the order in
//! which storage returned rows.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::{parse_date_key, weekday_key, Weekday};
use crate::completion_index::CompletionIndex;
use crate::error::CoreError;
use crate::routine::{Priority, Routine, Snapshot};
use crate::schedule::{index_schedules, is_due};
use crate::types::{DbId, Timestamp};

/// Display name of the synthetic bucket holding routines with no group.
pub const UNGROUPED_LABEL: &str = "Ungrouped";

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// A due routine annotated with its completion state for the date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DueRoutine {
    pub id: DbId,
    pub name: String,
    pub expected_time: Option<String>,
    pub priority: Priority,
    pub icon: Option<String>,
    pub group_id: Option<DbId>,
    pub completed: bool,
    pub completed_at: Option<Timestamp>,
}

/// One display bucket: a real group, or the ungrouped bucket when
/// `group_id` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyGroup {
    pub group_id: Option<DbId>,
    pub name: String,
    pub icon: Option<String>,
    pub time_range: Option<String>,
    pub routines: Vec<DueRoutine>,
}

/// The "due today" view for one user and date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyView {
    pub user_id: DbId,
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub total: usize,
    pub completed: usize,
    pub groups: Vec<DailyGroup>,
}

// ---------------------------------------------------------------------------
// Group assignment
// ---------------------------------------------------------------------------

/// Resolve each owned routine's effective group.
///
/// Membership rows take precedence over `Routine::group_id`; among several
/// rows for one routine the one with the highest id wins. References to
/// groups the user does not own (deleted or foreign) resolve to no group.
pub fn resolve_group_assignments(snapshot: &Snapshot) -> BTreeMap<DbId, DbId> {
    let owned_groups: BTreeSet<DbId> = snapshot
        .groups
        .iter()
        .filter(|g| g.user_id == snapshot.user_id)
        .map(|g| g.id)
        .collect();

    let mut latest_membership: BTreeMap<DbId, (DbId, DbId)> = BTreeMap::new();
    for membership in &snapshot.memberships {
        let slot = latest_membership
            .entry(membership.routine_id)
            .or_insert((membership.id, membership.group_id));
        if membership.id > slot.0 {
            tracing::debug!(
                routine_id = membership.routine_id,
                replaced_group_id = slot.1,
                group_id = membership.group_id,
                "Routine has multiple group memberships, keeping the latest"
            );
            *slot = (membership.id, membership.group_id);
        }
    }

    let mut assignments = BTreeMap::new();
    for routine in snapshot.routines.iter().filter(|r| r.user_id == snapshot.user_id) {
        let group_id = latest_membership
            .get(&routine.id)
            .map(|(_, group_id)| *group_id)
            .or(routine.group_id);

        let Some(group_id) = group_id else {
            continue;
        };
        if owned_groups.contains(&group_id) {
            assignments.insert(routine.id, group_id);
        } else {
            tracing::debug!(
                routine_id = routine.id,
                group_id,
                "Dangling group reference, treating routine as ungrouped"
            );
        }
    }
    assignments
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve the daily view for a `YYYY-MM-DD` date string.
///
/// A malformed date is a caller bug and is rejected with
/// [`CoreError::InvalidDate`].
pub fn resolve_daily(snapshot: &Snapshot, date: &str) -> Result<DailyView, CoreError> {
    let date = parse_date_key(date)?;
    Ok(resolve_daily_on(snapshot, date))
}

/// Resolve the daily view for a parsed local date.
pub fn resolve_daily_on(snapshot: &Snapshot, date: NaiveDate) -> DailyView {
    let offset = snapshot.utc_offset;
    let schedules = index_schedules(&snapshot.schedules);
    let completions = CompletionIndex::for_date(snapshot.owned_completions(), date, offset);
    let assignments = resolve_group_assignments(snapshot);

    // owned_routines() is already in display order.
    let due: Vec<DueRoutine> = snapshot
        .owned_routines()
        .into_iter()
        .filter(|r| is_due(r, schedules.get(&r.id).copied(), date, offset))
        .map(|r| annotate(r, assignments.get(&r.id).copied(), &completions))
        .collect();

    let total = due.len();
    let completed = due.iter().filter(|r| r.completed).count();

    let mut owned_groups: Vec<_> = snapshot
        .groups
        .iter()
        .filter(|g| g.user_id == snapshot.user_id)
        .collect();
    owned_groups.sort_by_key(|g| g.id);

    let mut groups: Vec<DailyGroup> = owned_groups
        .into_iter()
        .map(|g| DailyGroup {
            group_id: Some(g.id),
            name: g.name.clone(),
            icon: g.icon.clone(),
            time_range: g.time_range.clone(),
            routines: due
                .iter()
                .filter(|r| r.group_id == Some(g.id))
                .cloned()
                .collect(),
        })
        .collect();

    groups.push(DailyGroup {
        group_id: None,
        name: UNGROUPED_LABEL.to_string(),
        icon: None,
        time_range: None,
        routines: due.into_iter().filter(|r| r.group_id.is_none()).collect(),
    });

    groups.retain(|g| !g.routines.is_empty());

    tracing::trace!(
        user_id = snapshot.user_id,
        %date,
        total,
        completed,
        buckets = groups.len(),
        "Resolved daily routines"
    );

    DailyView {
        user_id: snapshot.user_id,
        date,
        weekday: weekday_key(date),
        total,
        completed,
        groups,
    }
}

fn annotate(routine: &Routine, group_id: Option<DbId>, completions: &CompletionIndex) -> DueRoutine {
    let mark = completions.get(routine.id);
    DueRoutine {
        id: routine.id,
        name: routine.name.clone(),
        expected_time: routine.expected_time.clone(),
        priority: routine.priority,
        icon: routine.icon.clone(),
        group_id,
        completed: mark.is_some(),
        completed_at: mark.map(|m| m.completed_at),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
