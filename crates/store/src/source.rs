//! The seams between the engine's callers and whatever holds the data.

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate};
use routinely_core::routine::{Completion, Routine, Snapshot, WeekdaySchedule};
use routinely_core::types::{DbId, Timestamp};

use crate::error::StoreResult;

/// A provider of per-user snapshots.
///
/// Implementations must return all five collections from one consistent
/// read so the engine never sees a completion for a routine that the same
/// snapshot does not contain.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Load everything owned by `user_id`.
    async fn load_snapshot(&self, user_id: DbId, utc_offset: FixedOffset) -> StoreResult<Snapshot>;

    /// Monotonic counter bumped whenever the user's data changes. Used by
    /// callers as part of their memoization key.
    async fn version(&self, user_id: DbId) -> StoreResult<u64>;
}

/// A routine together with its schedule, read in one step.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledRoutine {
    pub routine: Routine,
    pub schedule: Option<WeekdaySchedule>,
}

/// Outcome of [`RoutineStore::mark_completed`].
#[derive(Debug, Clone, PartialEq)]
pub struct MarkOutcome {
    pub completion: Completion,
    /// `false` when the routine was already completed on that date.
    pub created: bool,
}

/// Snapshot provider that also serves single-routine lookups and toggles
/// completions. Routines owned by another user are treated as missing.
#[async_trait]
pub trait RoutineStore: SnapshotSource {
    /// A routine owned by `user_id` and its schedule, if the routine exists.
    async fn find_scheduled_routine(
        &self,
        user_id: DbId,
        routine_id: DbId,
    ) -> StoreResult<Option<ScheduledRoutine>>;

    /// Mark a routine done on a local date. Idempotent.
    async fn mark_completed(
        &self,
        user_id: DbId,
        routine_id: DbId,
        date: NaiveDate,
        completed_at: Timestamp,
        offset: FixedOffset,
    ) -> StoreResult<MarkOutcome>;

    /// Remove every completion of a routine on a local date and return how
    /// many rows went. Idempotent.
    async fn unmark_completed(
        &self,
        user_id: DbId,
        routine_id: DbId,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> StoreResult<usize>;
}
