//! In-memory snapshot provider.
//!
//! Backs local development, demos and tests. Collections are keyed by id in
//! `BTreeMap`s so snapshots come out in a stable order, and schedules are
//! keyed by routine id so a routine can never hold two schedule rows.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use chrono::{FixedOffset, NaiveDate};
use routinely_core::calendar::local_date;
use routinely_core::routine::{
    Completion, Group, GroupMembership, Routine, Snapshot, WeekdaySchedule,
};
use routinely_core::types::{DbId, Timestamp};
use tokio::sync::RwLock;

use crate::error::{StoreError, StoreResult};
use crate::seed::{self, SeedData};
use crate::source::{MarkOutcome, RoutineStore, ScheduledRoutine, SnapshotSource};

#[derive(Debug, Default)]
struct StoreData {
    routines: BTreeMap<DbId, Routine>,
    groups: BTreeMap<DbId, Group>,
    memberships: BTreeMap<DbId, GroupMembership>,
    schedules: BTreeMap<DbId, WeekdaySchedule>,
    completions: BTreeMap<DbId, Completion>,
    versions: HashMap<DbId, u64>,
}

impl StoreData {
    fn bump(&mut self, user_id: DbId) {
        *self.versions.entry(user_id).or_insert(0) += 1;
    }

    fn routine(&self, routine_id: DbId) -> StoreResult<&Routine> {
        self.routines.get(&routine_id).ok_or(StoreError::NotFound {
            entity: "Routine",
            id: routine_id,
        })
    }

    /// A routine that must belong to `user_id`. Foreign routines are
    /// reported as missing.
    fn owned_routine(&self, user_id: DbId, routine_id: DbId) -> StoreResult<&Routine> {
        self.routines
            .get(&routine_id)
            .filter(|r| r.user_id == user_id)
            .ok_or(StoreError::NotFound {
                entity: "Routine",
                id: routine_id,
            })
    }

    fn next_completion_id(&self) -> DbId {
        self.completions.keys().next_back().map_or(1, |id| id + 1)
    }

    /// Completions of `routine_id` whose local date is `date`.
    fn completions_on(
        &self,
        routine_id: DbId,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> impl Iterator<Item = &Completion> {
        self.completions.values().filter(move |c| {
            c.routine_id == routine_id && local_date(c.completed_at, offset) == date
        })
    }
}

/// Thread-safe in-memory store; designed to be wrapped in `Arc` and shared.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<StoreData>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated from seed data.
    ///
    /// Groups and routines are inserted before the rows that reference them.
    pub async fn from_seed(seed: SeedData) -> StoreResult<Self> {
        let store = Self::new();
        for group in seed.groups {
            store.insert_group(group).await?;
        }
        for routine in seed.routines {
            store.insert_routine(routine).await?;
        }
        for membership in seed.memberships {
            store.insert_membership(membership).await?;
        }
        for schedule in seed.schedules {
            store.upsert_schedule(schedule).await?;
        }
        for completion in seed.completions {
            store.insert_completion(completion).await?;
        }
        Ok(store)
    }

    /// Build a store from a JSON seed file.
    pub async fn from_seed_file(path: &Path) -> StoreResult<Self> {
        let seed = SeedData::from_file(path).await?;
        let counts = (seed.routines.len(), seed.completions.len());
        let store = Self::from_seed(seed).await?;
        tracing::info!(
            path = %path.display(),
            routines = counts.0,
            completions = counts.1,
            "Seeded in-memory store"
        );
        Ok(store)
    }

    // -----------------------------------------------------------------------
    // Inserts
    // -----------------------------------------------------------------------

    pub async fn insert_routine(&self, routine: Routine) -> StoreResult<()> {
        seed::validate_routine(&routine)?;
        let mut data = self.data.write().await;
        if data.routines.contains_key(&routine.id) {
            return Err(StoreError::Duplicate {
                entity: "Routine",
                id: routine.id,
            });
        }
        data.bump(routine.user_id);
        data.routines.insert(routine.id, routine);
        Ok(())
    }

    pub async fn insert_group(&self, group: Group) -> StoreResult<()> {
        seed::validate_group(&group)?;
        let mut data = self.data.write().await;
        if data.groups.contains_key(&group.id) {
            return Err(StoreError::Duplicate {
                entity: "Group",
                id: group.id,
            });
        }
        data.bump(group.user_id);
        data.groups.insert(group.id, group);
        Ok(())
    }

    /// Assign a routine to a group.
    ///
    /// The group must belong to the routine's owner; a foreign group is
    /// reported as missing. Any previous membership row for the same routine
    /// is removed, keeping memberships unique per routine.
    pub async fn insert_membership(&self, membership: GroupMembership) -> StoreResult<()> {
        let mut data = self.data.write().await;
        let user_id = data.routine(membership.routine_id)?.user_id;
        let owned = data
            .groups
            .get(&membership.group_id)
            .is_some_and(|g| g.user_id == user_id);
        if !owned {
            return Err(StoreError::NotFound {
                entity: "Group",
                id: membership.group_id,
            });
        }
        if data.memberships.contains_key(&membership.id) {
            return Err(StoreError::Duplicate {
                entity: "GroupMembership",
                id: membership.id,
            });
        }
        data.memberships
            .retain(|_, m| m.routine_id != membership.routine_id);
        data.memberships.insert(membership.id, membership);
        data.bump(user_id);
        Ok(())
    }

    /// Insert or replace the schedule of a routine.
    pub async fn upsert_schedule(&self, schedule: WeekdaySchedule) -> StoreResult<()> {
        let mut data = self.data.write().await;
        let user_id = data.routine(schedule.routine_id)?.user_id;
        data.schedules.insert(schedule.routine_id, schedule);
        data.bump(user_id);
        Ok(())
    }

    /// Insert a raw completion row. Duplicate rows for the same date are
    /// allowed here; the engine collapses them.
    pub async fn insert_completion(&self, completion: Completion) -> StoreResult<()> {
        let mut data = self.data.write().await;
        data.owned_routine(completion.user_id, completion.routine_id)?;
        if data.completions.contains_key(&completion.id) {
            return Err(StoreError::Duplicate {
                entity: "Completion",
                id: completion.id,
            });
        }
        data.bump(completion.user_id);
        data.completions.insert(completion.id, completion);
        Ok(())
    }
}

#[async_trait]
impl SnapshotSource for MemoryStore {
    async fn load_snapshot(&self, user_id: DbId, utc_offset: FixedOffset) -> StoreResult<Snapshot> {
        let data = self.data.read().await;

        let routines: Vec<Routine> = data
            .routines
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        let owns = |routine_id: &DbId| {
            data.routines
                .get(routine_id)
                .is_some_and(|r| r.user_id == user_id)
        };

        Ok(Snapshot {
            user_id,
            utc_offset,
            schedules: data
                .schedules
                .values()
                .filter(|s| owns(&s.routine_id))
                .copied()
                .collect(),
            groups: data
                .groups
                .values()
                .filter(|g| g.user_id == user_id)
                .cloned()
                .collect(),
            memberships: data
                .memberships
                .values()
                .filter(|m| owns(&m.routine_id))
                .cloned()
                .collect(),
            completions: data
                .completions
                .values()
                .filter(|c| c.user_id == user_id)
                .cloned()
                .collect(),
            routines,
        })
    }

    async fn version(&self, user_id: DbId) -> StoreResult<u64> {
        Ok(self
            .data
            .read()
            .await
            .versions
            .get(&user_id)
            .copied()
            .unwrap_or(0))
    }
}

#[async_trait]
impl RoutineStore for MemoryStore {
    async fn find_scheduled_routine(
        &self,
        user_id: DbId,
        routine_id: DbId,
    ) -> StoreResult<Option<ScheduledRoutine>> {
        let data = self.data.read().await;
        Ok(data
            .owned_routine(user_id, routine_id)
            .ok()
            .map(|routine| ScheduledRoutine {
                routine: routine.clone(),
                schedule: data.schedules.get(&routine_id).copied(),
            }))
    }

    /// Mark a routine done on a local date.
    ///
    /// Idempotent: if a completion already exists for that date the earliest
    /// one is returned and nothing is written.
    async fn mark_completed(
        &self,
        user_id: DbId,
        routine_id: DbId,
        date: NaiveDate,
        completed_at: Timestamp,
        offset: FixedOffset,
    ) -> StoreResult<MarkOutcome> {
        let mut data = self.data.write().await;
        data.owned_routine(user_id, routine_id)?;

        if let Some(existing) = data
            .completions_on(routine_id, date, offset)
            .min_by_key(|c| (c.completed_at, c.id))
        {
            return Ok(MarkOutcome {
                completion: existing.clone(),
                created: false,
            });
        }

        let completion = Completion {
            id: data.next_completion_id(),
            routine_id,
            user_id,
            completed_at,
        };
        data.completions.insert(completion.id, completion.clone());
        data.bump(user_id);

        tracing::debug!(
            user_id,
            routine_id,
            %date,
            completion_id = completion.id,
            "Routine marked completed"
        );
        Ok(MarkOutcome {
            completion,
            created: true,
        })
    }

    /// Remove every completion of a routine on a local date.
    ///
    /// Idempotent: returns how many rows were removed, 0 when the routine
    /// was not completed.
    async fn unmark_completed(
        &self,
        user_id: DbId,
        routine_id: DbId,
        date: NaiveDate,
        offset: FixedOffset,
    ) -> StoreResult<usize> {
        let mut data = self.data.write().await;
        data.owned_routine(user_id, routine_id)?;

        let ids: Vec<DbId> = data
            .completions_on(routine_id, date, offset)
            .map(|c| c.id)
            .collect();
        for id in &ids {
            data.completions.remove(id);
        }
        if !ids.is_empty() {
            data.bump(user_id);
        }

        tracing::debug!(
            user_id,
            routine_id,
            %date,
            removed = ids.len(),
            "Routine unmarked"
        );
        Ok(ids.len())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{Offset, TimeZone, Utc};
    use routinely_core::calendar::parse_date_key;
    use routinely_core::routine::Priority;

    use super::*;

    fn utc() -> FixedOffset {
        Utc.fix()
    }

    fn routine(id: DbId, user_id: DbId) -> Routine {
        Routine {
            id,
            user_id,
            name: format!("Routine {id}"),
            expected_time: None,
            priority: Priority::Medium,
            icon: None,
            group_id: None,
            archived: false,
            archived_at: None,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn group(id: DbId, user_id: DbId) -> Group {
        Group {
            id,
            user_id,
            name: format!("Group {id}"),
            icon: None,
            time_range: None,
        }
    }

    async fn store_with_routine() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_routine(routine(1, 1)).await.unwrap();
        store
    }

    #[tokio::test]
    async fn duplicate_routine_rejected() {
        let store = store_with_routine().await;
        assert_matches!(
            store.insert_routine(routine(1, 1)).await,
            Err(StoreError::Duplicate { entity: "Routine", id: 1 })
        );
    }

    #[tokio::test]
    async fn invalid_routine_rejected() {
        let store = MemoryStore::new();
        let mut r = routine(1, 1);
        r.expected_time = Some("9am".into());
        assert_matches!(store.insert_routine(r).await, Err(StoreError::Invalid { .. }));
    }

    #[tokio::test]
    async fn schedule_requires_routine() {
        let store = MemoryStore::new();
        assert_matches!(
            store.upsert_schedule(WeekdaySchedule::daily(9)).await,
            Err(StoreError::NotFound { entity: "Routine", id: 9 })
        );
    }

    #[tokio::test]
    async fn upsert_schedule_replaces_existing() {
        let store = store_with_routine().await;
        store.upsert_schedule(WeekdaySchedule::daily(1)).await.unwrap();
        store
            .upsert_schedule(WeekdaySchedule::on(1, &[]))
            .await
            .unwrap();
        let snap = store.load_snapshot(1, utc()).await.unwrap();
        assert_eq!(snap.schedules.len(), 1);
        assert!(snap.schedules[0].days().is_empty());
    }

    #[tokio::test]
    async fn membership_is_unique_per_routine() {
        let store = store_with_routine().await;
        store.insert_group(group(10, 1)).await.unwrap();
        store.insert_group(group(20, 1)).await.unwrap();
        store
            .insert_membership(GroupMembership { id: 1, routine_id: 1, group_id: 10 })
            .await
            .unwrap();
        store
            .insert_membership(GroupMembership { id: 2, routine_id: 1, group_id: 20 })
            .await
            .unwrap();
        let snap = store.load_snapshot(1, utc()).await.unwrap();
        assert_eq!(snap.memberships.len(), 1);
        assert_eq!(snap.memberships[0].group_id, 20);
    }

    #[tokio::test]
    async fn membership_requires_group() {
        let store = store_with_routine().await;
        assert_matches!(
            store
                .insert_membership(GroupMembership { id: 1, routine_id: 1, group_id: 99 })
                .await,
            Err(StoreError::NotFound { entity: "Group", id: 99 })
        );
    }

    #[tokio::test]
    async fn membership_in_foreign_group_rejected() {
        let store = store_with_routine().await;
        store.insert_group(group(10, 2)).await.unwrap();
        let version = store.version(1).await.unwrap();

        assert_matches!(
            store
                .insert_membership(GroupMembership { id: 1, routine_id: 1, group_id: 10 })
                .await,
            Err(StoreError::NotFound { entity: "Group", id: 10 })
        );

        let snap = store.load_snapshot(1, utc()).await.unwrap();
        assert!(snap.memberships.is_empty());
        assert_eq!(store.version(1).await.unwrap(), version);
    }

    #[tokio::test]
    async fn snapshot_is_scoped_to_user() {
        let store = store_with_routine().await;
        store.insert_routine(routine(2, 2)).await.unwrap();
        store.insert_group(group(10, 2)).await.unwrap();
        store.upsert_schedule(WeekdaySchedule::daily(1)).await.unwrap();
        store.upsert_schedule(WeekdaySchedule::daily(2)).await.unwrap();

        let snap = store.load_snapshot(1, utc()).await.unwrap();
        assert_eq!(snap.user_id, 1);
        assert_eq!(snap.routines.len(), 1);
        assert_eq!(snap.schedules.len(), 1);
        assert!(snap.groups.is_empty());
    }

    #[tokio::test]
    async fn completion_for_foreign_routine_rejected() {
        let store = store_with_routine().await;
        let completion = Completion {
            id: 1,
            routine_id: 1,
            user_id: 2,
            completed_at: Utc::now(),
        };
        assert_matches!(
            store.insert_completion(completion).await,
            Err(StoreError::NotFound { entity: "Routine", .. })
        );
    }

    #[tokio::test]
    async fn mark_completed_is_idempotent() {
        let store = store_with_routine().await;
        let date = parse_date_key("2024-01-03").unwrap();
        let first_at = Utc.with_ymd_and_hms(2024, 1, 3, 8, 0, 0).unwrap();
        let second_at = Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap();

        let first = store.mark_completed(1, 1, date, first_at, utc()).await.unwrap();
        assert!(first.created);
        let version = store.version(1).await.unwrap();

        let second = store.mark_completed(1, 1, date, second_at, utc()).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.completion, first.completion);
        assert_eq!(store.version(1).await.unwrap(), version);

        let snap = store.load_snapshot(1, utc()).await.unwrap();
        assert_eq!(snap.completions.len(), 1);
    }

    #[tokio::test]
    async fn unmark_removes_all_rows_for_date() {
        let store = store_with_routine().await;
        for (id, hour) in [(1, 7), (2, 12), (3, 20)] {
            store
                .insert_completion(Completion {
                    id,
                    routine_id: 1,
                    user_id: 1,
                    completed_at: Utc.with_ymd_and_hms(2024, 1, 3, hour, 0, 0).unwrap(),
                })
                .await
                .unwrap();
        }
        store
            .insert_completion(Completion {
                id: 4,
                routine_id: 1,
                user_id: 1,
                completed_at: Utc.with_ymd_and_hms(2024, 1, 4, 7, 0, 0).unwrap(),
            })
            .await
            .unwrap();

        let date = parse_date_key("2024-01-03").unwrap();
        assert_eq!(store.unmark_completed(1, 1, date, utc()).await.unwrap(), 3);
        assert_eq!(store.unmark_completed(1, 1, date, utc()).await.unwrap(), 0);

        let snap = store.load_snapshot(1, utc()).await.unwrap();
        assert_eq!(snap.completions.len(), 1);
        assert_eq!(snap.completions[0].id, 4);
    }

    #[tokio::test]
    async fn mark_respects_local_date() {
        let store = store_with_routine().await;
        let plus9 = FixedOffset::east_opt(9 * 3600).unwrap();
        // 20:00 UTC on the 2nd is already the 3rd at UTC+9.
        store
            .insert_completion(Completion {
                id: 1,
                routine_id: 1,
                user_id: 1,
                completed_at: Utc.with_ymd_and_hms(2024, 1, 2, 20, 0, 0).unwrap(),
            })
            .await
            .unwrap();
        let third = parse_date_key("2024-01-03").unwrap();
        let outcome = store
            .mark_completed(1, 1, third, Utc::now(), plus9)
            .await
            .unwrap();
        assert!(!outcome.created);
        assert_eq!(outcome.completion.id, 1);
    }

    #[tokio::test]
    async fn version_bumps_on_change() {
        let store = MemoryStore::new();
        assert_eq!(store.version(1).await.unwrap(), 0);
        store.insert_routine(routine(1, 1)).await.unwrap();
        let v1 = store.version(1).await.unwrap();
        assert!(v1 > 0);
        store.upsert_schedule(WeekdaySchedule::daily(1)).await.unwrap();
        assert!(store.version(1).await.unwrap() > v1);
        assert_eq!(store.version(2).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn scheduled_routine_lookup_hides_foreign_routines() {
        let store = store_with_routine().await;
        store.upsert_schedule(WeekdaySchedule::daily(1)).await.unwrap();

        let found = store.find_scheduled_routine(1, 1).await.unwrap().unwrap();
        assert_eq!(found.routine.id, 1);
        assert_eq!(found.schedule, Some(WeekdaySchedule::daily(1)));

        assert!(store.find_scheduled_routine(2, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scheduled_routine_lookup_without_schedule() {
        let store = store_with_routine().await;
        let found = store.find_scheduled_routine(1, 1).await.unwrap().unwrap();
        assert!(found.schedule.is_none());
    }
}
