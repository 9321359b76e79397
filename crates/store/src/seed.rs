//! JSON seed fixtures for the in-memory store.
//!
//! ```json
//! {
//!   "groups":      [{ "id": 10, "user_id": 1, "name": "Morning" }],
//!   "routines":    [{ "id": 1, "user_id": 1, "name": "Stretch", "priority": "high",
//!                     "expected_time": "07:00", "created_at": "2024-01-01T00:00:00Z" }],
//!   "memberships": [{ "id": 1, "routine_id": 1, "group_id": 10 }],
//!   "schedules":   [{ "routine_id": 1, "monday": true, "wednesday": true }],
//!   "completions": [{ "id": 1, "routine_id": 1, "user_id": 1,
//!                     "completed_at": "2024-01-03T07:05:00Z" }]
//! }
//! ```

use std::path::Path;

use routinely_core::routine::{Completion, Group, GroupMembership, Routine, WeekdaySchedule};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{StoreError, StoreResult};

/// Contents of a seed file. Every collection is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub routines: Vec<Routine>,
    #[serde(default)]
    pub groups: Vec<Group>,
    #[serde(default)]
    pub memberships: Vec<GroupMembership>,
    #[serde(default)]
    pub schedules: Vec<WeekdaySchedule>,
    #[serde(default)]
    pub completions: Vec<Completion>,
}

impl SeedData {
    /// Parse seed data from a JSON string and validate it.
    pub fn from_json(json: &str) -> StoreResult<Self> {
        let seed: SeedData = serde_json::from_str(json)?;
        seed.validate()?;
        Ok(seed)
    }

    /// Read, parse and validate a seed file.
    pub async fn from_file(path: &Path) -> StoreResult<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| StoreError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_json(&json)
    }

    /// Field-level validation of routines and groups.
    pub fn validate(&self) -> StoreResult<()> {
        for routine in &self.routines {
            validate_routine(routine)?;
        }
        for group in &self.groups {
            validate_group(group)?;
        }
        Ok(())
    }
}

pub(crate) fn validate_routine(routine: &Routine) -> StoreResult<()> {
    routine.validate().map_err(|e| StoreError::Invalid {
        entity: "Routine",
        id: routine.id,
        message: e.to_string(),
    })
}

pub(crate) fn validate_group(group: &Group) -> StoreResult<()> {
    group.validate().map_err(|e| StoreError::Invalid {
        entity: "Group",
        id: group.id,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_object_is_valid_seed() {
        let seed = SeedData::from_json("{}").unwrap();
        assert!(seed.routines.is_empty());
        assert!(seed.completions.is_empty());
    }

    #[test]
    fn parses_full_seed() {
        let json = r#"{
            "groups": [{"id": 10, "user_id": 1, "name": "Morning", "time_range": "06:00-09:00"}],
            "routines": [{"id": 1, "user_id": 1, "name": "Stretch", "priority": "high",
                          "expected_time": "07:00", "group_id": 10,
                          "created_at": "2024-01-01T00:00:00Z"}],
            "schedules": [{"routine_id": 1, "monday": true}],
            "completions": [{"id": 1, "routine_id": 1, "user_id": 1,
                             "completed_at": "2024-01-01T07:05:00Z"}]
        }"#;
        let seed = SeedData::from_json(json).unwrap();
        assert_eq!(seed.routines[0].group_id, Some(10));
        assert!(!seed.routines[0].archived);
        assert!(seed.schedules[0].monday);
        assert!(!seed.schedules[0].tuesday);
    }

    #[test]
    fn unknown_priority_is_parse_error() {
        let json = r#"{"routines": [{"id": 1, "user_id": 1, "name": "x", "priority": "urgent",
                       "created_at": "2024-01-01T00:00:00Z"}]}"#;
        assert_matches!(SeedData::from_json(json), Err(StoreError::Parse(_)));
    }

    #[test]
    fn bad_expected_time_is_invalid() {
        let json = r#"{"routines": [{"id": 7, "user_id": 1, "name": "x", "priority": "low",
                       "expected_time": "25:00", "created_at": "2024-01-01T00:00:00Z"}]}"#;
        assert_matches!(
            SeedData::from_json(json),
            Err(StoreError::Invalid { entity: "Routine", id: 7, .. })
        );
    }

    #[test]
    fn empty_group_name_is_invalid() {
        let json = r#"{"groups": [{"id": 3, "user_id": 1, "name": ""}]}"#;
        assert_matches!(
            SeedData::from_json(json),
            Err(StoreError::Invalid { entity: "Group", id: 3, .. })
        );
    }
}
