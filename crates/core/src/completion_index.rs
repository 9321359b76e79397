//! Completion lookups keyed by routine and local date.
//!
//! Storage may hold several completion rows for the same (routine, date)
//! pair, e.g. after a double tap. Both indexes collapse those into a single
//! membership so nothing downstream double-counts them.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{FixedOffset, NaiveDate};
use serde::Serialize;

use crate::calendar::local_date;
use crate::routine::Completion;
use crate::types::{DbId, Timestamp};

/// Completion state of one routine on one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompletionMark {
    /// Earliest completion instant logged for the date.
    pub completed_at: Timestamp,
    /// Number of raw completion rows collapsed into this mark.
    pub entries: usize,
}

/// Completions for a single local date, keyed by routine id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionIndex {
    marks: BTreeMap<DbId, CompletionMark>,
}

impl CompletionIndex {
    /// Index the completions whose local date equals `date`.
    pub fn for_date<'a, I>(completions: I, date: NaiveDate, offset: FixedOffset) -> Self
    where
        I: IntoIterator<Item = &'a Completion>,
    {
        let mut marks: BTreeMap<DbId, CompletionMark> = BTreeMap::new();
        for completion in completions {
            if local_date(completion.completed_at, offset) != date {
                continue;
            }
            marks
                .entry(completion.routine_id)
                .and_modify(|mark| {
                    mark.entries += 1;
                    if completion.completed_at < mark.completed_at {
                        mark.completed_at = completion.completed_at;
                    }
                })
                .or_insert(CompletionMark {
                    completed_at: completion.completed_at,
                    entries: 1,
                });
        }
        Self { marks }
    }

    pub fn get(&self, routine_id: DbId) -> Option<&CompletionMark> {
        self.marks.get(&routine_id)
    }

    pub fn is_completed(&self, routine_id: DbId) -> bool {
        self.marks.contains_key(&routine_id)
    }

    /// Number of distinct routines completed on the date.
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

/// Distinct completed routine ids per local date over an inclusive range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RangeIndex {
    by_date: BTreeMap<NaiveDate, BTreeSet<DbId>>,
}

impl RangeIndex {
    /// Group completions by local date, dropping dates outside
    /// `start..=end`.
    pub fn build<'a, I>(completions: I, start: NaiveDate, end: NaiveDate, offset: FixedOffset) -> Self
    where
        I: IntoIterator<Item = &'a Completion>,
    {
        let mut by_date: BTreeMap<NaiveDate, BTreeSet<DbId>> = BTreeMap::new();
        for completion in completions {
            let date = local_date(completion.completed_at, offset);
            if date < start || date > end {
                continue;
            }
            by_date.entry(date).or_default().insert(completion.routine_id);
        }
        Self { by_date }
    }

    /// Whether `routine_id` has at least one completion on `date`.
    pub fn contains(&self, date: NaiveDate, routine_id: DbId) -> bool {
        self.by_date
            .get(&date)
            .is_some_and(|ids| ids.contains(&routine_id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
