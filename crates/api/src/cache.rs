//! Memoization of engine results.
//!
//! The engine is a pure function of a snapshot, so a result can be reused
//! for as long as the user's data is unchanged. Entries are keyed by the
//! store's per-user version counter; any write bumps the version and makes
//! older entries unreachable.

use std::collections::HashMap;
use std::hash::Hash;

use routinely_core::types::DbId;
use tokio::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey<Q> {
    user_id: DbId,
    query: Q,
    version: u64,
}

/// Bounded map from `(user_id, query, version)` to a computed result.
///
/// When full, the cache is cleared rather than tracking recency; results
/// are cheap to recompute.
pub struct QueryCache<Q, V> {
    capacity: usize,
    entries: Mutex<HashMap<CacheKey<Q>, V>>,
}

impl<Q, V> QueryCache<Q, V>
where
    Q: Eq + Hash,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Look up a result computed against `version` of the user's data.
    pub async fn get(&self, user_id: DbId, query: Q, version: u64) -> Option<V> {
        let key = CacheKey {
            user_id,
            query,
            version,
        };
        self.entries.lock().await.get(&key).cloned()
    }

    /// Store a result. Entries for the same user at older versions are
    /// dropped first.
    pub async fn insert(&self, user_id: DbId, query: Q, version: u64, value: V) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().await;
        entries.retain(|k, _| k.user_id != user_id || k.version >= version);
        if entries.len() >= self.capacity {
            tracing::debug!(capacity = self.capacity, "Query cache full, clearing");
            entries.clear();
        }
        entries.insert(
            CacheKey {
                user_id,
                query,
                version,
            },
            value,
        );
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
