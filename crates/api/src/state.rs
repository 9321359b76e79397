use std::sync::Arc;

use chrono::NaiveDate;
use routinely_core::daily::DailyView;
use routinely_core::stats::StatsReport;
use routinely_store::RoutineStore;

use crate::cache::QueryCache;
use crate::config::ServerConfig;

/// Cache of daily views, keyed by local date.
pub type DailyCache = QueryCache<NaiveDate, Arc<DailyView>>;

/// Cache of statistics reports, keyed by `(start, end)`.
pub type StatsCache = QueryCache<(NaiveDate, NaiveDate), Arc<StatsReport>>;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Snapshot provider and completion writer.
    pub store: Arc<dyn RoutineStore>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Memoized daily views.
    pub daily_cache: Arc<DailyCache>,
    /// Memoized statistics reports.
    pub stats_cache: Arc<StatsCache>,
}

impl AppState {
    pub fn new(store: Arc<dyn RoutineStore>, config: ServerConfig) -> Self {
        let capacity = config.cache_capacity;
        Self {
            store,
            config: Arc::new(config),
            daily_cache: Arc::new(QueryCache::new(capacity)),
            stats_cache: Arc::new(QueryCache::new(capacity)),
        }
    }
}
