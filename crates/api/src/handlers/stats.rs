//! Handlers for completion statistics.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use routinely_core::stats::{compute_stats_between, validate_range, StatsReport};
use routinely_core::types::DbId;
use routinely_store::SnapshotSource;

use crate::error::AppResult;
use crate::query::RangeParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/users/{user_id}/stats?start=YYYY-MM-DD&end=YYYY-MM-DD
///
/// Per-date, per-priority and per-routine completion statistics with
/// streaks, over an inclusive range.
pub async fn get_stats(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Query(params): Query<RangeParams>,
) -> AppResult<Json<DataResponse<Arc<StatsReport>>>> {
    let (start, end) = params.resolve()?;
    // Reject bad ranges before touching the store.
    validate_range(start, end)?;

    let version = state.store.version(user_id).await?;
    if let Some(report) = state.stats_cache.get(user_id, (start, end), version).await {
        tracing::debug!(user_id, %start, %end, "Stats served from cache");
        return Ok(Json(DataResponse { data: report }));
    }

    let snapshot = state
        .store
        .load_snapshot(user_id, state.config.utc_offset)
        .await?;
    let report = Arc::new(compute_stats_between(&snapshot, start, end)?);
    state
        .stats_cache
        .insert(user_id, (start, end), version, Arc::clone(&report))
        .await;

    tracing::info!(
        user_id,
        %start,
        %end,
        total = report.overall.total,
        completed = report.overall.completed,
        current_streak = report.overall.current_streak,
        "Computed stats"
    );
    Ok(Json(DataResponse { data: report }))
}
