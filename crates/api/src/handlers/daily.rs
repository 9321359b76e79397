//! Handlers for the per-user daily view.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use routinely_core::daily::{resolve_daily_on, DailyView};
use routinely_core::types::DbId;
use routinely_store::SnapshotSource;

use crate::error::AppResult;
use crate::query::DateParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/users/{user_id}/daily?date=YYYY-MM-DD
///
/// Routines due on the date, ordered and grouped for display. The date
/// defaults to today in the configured offset.
pub async fn get_daily(
    State(state): State<AppState>,
    Path(user_id): Path<DbId>,
    Query(params): Query<DateParams>,
) -> AppResult<Json<DataResponse<Arc<DailyView>>>> {
    let date = params.resolve(&state)?;
    let version = state.store.version(user_id).await?;

    if let Some(view) = state.daily_cache.get(user_id, date, version).await {
        tracing::debug!(user_id, %date, "Daily view served from cache");
        return Ok(Json(DataResponse { data: view }));
    }

    let snapshot = state
        .store
        .load_snapshot(user_id, state.config.utc_offset)
        .await?;
    let view = Arc::new(resolve_daily_on(&snapshot, date));
    state
        .daily_cache
        .insert(user_id, date, version, Arc::clone(&view))
        .await;

    tracing::info!(
        user_id,
        %date,
        total = view.total,
        completed = view.completed,
        "Resolved daily view"
    );
    Ok(Json(DataResponse { data: view }))
}
