//! Handlers for marking routines done and undone.
//!
//! Both operations are idempotent and keyed by local calendar date, so a
//! client can toggle a checkbox without knowing completion ids.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use routinely_core::calendar::{local_date, parse_date_key, start_of_day};
use routinely_core::routine::Completion;
use routinely_core::types::DbId;
use routinely_store::RoutineStore;

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

/// PUT /api/v1/users/{user_id}/routines/{routine_id}/completions/{date}
///
/// Returns 201 with the new completion, or 200 with the existing one if the
/// routine was already completed on that date. Completions for today are
/// stamped with the current time; other dates with the local start of day.
pub async fn mark_completed(
    State(state): State<AppState>,
    Path((user_id, routine_id, date)): Path<(DbId, DbId, String)>,
) -> AppResult<(StatusCode, Json<DataResponse<Completion>>)> {
    let date = parse_date_key(&date)?;
    let offset = state.config.utc_offset;

    let now = Utc::now();
    let completed_at = if local_date(now, offset) == date {
        now
    } else {
        start_of_day(date, offset)
    };

    let outcome = state
        .store
        .mark_completed(user_id, routine_id, date, completed_at, offset)
        .await?;

    let status = if outcome.created {
        tracing::info!(user_id, routine_id, %date, "Routine completed");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(DataResponse {
            data: outcome.completion,
        }),
    ))
}

/// DELETE /api/v1/users/{user_id}/routines/{routine_id}/completions/{date}
///
/// Removes every completion of the routine on that date. Returns 204 even
/// when there was nothing to remove.
pub async fn unmark_completed(
    State(state): State<AppState>,
    Path((user_id, routine_id, date)): Path<(DbId, DbId, String)>,
) -> AppResult<StatusCode> {
    let date = parse_date_key(&date)?;
    let removed = state
        .store
        .unmark_completed(user_id, routine_id, date, state.config.utc_offset)
        .await?;

    if removed > 0 {
        tracing::info!(user_id, routine_id, %date, removed, "Routine completion removed");
    }
    Ok(StatusCode::NO_CONTENT)
}
