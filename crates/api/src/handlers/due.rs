//! Handler for the single-routine due check.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDate;
use routinely_core::calendar::{weekday_key, Weekday};
use routinely_core::error::CoreError;
use routinely_core::schedule::is_due;
use routinely_core::types::DbId;
use routinely_store::RoutineStore;
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::query::DateParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Response payload for the due check.
#[derive(Debug, Serialize)]
pub struct DueResponse {
    pub routine_id: DbId,
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub due: bool,
}

/// GET /api/v1/users/{user_id}/routines/{routine_id}/due?date=YYYY-MM-DD
///
/// Returns 404 if the routine does not exist or belongs to another user.
pub async fn get_due(
    State(state): State<AppState>,
    Path((user_id, routine_id)): Path<(DbId, DbId)>,
    Query(params): Query<DateParams>,
) -> AppResult<Json<DataResponse<DueResponse>>> {
    let date = params.resolve(&state)?;
    let found = state
        .store
        .find_scheduled_routine(user_id, routine_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Routine",
            id: routine_id,
        }))?;

    let due = is_due(
        &found.routine,
        found.schedule.as_ref(),
        date,
        state.config.utc_offset,
    );

    Ok(Json(DataResponse {
        data: DueResponse {
            routine_id,
            date,
            weekday: weekday_key(date),
            due,
        },
    }))
}
