//! Route definitions for the `/users` resource.

use axum::routing::{get, put};
use axum::Router;

use crate::handlers::{completions, daily, due, stats};
use crate::state::AppState;

/// Routes mounted at `/users`.
///
/// ```text
/// GET    /{user_id}/daily                                    -> get_daily (?date=)
/// GET    /{user_id}/stats                                    -> get_stats (?start=&end=)
/// GET    /{user_id}/routines/{routine_id}/due                -> get_due (?date=)
/// PUT    /{user_id}/routines/{routine_id}/completions/{date} -> mark_completed
/// DELETE /{user_id}/routines/{routine_id}/completions/{date} -> unmark_completed
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{user_id}/daily", get(daily::get_daily))
        .route("/{user_id}/stats", get(stats::get_stats))
        .route("/{user_id}/routines/{routine_id}/due", get(due::get_due))
        .route(
            "/{user_id}/routines/{routine_id}/completions/{date}",
            put(completions::mark_completed).delete(completions::unmark_completed),
        )
}
