pub mod health;
pub mod users;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /users/{user_id}/daily                                    daily view (GET)
/// /users/{user_id}/stats                                    statistics (GET)
/// /users/{user_id}/routines/{routine_id}/due                due check (GET)
/// /users/{user_id}/routines/{routine_id}/completions/{date} mark, unmark (PUT, DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/users", users::router())
}
