//! Route definitions for the timer and manual time entries.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::{time_entries, timer};
use crate::state::AppState;

/// Time routes mounted at `/time`.
///
/// ```text
/// POST   /toggle        -> timer::toggle
/// GET    /entries       -> time_entries::list_entries
/// POST   /entries       -> time_entries::create_entry
/// PATCH  /entries/{id}  -> time_entries::update_entry
/// DELETE /entries/{id}  -> time_entries::delete_entry
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/toggle", post(timer::toggle))
        .route(
            "/entries",
            get(time_entries::list_entries).post(time_entries::create_entry),
        )
        .route(
            "/entries/{id}",
            patch(time_entries::update_entry).delete(time_entries::delete_entry),
        )
}
