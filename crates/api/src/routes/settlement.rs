//! Route definition for the settlement trigger.

use axum::routing::post;
use axum::Router;

use crate::handlers::settlement;
use crate::state::AppState;

/// Settlement routes mounted at `/settle`.
///
/// ```text
/// POST /{project_id}/{member_id} -> settlement::settle
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/{project_id}/{member_id}", post(settlement::settle))
}
