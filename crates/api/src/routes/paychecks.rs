//! Route definitions for paychecks.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::paychecks;
use crate::state::AppState;

/// Paycheck routes mounted at `/paychecks`.
///
/// ```text
/// GET  /                     -> paychecks::list_paychecks
/// GET  /{id}                 -> paychecks::get_paycheck
/// POST /{id}/retry-transfer  -> paychecks::retry_transfer
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(paychecks::list_paychecks))
        .route("/{id}", get(paychecks::get_paycheck))
        .route("/{id}/retry-transfer", post(paychecks::retry_transfer))
}
