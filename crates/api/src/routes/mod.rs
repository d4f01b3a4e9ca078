pub mod health;
pub mod paychecks;
pub mod payments;
pub mod settlement;
pub mod time;
pub mod webhooks;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /time/toggle                      start/stop the caller's timer (POST)
/// /time/entries                     list (GET), create manual (POST)
/// /time/entries/{id}                edit manual (PATCH), delete (DELETE)
///
/// /settle/{project_id}/{member_id}  run settlement + provider transfer (POST)
///
/// /paychecks                        list (GET)
/// /paychecks/{id}                   paycheck + transfer detail (GET)
/// /paychecks/{id}/retry-transfer    resume a stuck transfer (POST)
///
/// /payments                         list for payee (GET), ad-hoc payout (POST)
/// ```
///
/// The provider webhook (`/webhooks/payment-provider`) and the health
/// check are mounted at the root level, outside `/api/v1`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Timer toggle and manual time entries.
        .nest("/time", time::router())
        // Settlement trigger.
        .nest("/settle", settlement::router())
        // Paycheck status surface and transfer retry.
        .nest("/paychecks", paychecks::router())
        // Ad-hoc manual payouts.
        .nest("/payments", payments::router())
}
