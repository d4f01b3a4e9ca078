//! Route definitions for ad-hoc payments.

use axum::routing::get;
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Payment routes mounted at `/payments`.
///
/// ```text
/// GET  / -> payments::list_payments
/// POST / -> payments::create_payment
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(payments::list_payments).post(payments::create_payment),
    )
}
