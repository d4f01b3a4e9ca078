//! Route definition for the inbound provider webhook.
//!
//! Mounted at the root level (not under `/api/v1`): the endpoint is
//! authenticated by its HMAC signature, not by a bearer token.

use axum::routing::post;
use axum::Router;

use crate::handlers::webhooks;
use crate::state::AppState;

/// ```text
/// POST /webhooks/payment-provider -> webhooks::payment_provider
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/webhooks/payment-provider",
        post(webhooks::payment_provider),
    )
}
