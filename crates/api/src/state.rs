use std::sync::Arc;

use tally_payments::PaymentProvider;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: tally_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Payment provider client; a stub in tests, the HTTP client in
    /// production.
    pub provider: Arc<dyn PaymentProvider>,
}
