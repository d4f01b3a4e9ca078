//! External transfer entity: the provider-side money movement for a
//! paycheck.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use tally_core::types::{DbId, Timestamp};

/// One provider transfer, 1:1 with a paycheck. Only created after the
/// provider's transfer-creation call succeeds.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Transfer {
    pub id: DbId,
    pub paycheck_id: DbId,
    pub provider_transfer_id: String,
    pub provider_recipient_id: String,
    pub quote_id: String,
    pub status: String,
    pub source_amount: Decimal,
    pub source_currency: String,
    pub target_amount: Decimal,
    pub target_currency: String,
    pub rate: Decimal,
    pub raw_response: Option<serde_json::Value>,
    pub last_event_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert payload assembled by the transfer orchestrator from the
/// provider's responses.
#[derive(Debug, Clone)]
pub struct CreateTransfer {
    pub paycheck_id: DbId,
    pub provider_transfer_id: String,
    pub provider_recipient_id: String,
    pub quote_id: String,
    pub status: String,
    pub source_amount: Decimal,
    pub source_currency: String,
    pub target_amount: Decimal,
    pub target_currency: String,
    pub rate: Decimal,
    pub raw_response: serde_json::Value,
}
