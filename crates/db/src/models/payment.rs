//! Ad-hoc payment entity: one-off manual payouts outside the settlement
//! pipeline, sharing the provider's status vocabulary.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tally_core::types::{DbId, Timestamp};

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: DbId,
    pub payee_id: DbId,
    pub amount: Decimal,
    pub currency: String,
    pub status: String,
    pub provider_transfer_id: Option<String>,
    pub last_event_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a manual payment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePayment {
    pub payee_id: DbId,
    pub amount: Decimal,
    pub currency: String,
}
