//! Paycheck entity: the settlement artifact awaiting external payment.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use tally_core::types::{DbId, Timestamp};

/// One settlement run's payable record for one member. Totals are final
/// once entries are linked; corrections require a new record.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Paycheck {
    pub id: DbId,
    pub member_id: DbId,
    pub project_id: DbId,
    pub total_hours: Decimal,
    pub total_amount: Decimal,
    pub currency: String,
    pub status: String,
    pub payment_method: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
