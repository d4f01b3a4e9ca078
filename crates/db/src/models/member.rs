//! Member entity and the weekly-limit configuration projection.
//!
//! Members are owned by an external membership service; this layer reads
//! the projection needed for tracking, limit enforcement, and settlement.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;
use tally_core::types::{DbId, Timestamp};

/// A workspace member.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Member {
    pub id: DbId,
    pub display_name: String,
    pub email: String,
    pub billable_rate: Decimal,
    pub currency: String,
    pub timezone: String,
    pub weekly_limit_enabled: bool,
    pub weekly_limit_hours: Decimal,
    pub provider_recipient_id: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The subset of member fields the weekly limit enforcer needs.
#[derive(Debug, Clone, FromRow)]
pub struct MemberLimitConfig {
    pub member_id: DbId,
    pub weekly_limit_enabled: bool,
    pub weekly_limit_hours: Decimal,
    pub timezone: String,
}
