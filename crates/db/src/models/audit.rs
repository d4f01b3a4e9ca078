//! Audit log entity for time-entry mutation attribution.
//!
//! Append-only; rows are never updated after insert.

use serde::Serialize;
use sqlx::FromRow;
use tally_core::types::{DbId, Timestamp};
use uuid::Uuid;

/// A single audit record. `details_json` holds the before/after values of
/// the mutated entity.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct AuditLog {
    pub id: DbId,
    pub actor_id: DbId,
    pub batch_id: Uuid,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: Option<DbId>,
    pub details_json: Option<serde_json::Value>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting an audit record.
#[derive(Debug, Clone)]
pub struct CreateAuditLog {
    pub actor_id: DbId,
    pub batch_id: Uuid,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: Option<DbId>,
    pub details_json: Option<serde_json::Value>,
}
