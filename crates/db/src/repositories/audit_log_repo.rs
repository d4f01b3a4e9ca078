//! Repository for the `audit_logs` table (append-only).

use sqlx::PgPool;
use tally_core::types::DbId;

use crate::models::audit::{AuditLog, CreateAuditLog};

const COLUMNS: &str = "\
    id, actor_id, batch_id, action_type, entity_type, entity_id, \
    details_json, created_at, updated_at";

pub struct AuditLogRepo;

impl AuditLogRepo {
    pub async fn insert(pool: &PgPool, entry: &CreateAuditLog) -> Result<AuditLog, sqlx::Error> {
        let query = format!(
            "INSERT INTO audit_logs \
                 (actor_id, batch_id, action_type, entity_type, entity_id, details_json) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entry.actor_id)
            .bind(entry.batch_id)
            .bind(&entry.action_type)
            .bind(&entry.entity_type)
            .bind(entry.entity_id)
            .bind(&entry.details_json)
            .fetch_one(pool)
            .await
    }

    /// History for one entity, oldest first (dispute-resolution view).
    pub async fn list_for_entity(
        pool: &PgPool,
        entity_type: &str,
        entity_id: DbId,
    ) -> Result<Vec<AuditLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM audit_logs \
             WHERE entity_type = $1 AND entity_id = $2 \
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, AuditLog>(&query)
            .bind(entity_type)
            .bind(entity_id)
            .fetch_all(pool)
            .await
    }
}
