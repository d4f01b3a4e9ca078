pub mod paychecks;
pub mod payments;
pub mod settlement;
pub mod time_entries;
pub mod timer;
pub mod webhooks;

use sqlx::PgPool;
use tally_core::audit::AuditContext;
use tally_core::types::DbId;
use tally_db::models::audit::CreateAuditLog;
use tally_db::repositories::AuditLogRepo;

/// Record an audit row for a time-entry mutation.
///
/// Audit writes are best-effort: a failure is logged but never fails the
/// request that performed the mutation.
pub(crate) async fn record_audit(
    pool: &PgPool,
    ctx: &AuditContext,
    action_type: &str,
    entity_type: &str,
    entity_id: Option<DbId>,
    details_json: serde_json::Value,
) {
    let entry = CreateAuditLog {
        actor_id: ctx.actor_id,
        batch_id: ctx.batch_id,
        action_type: action_type.to_string(),
        entity_type: entity_type.to_string(),
        entity_id,
        details_json: Some(details_json),
    };

    if let Err(e) = AuditLogRepo::insert(pool, &entry).await {
        tracing::error!(
            action_type,
            entity_id,
            error = %e,
            "Failed to write audit record"
        );
    }
}

/// The before/after snapshot recorded for a time entry mutation.
pub(crate) fn entry_snapshot(entry: &tally_db::models::time_entry::TimeEntry) -> serde_json::Value {
    serde_json::json!({
        "started_at": entry.started_at,
        "ended_at": entry.ended_at,
        "billable": entry.billable,
    })
}
