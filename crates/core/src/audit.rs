//! Audit trail constants and helpers for time-entry mutations.
//!
//! Every manual mutation of a time entry must be attributable for
//! billing-dispute resolution, so handlers record before/after values under
//! an [`AuditContext`]. The context carries an explicit batch id threaded
//! through the call chain; related entries from one request share the batch.

use uuid::Uuid;

use crate::types::DbId;

/// Known action types for audit records.
pub mod action_types {
    pub const TIMER_START: &str = "timer_start";
    pub const TIMER_STOP: &str = "timer_stop";
    pub const TIMER_FORCE_STOP: &str = "timer_force_stop";
    pub const ENTRY_CREATE: &str = "entry_create";
    pub const ENTRY_UPDATE: &str = "entry_update";
    pub const ENTRY_DELETE: &str = "entry_delete";
    pub const SETTLEMENT_RUN: &str = "settlement_run";
}

/// Entity type names recorded on audit rows.
pub mod entity_types {
    pub const TIME_ENTRY: &str = "time_entry";
    pub const PAYCHECK: &str = "paycheck";
}

// ---------------------------------------------------------------------------
// Audit context
// ---------------------------------------------------------------------------

/// Who performed a mutation, and which request batch it belongs to.
///
/// Constructed once per request and passed down explicitly; there is no
/// shared "current batch" state anywhere.
#[derive(Debug, Clone)]
pub struct AuditContext {
    pub actor_id: DbId,
    pub batch_id: Uuid,
}

impl AuditContext {
    pub fn new(actor_id: DbId) -> Self {
        Self {
            actor_id,
            batch_id: Uuid::new_v4(),
        }
    }
}

// ---------------------------------------------------------------------------
// Change payloads
// ---------------------------------------------------------------------------

/// Build the `details_json` payload for a mutation: the old and new values
/// side by side. `None` marks creation (`before`) or deletion (`after`).
pub fn change_details(
    before: Option<serde_json::Value>,
    after: Option<serde_json::Value>,
) -> serde_json::Value {
    serde_json::json!({
        "before": before,
        "after": after,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contexts_get_distinct_batch_ids() {
        let a = AuditContext::new(1);
        let b = AuditContext::new(1);
        assert_ne!(a.batch_id, b.batch_id);
    }

    #[test]
    fn creation_has_null_before() {
        let details = change_details(None, Some(serde_json::json!({"started_at": "x"})));
        assert!(details["before"].is_null());
        assert_eq!(details["after"]["started_at"], "x");
    }

    #[test]
    fn update_carries_both_sides() {
        let details = change_details(
            Some(serde_json::json!({"ended_at": "old"})),
            Some(serde_json::json!({"ended_at": "new"})),
        );
        assert_eq!(details["before"]["ended_at"], "old");
        assert_eq!(details["after"]["ended_at"], "new");
    }

    #[test]
    fn deletion_has_null_after() {
        let details = change_details(Some(serde_json::json!({"id": 1})), None);
        assert!(details["after"].is_null());
    }
}
