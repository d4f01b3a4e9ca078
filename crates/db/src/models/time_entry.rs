//! Time entry entity and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tally_core::settlement::SettlementState;
use tally_core::tracking::ClosedSpan;
use tally_core::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Time entry entity
// ---------------------------------------------------------------------------

/// A tracked span of work for one member on one task. Open while `ended_at`
/// is null; at most one open entry exists per (member, task).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TimeEntry {
    pub id: DbId,
    pub member_id: DbId,
    pub task_id: DbId,
    pub project_id: DbId,
    pub started_at: Timestamp,
    pub ended_at: Option<Timestamp>,
    pub billable: bool,
    pub billable_rate: Decimal,
    pub is_paid: bool,
    pub paid_rate: Option<Decimal>,
    pub amount_paid: Option<Decimal>,
    pub paycheck_id: Option<DbId>,
    pub added_manually: bool,
    pub stopped_by_system: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl TimeEntry {
    pub fn is_open(&self) -> bool {
        self.ended_at.is_none()
    }

    /// Duration in seconds; `None` while the entry is open.
    pub fn duration_seconds(&self) -> Option<i64> {
        self.ended_at
            .map(|end| (end - self.started_at).num_seconds().max(0))
    }

    /// The closed span, if the entry has ended.
    pub fn closed_span(&self) -> Option<ClosedSpan> {
        self.ended_at
            .map(|end| ClosedSpan::new(self.started_at, end))
    }

    /// Tagged settlement sub-state derived from the row.
    ///
    /// A row flagged paid without its settlement columns is corrupt, so it
    /// is surfaced as `Unsettled` only when `is_paid` is genuinely false.
    pub fn settlement(&self) -> SettlementState {
        if !self.is_paid {
            return SettlementState::Unsettled;
        }
        SettlementState::Settled {
            rate: self.paid_rate.unwrap_or_default(),
            amount: self.amount_paid.unwrap_or_default(),
            paycheck_id: self.paycheck_id.unwrap_or_default(),
        }
    }
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// DTO for inserting a manual (already closed) entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateManualEntry {
    pub member_id: DbId,
    pub task_id: DbId,
    pub project_id: DbId,
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
    pub billable: bool,
}

/// DTO for patching a manual entry. All fields optional.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateManualEntry {
    pub started_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
    pub billable: Option<bool>,
}

/// Filter parameters for listing entries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimeEntryQuery {
    pub member_id: Option<DbId>,
    pub project_id: Option<DbId>,
    pub task_id: Option<DbId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Result of a toggle call: what happened and the affected entry.
#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome {
    pub action: ToggleAction,
    pub entry: TimeEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToggleAction {
    Started,
    Stopped,
}
