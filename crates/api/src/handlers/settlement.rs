//! Settlement trigger: convert a member's unpaid closed entries into a
//! paycheck and push the payout through the payment provider.
//!
//! The local settlement transaction commits before the provider protocol
//! starts. A provider failure therefore surfaces to the caller while the
//! paycheck stays `processing` with its entries already consumed; the
//! retry endpoint on the paycheck resumes the external half.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tally_core::audit::{action_types, entity_types, AuditContext};
use tally_core::error::CoreError;
use tally_core::settlement::EntrySelection;
use tally_core::types::{DbId, Timestamp};
use tally_db::models::paycheck::Paycheck;
use tally_db::models::time_entry::TimeEntry;
use tally_db::models::transfer::Transfer;
use tally_db::repositories::{MemberRepo, SettlementRepo, TimeEntryRepo};
use tally_payments::TransferOrchestrator;

use crate::error::{AppError, AppResult};
use crate::handlers::record_audit;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct DateRange {
    pub from: Timestamp,
    pub to: Timestamp,
}

/// Request body for `POST /settle/{project_id}/{member_id}`.
///
/// Exactly one of `entry_ids` and `date_range` selects the entries.
#[derive(Debug, Deserialize)]
pub struct SettleRequest {
    pub entry_ids: Option<Vec<DbId>>,
    pub date_range: Option<DateRange>,
    /// Optional provider recipient account to pay into, overriding the one
    /// stored on the member.
    pub recipient_id: Option<String>,
}

/// The paycheck snapshot returned to the caller.
#[derive(Debug, Serialize)]
pub struct SettlementResponse {
    pub paycheck: Paycheck,
    pub transfer: Transfer,
    pub settled_entries: Vec<TimeEntry>,
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// POST /settle/{project_id}/{member_id}
pub async fn settle(
    State(state): State<AppState>,
    user: AuthUser,
    Path((project_id, member_id)): Path<(DbId, DbId)>,
    Json(input): Json<SettleRequest>,
) -> AppResult<impl IntoResponse> {
    let selection = build_selection(&input)?;
    selection.validate()?;

    // Unknown entry ids are rejected before any mutation.
    if let EntrySelection::ByIds(ref ids) = selection {
        let existing = TimeEntryRepo::count_existing(&state.pool, ids).await?;
        if existing != ids.len() as i64 {
            return Err(AppError::BadRequest(
                "selection contains unknown entry ids".into(),
            ));
        }
    }

    let member = MemberRepo::find_by_id(&state.pool, member_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "member",
            id: member_id,
        })?;

    let run = SettlementRepo::settle_member(&state.pool, &member, project_id, &selection)
        .await?
        .ok_or_else(|| {
            AppError::BadRequest("no eligible unpaid entries matched the selection".into())
        })?;

    let ctx = AuditContext::new(user.member_id);
    record_audit(
        &state.pool,
        &ctx,
        action_types::SETTLEMENT_RUN,
        entity_types::PAYCHECK,
        Some(run.paycheck.id),
        serde_json::json!({
            "member_id": member.id,
            "project_id": project_id,
            "entry_count": run.entries.len(),
            "total_hours": run.paycheck.total_hours,
            "total_amount": run.paycheck.total_amount,
        }),
    )
    .await;

    tracing::info!(
        paycheck_id = run.paycheck.id,
        member_id = member.id,
        entry_count = run.entries.len(),
        total_amount = %run.paycheck.total_amount,
        "Settlement committed; starting provider transfer"
    );

    // The local commit is final at this point. A failure below leaves the
    // paycheck in `processing` for the retry endpoint.
    let orchestrator = TransferOrchestrator::new(&state.pool, state.provider.as_ref());
    let transfer = orchestrator
        .execute(&run.paycheck, &member, input.recipient_id.as_deref())
        .await?;

    Ok(Json(DataResponse {
        data: SettlementResponse {
            paycheck: run.paycheck,
            transfer,
            settled_entries: run.entries,
        },
    }))
}

/// Turn the request body into a selection, requiring exactly one mode.
fn build_selection(input: &SettleRequest) -> Result<EntrySelection, AppError> {
    match (&input.entry_ids, &input.date_range) {
        (Some(ids), None) => Ok(EntrySelection::ByIds(ids.clone())),
        (None, Some(range)) => Ok(EntrySelection::ByDateRange {
            from: range.from,
            to: range.to,
        }),
        (Some(_), Some(_)) => Err(AppError::BadRequest(
            "provide either entry_ids or date_range, not both".into(),
        )),
        (None, None) => Err(AppError::BadRequest(
            "provide entry_ids or date_range to select entries".into(),
        )),
    }
}
