//! Manual time entry management.
//!
//! Manual entries are always closed spans (`added_manually = true`). Every
//! mutation records the before/after start/end values in the audit log so
//! billing disputes can be resolved from the trail.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tally_core::audit::{action_types, change_details, entity_types, AuditContext};
use tally_core::error::CoreError;
use tally_core::types::{DbId, Timestamp};
use tally_db::models::time_entry::{CreateManualEntry, TimeEntryQuery, UpdateManualEntry};
use tally_db::repositories::{MemberRepo, TimeEntryRepo};

use crate::error::{AppError, AppResult};
use crate::handlers::{entry_snapshot, record_audit};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter types
// ---------------------------------------------------------------------------

/// Query parameters for listing entries.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub member_id: Option<DbId>,
    pub project_id: Option<DbId>,
    pub task_id: Option<DbId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// GET /time/entries
pub async fn list_entries(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let query = TimeEntryQuery {
        member_id: params.member_id,
        project_id: params.project_id,
        task_id: params.task_id,
        from: params.from,
        to: params.to,
        limit: params.limit,
        offset: params.offset,
    };

    let entries = TimeEntryRepo::query(&state.pool, &query).await?;
    Ok(Json(DataResponse { data: entries }))
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /time/entries
///
/// Create a manual, already-closed entry for a member.
pub async fn create_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<CreateManualEntry>,
) -> AppResult<impl IntoResponse> {
    if input.ended_at <= input.started_at {
        return Err(AppError::BadRequest(
            "ended_at must be after started_at".into(),
        ));
    }

    let member = MemberRepo::find_by_id(&state.pool, input.member_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "member",
            id: input.member_id,
        })?;

    let entry = TimeEntryRepo::insert_manual(&state.pool, &input, member.billable_rate).await?;

    let ctx = AuditContext::new(user.member_id);
    record_audit(
        &state.pool,
        &ctx,
        action_types::ENTRY_CREATE,
        entity_types::TIME_ENTRY,
        Some(entry.id),
        change_details(None, Some(entry_snapshot(&entry))),
    )
    .await;

    Ok(Json(DataResponse { data: entry }))
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// PATCH /time/entries/{id}
pub async fn update_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateManualEntry>,
) -> AppResult<impl IntoResponse> {
    let before = TimeEntryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "time entry",
            id,
        })?;

    if before.is_paid {
        return Err(AppError::Core(CoreError::Conflict(
            "settled entries are immutable".into(),
        )));
    }
    if !before.added_manually {
        return Err(AppError::BadRequest(
            "only manual entries can be edited".into(),
        ));
    }

    // Validate the resulting span before touching the row.
    let new_start = input.started_at.unwrap_or(before.started_at);
    let new_end = input.ended_at.or(before.ended_at);
    match new_end {
        Some(end) if end > new_start => {}
        _ => {
            return Err(AppError::BadRequest(
                "ended_at must be after started_at".into(),
            ));
        }
    }

    let after = TimeEntryRepo::update_manual(&state.pool, id, &input)
        .await?
        .ok_or(CoreError::Conflict(
            "entry was settled by a concurrent run".into(),
        ))?;

    let ctx = AuditContext::new(user.member_id);
    record_audit(
        &state.pool,
        &ctx,
        action_types::ENTRY_UPDATE,
        entity_types::TIME_ENTRY,
        Some(after.id),
        change_details(Some(entry_snapshot(&before)), Some(entry_snapshot(&after))),
    )
    .await;

    Ok(Json(DataResponse { data: after }))
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// DELETE /time/entries/{id}
pub async fn delete_entry(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let before = TimeEntryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "time entry",
            id,
        })?;

    if before.paycheck_id.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "entries linked to a paycheck cannot be deleted".into(),
        )));
    }

    let deleted = TimeEntryRepo::delete(&state.pool, id).await?;
    if !deleted {
        // Settled between the read and the delete; same contract as above.
        return Err(AppError::Core(CoreError::Conflict(
            "entries linked to a paycheck cannot be deleted".into(),
        )));
    }

    let ctx = AuditContext::new(user.member_id);
    record_audit(
        &state.pool,
        &ctx,
        action_types::ENTRY_DELETE,
        entity_types::TIME_ENTRY,
        Some(id),
        change_details(Some(entry_snapshot(&before)), None),
    )
    .await;

    Ok(Json(DataResponse {
        data: serde_json::json!({ "deleted": true }),
    }))
}
