//! Timer start/stop handler.
//!
//! One endpoint toggles the timer for the calling member on a task: an
//! open entry is closed, otherwise a new one is opened. The one-open-entry
//! invariant is enforced by the repository's conditional close and the
//! partial unique index behind [`TimeEntryRepo::start`]; a concurrent
//! toggle loser receives the winner's open entry rather than an error.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use tally_core::audit::{action_types, entity_types, AuditContext};
use tally_core::error::CoreError;
use tally_core::types::DbId;
use tally_db::models::time_entry::{ToggleAction, ToggleOutcome};
use tally_db::repositories::{MemberRepo, StartOutcome, TimeEntryRepo};

use crate::error::AppResult;
use crate::handlers::{entry_snapshot, record_audit};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for `POST /time/toggle`.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub task_id: DbId,
    pub project_id: DbId,
    /// Defaults to `true`; the rate snapshot always comes from the member.
    pub billable: Option<bool>,
}

/// POST /time/toggle
///
/// Stop the caller's open entry for the task, or start a new one.
pub async fn toggle(
    State(state): State<AppState>,
    user: AuthUser,
    Json(input): Json<ToggleRequest>,
) -> AppResult<impl IntoResponse> {
    let member = MemberRepo::find_by_id(&state.pool, user.member_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "member",
            id: user.member_id,
        })?;

    let ctx = AuditContext::new(user.member_id);
    let now = Utc::now();

    // An open entry for the pair means this toggle is a stop.
    if let Some(closed) =
        TimeEntryRepo::close_open_for_pair(&state.pool, member.id, input.task_id, now).await?
    {
        record_audit(
            &state.pool,
            &ctx,
            action_types::TIMER_STOP,
            entity_types::TIME_ENTRY,
            Some(closed.id),
            tally_core::audit::change_details(None, Some(entry_snapshot(&closed))),
        )
        .await;

        return Ok(Json(DataResponse {
            data: ToggleOutcome {
                action: ToggleAction::Stopped,
                entry: closed,
            },
        }));
    }

    let billable = input.billable.unwrap_or(true);
    let outcome = TimeEntryRepo::start(
        &state.pool,
        member.id,
        input.task_id,
        input.project_id,
        billable,
        member.billable_rate,
        now,
    )
    .await?;

    let entry = match outcome {
        StartOutcome::Started(entry) => {
            record_audit(
                &state.pool,
                &ctx,
                action_types::TIMER_START,
                entity_types::TIME_ENTRY,
                Some(entry.id),
                tally_core::audit::change_details(None, Some(entry_snapshot(&entry))),
            )
            .await;
            entry
        }
        StartOutcome::AlreadyOpen(entry) => {
            tracing::debug!(
                member_id = member.id,
                task_id = input.task_id,
                entry_id = entry.id,
                "Concurrent toggle lost the start race; returning the open entry"
            );
            entry
        }
    };

    Ok(Json(DataResponse {
        data: ToggleOutcome {
            action: ToggleAction::Started,
            entry,
        },
    }))
}
