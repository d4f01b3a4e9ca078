//! Paycheck status surface and the transfer retry path.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tally_core::error::CoreError;
use tally_core::status::paycheck_status;
use tally_core::types::DbId;
use tally_db::models::paycheck::Paycheck;
use tally_db::models::transfer::Transfer;
use tally_db::repositories::{MemberRepo, PaycheckRepo, TransferRepo};
use tally_payments::TransferOrchestrator;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub member_id: Option<DbId>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// A paycheck with its transfer, when one exists.
#[derive(Debug, Serialize)]
pub struct PaycheckDetail {
    pub paycheck: Paycheck,
    pub transfer: Option<Transfer>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /paychecks
pub async fn list_paychecks(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let limit = params.limit.unwrap_or(50).min(500);
    let offset = params.offset.unwrap_or(0);

    let paychecks = PaycheckRepo::list(&state.pool, params.member_id, limit, offset).await?;
    Ok(Json(DataResponse { data: paychecks }))
}

/// GET /paychecks/{id}
pub async fn get_paycheck(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let paycheck = PaycheckRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "paycheck",
            id,
        })?;

    let transfer = TransferRepo::find_by_paycheck_id(&state.pool, id).await?;

    Ok(Json(DataResponse {
        data: PaycheckDetail { paycheck, transfer },
    }))
}

/// POST /paychecks/{id}/retry-transfer
///
/// Resume the external half of a settlement whose provider protocol failed
/// part-way. The paycheck id is the idempotency key: if a transfer was
/// already created it is re-funded, otherwise the whole protocol runs
/// again with the same reference.
pub async fn retry_transfer(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let paycheck = PaycheckRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "paycheck",
            id,
        })?;

    if paycheck.status == paycheck_status::COMPLETED {
        return Err(AppError::Core(CoreError::Conflict(
            "paycheck is already completed".into(),
        )));
    }

    let member = MemberRepo::find_by_id(&state.pool, paycheck.member_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "member",
            id: paycheck.member_id,
        })?;

    let orchestrator = TransferOrchestrator::new(&state.pool, state.provider.as_ref());
    let transfer = orchestrator.resume(&paycheck, &member).await?;

    // A failed paycheck goes back to processing once the transfer is moving
    // again; the webhook reconciler advances it from here.
    let paycheck = if paycheck.status == paycheck_status::FAILED {
        PaycheckRepo::update_status(&state.pool, id, paycheck_status::PROCESSING)
            .await?
            .unwrap_or(paycheck)
    } else {
        paycheck
    };

    Ok(Json(DataResponse {
        data: PaycheckDetail {
            paycheck,
            transfer: Some(transfer),
        },
    }))
}
