//! Ad-hoc manual payouts.
//!
//! The simpler parallel settlement path: no time entries are consumed, the
//! caller names an amount and a payee and the same provider protocol moves
//! the money. Shares the webhook reconciliation vocabulary with transfers.

use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use tally_core::error::CoreError;
use tally_core::status::payment_status;
use tally_core::types::DbId;
use tally_db::models::payment::CreatePayment;
use tally_db::repositories::{MemberRepo, PaymentRepo};
use tally_payments::TransferOrchestrator;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub payee_id: DbId,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// GET /payments?payee_id=...
pub async fn list_payments(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<ListParams>,
) -> AppResult<impl IntoResponse> {
    let limit = params.limit.unwrap_or(50).min(500);
    let offset = params.offset.unwrap_or(0);

    let payments =
        PaymentRepo::list_for_payee(&state.pool, params.payee_id, limit, offset).await?;
    Ok(Json(DataResponse { data: payments }))
}

/// POST /payments
pub async fn create_payment(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(input): Json<CreatePayment>,
) -> AppResult<impl IntoResponse> {
    if input.amount <= Decimal::ZERO {
        return Err(AppError::BadRequest("amount must be positive".into()));
    }
    if input.currency.trim().is_empty() {
        return Err(AppError::BadRequest("currency must be set".into()));
    }

    let payee = MemberRepo::find_by_id(&state.pool, input.payee_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "member",
            id: input.payee_id,
        })?;

    let payment = PaymentRepo::create(&state.pool, &input).await?;

    let orchestrator = TransferOrchestrator::new(&state.pool, state.provider.as_ref());
    match orchestrator.pay(&payment, &payee).await {
        Ok(updated) => Ok(Json(DataResponse { data: updated })),
        Err(err) => {
            // The payout never reached the provider (or was rejected); mark
            // it failed so it does not sit in processing forever.
            if let Err(mark_err) =
                PaymentRepo::update_status(&state.pool, payment.id, payment_status::FAILED).await
            {
                tracing::error!(
                    payment_id = payment.id,
                    error = %mark_err,
                    "Failed to mark payment as failed"
                );
            }
            Err(err.into())
        }
    }
}
