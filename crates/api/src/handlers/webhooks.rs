//! Inbound payment-provider webhook.
//!
//! The provider posts status events signed with HMAC-SHA256 over the raw
//! body. Verification happens against the raw bytes before any parsing;
//! a bad signature is rejected with no state change. Events apply
//! monotonically by their `occurred_at` timestamp, so replays and
//! out-of-order deliveries cannot regress a status.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tally_core::error::CoreError;
use tally_core::status::{paycheck_status, payment_status};
use tally_core::types::Timestamp;
use tally_core::webhook::{verify_signature, TransferEvent};
use tally_db::repositories::{PaycheckRepo, PaymentRepo, TransferRepo};

use crate::error::{AppError, AppResult};
use crate::response::DataResponse;
use crate::state::AppState;

/// Signature header set by the provider.
const SIGNATURE_HEADER: &str = "x-signature-sha256";

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    event_type: String,
    data: WebhookData,
    /// Provider event time; events older than the last applied one are
    /// ignored. Missing timestamps fall back to receipt time.
    occurred_at: Option<Timestamp>,
}

#[derive(Debug, Deserialize)]
struct WebhookData {
    resource: WebhookResource,
}

#[derive(Debug, Deserialize)]
struct WebhookResource {
    id: String,
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// POST /webhooks/payment-provider
pub async fn payment_provider(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> AppResult<impl IntoResponse> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Missing webhook signature".into()))
        })?;

    if !verify_signature(state.config.webhook_secret.as_bytes(), &body, signature) {
        tracing::warn!("Webhook rejected: invalid signature");
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid webhook signature".into(),
        )));
    }

    let payload: WebhookPayload = serde_json::from_slice(&body)
        .map_err(|e| AppError::BadRequest(format!("Malformed webhook payload: {e}")))?;

    let Some(event) = TransferEvent::parse(&payload.event_type) else {
        // Unknown event types are acknowledged without mutation so the
        // provider does not retry them forever.
        tracing::debug!(event_type = %payload.event_type, "Ignoring unknown webhook event type");
        return Ok(Json(DataResponse {
            data: json!({ "applied": false, "reason": "unknown_event_type" }),
        }));
    };

    let provider_transfer_id = payload.data.resource.id.as_str();
    let occurred_at = payload.occurred_at.unwrap_or_else(Utc::now);

    // Settlement transfers first, then ad-hoc payments.
    if let Some(transfer) =
        TransferRepo::find_by_provider_transfer_id(&state.pool, provider_transfer_id).await?
    {
        let applied = TransferRepo::apply_event(
            &state.pool,
            provider_transfer_id,
            event.status(),
            occurred_at,
        )
        .await?;

        if let Some(ref updated) = applied {
            propagate_to_paycheck(&state, updated.paycheck_id, event).await?;
            tracing::info!(
                transfer_id = updated.id,
                status = event.status(),
                "Webhook applied to transfer"
            );
        } else {
            tracing::debug!(
                transfer_id = transfer.id,
                occurred_at = %occurred_at,
                "Stale webhook event ignored"
            );
        }

        return Ok(Json(DataResponse {
            data: json!({ "applied": applied.is_some(), "resource": "transfer" }),
        }));
    }

    if let Some(payment) =
        PaymentRepo::find_by_provider_transfer_id(&state.pool, provider_transfer_id).await?
    {
        let applied = PaymentRepo::apply_event(
            &state.pool,
            provider_transfer_id,
            event.status(),
            occurred_at,
        )
        .await?;

        if applied.is_some() {
            tracing::info!(
                payment_id = payment.id,
                status = event.status(),
                "Webhook applied to payment"
            );
        }

        return Ok(Json(DataResponse {
            data: json!({ "applied": applied.is_some(), "resource": "payment" }),
        }));
    }

    tracing::warn!(
        provider_transfer_id,
        "Webhook for unknown transfer id; no mutation"
    );
    Err(AppError::Database(sqlx::Error::RowNotFound))
}

/// Push a terminal transfer status onto the owning paycheck. The paycheck
/// vocabulary has no `cancelled`; a cancelled transfer fails the paycheck.
async fn propagate_to_paycheck(
    state: &AppState,
    paycheck_id: i64,
    event: TransferEvent,
) -> Result<(), sqlx::Error> {
    if !event.is_terminal() {
        return Ok(());
    }

    let status = match event.status() {
        payment_status::COMPLETED => paycheck_status::COMPLETED,
        _ => paycheck_status::FAILED,
    };

    PaycheckRepo::update_status(&state.pool, paycheck_id, status).await?;
    Ok(())
}
