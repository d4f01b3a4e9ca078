//! Integration tests for the payment-provider webhook: signature checks,
//! status mapping, idempotence, and out-of-order delivery.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{auth_token, body_json, post_json, TEST_WEBHOOK_SECRET};
use sqlx::PgPool;
use tally_core::webhook::sign_body;
use tower::ServiceExt;

/// Run a settlement through the stub provider and return
/// `(paycheck_id, provider_transfer_id)`.
async fn seed_settled_transfer(pool: &PgPool) -> (i64, String) {
    let member = common::seed_member(pool, "webhook@example.com", "20", false, "40").await;

    sqlx::query(
        "INSERT INTO time_entries \
             (member_id, task_id, project_id, started_at, ended_at, \
              billable, billable_rate, added_manually) \
         VALUES ($1, 1, 1, '2025-06-02T09:00:00Z'::timestamptz, \
                 '2025-06-02T10:00:00Z'::timestamptz, TRUE, 20, TRUE)",
    )
    .bind(member.id)
    .execute(pool)
    .await
    .unwrap();

    let token = auth_token(member.id);
    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({
        "date_range": { "from": "2025-06-01T00:00:00Z", "to": "2025-06-08T00:00:00Z" }
    });
    let response = post_json(
        app,
        &format!("/api/v1/settle/1/{}", member.id),
        &token,
        &body,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    (
        json["data"]["paycheck"]["id"].as_i64().unwrap(),
        json["data"]["transfer"]["provider_transfer_id"]
            .as_str()
            .unwrap()
            .to_string(),
    )
}

/// Deliver a webhook body with the given signature.
async fn deliver_raw(
    pool: PgPool,
    body: &str,
    signature: Option<&str>,
) -> axum::http::Response<Body> {
    let app = common::build_test_app(pool);

    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhooks/payment-provider")
        .header("Content-Type", "application/json");
    if let Some(sig) = signature {
        builder = builder.header("X-Signature-SHA256", sig);
    }

    let request = builder.body(Body::from(body.to_string())).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Deliver a correctly signed webhook event.
async fn deliver_event(
    pool: PgPool,
    event_type: &str,
    resource_id: &str,
    occurred_at: &str,
) -> axum::http::Response<Body> {
    let body = serde_json::json!({
        "event_type": event_type,
        "data": { "resource": { "id": resource_id } },
        "occurred_at": occurred_at,
    })
    .to_string();

    let signature = sign_body(TEST_WEBHOOK_SECRET.as_bytes(), body.as_bytes());
    deliver_raw(pool, &body, Some(&signature)).await
}

async fn transfer_status(pool: &PgPool, provider_transfer_id: &str) -> String {
    sqlx::query_scalar("SELECT status FROM transfers WHERE provider_transfer_id = $1")
        .bind(provider_transfer_id)
        .fetch_one(pool)
        .await
        .unwrap()
}

// ---------------------------------------------------------------------------
// Signature checks
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_signature_is_rejected_without_mutation(pool: PgPool) {
    let (_, provider_id) = seed_settled_transfer(&pool).await;

    let body = serde_json::json!({
        "event_type": "completed",
        "data": { "resource": { "id": provider_id } },
        "occurred_at": "2025-06-03T00:00:00Z",
    })
    .to_string();

    let response = deliver_raw(pool.clone(), &body, Some("deadbeef")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    assert_eq!(transfer_status(&pool, &provider_id).await, "processing");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn missing_signature_is_rejected(pool: PgPool) {
    let response = deliver_raw(pool, "{}", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn malformed_payload_with_valid_signature_is_400(pool: PgPool) {
    let body = r#"{"event_type": "completed"}"#;
    let signature = sign_body(TEST_WEBHOOK_SECRET.as_bytes(), body.as_bytes());
    let response = deliver_raw(pool, body, Some(&signature)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_transfer_id_is_404(pool: PgPool) {
    let response = deliver_event(
        pool,
        "completed",
        "transfer-does-not-exist",
        "2025-06-03T00:00:00Z",
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Status mapping
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn completed_event_completes_transfer_and_paycheck(pool: PgPool) {
    let (paycheck_id, provider_id) = seed_settled_transfer(&pool).await;

    let response = deliver_event(
        pool.clone(),
        "completed",
        &provider_id,
        "2025-06-03T00:00:00Z",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["applied"], true);

    assert_eq!(transfer_status(&pool, &provider_id).await, "completed");

    let paycheck_status: String =
        sqlx::query_scalar("SELECT status FROM paychecks WHERE id = $1")
            .bind(paycheck_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(paycheck_status, "completed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn funds_converted_keeps_everything_processing(pool: PgPool) {
    let (paycheck_id, provider_id) = seed_settled_transfer(&pool).await;

    let response = deliver_event(
        pool.clone(),
        "funds_converted",
        &provider_id,
        "2025-06-03T00:00:00Z",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(transfer_status(&pool, &provider_id).await, "processing");

    let paycheck_status: String =
        sqlx::query_scalar("SELECT status FROM paychecks WHERE id = $1")
            .bind(paycheck_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(paycheck_status, "processing", "non-terminal event must not propagate");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_event_fails_transfer_and_paycheck(pool: PgPool) {
    let (paycheck_id, provider_id) = seed_settled_transfer(&pool).await;

    deliver_event(
        pool.clone(),
        "failed",
        &provider_id,
        "2025-06-03T00:00:00Z",
    )
    .await;

    assert_eq!(transfer_status(&pool, &provider_id).await, "failed");

    let paycheck_status: String =
        sqlx::query_scalar("SELECT status FROM paychecks WHERE id = $1")
            .bind(paycheck_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(paycheck_status, "failed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn unknown_event_type_is_acknowledged_without_mutation(pool: PgPool) {
    let (_, provider_id) = seed_settled_transfer(&pool).await;

    let response = deliver_event(
        pool.clone(),
        "refund_issued",
        &provider_id,
        "2025-06-03T00:00:00Z",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["applied"], false);

    assert_eq!(transfer_status(&pool, &provider_id).await, "processing");
}

// ---------------------------------------------------------------------------
// Idempotence and ordering
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn replayed_event_applies_once(pool: PgPool) {
    let (_, provider_id) = seed_settled_transfer(&pool).await;

    let response = deliver_event(
        pool.clone(),
        "completed",
        &provider_id,
        "2025-06-03T00:00:00Z",
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["applied"], true);

    // The exact same payload again: acknowledged, nothing changes.
    let response = deliver_event(
        pool.clone(),
        "completed",
        &provider_id,
        "2025-06-03T00:00:00Z",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["applied"], false);

    assert_eq!(transfer_status(&pool, &provider_id).await, "completed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn late_event_cannot_regress_status(pool: PgPool) {
    let (_, provider_id) = seed_settled_transfer(&pool).await;

    // The terminal event arrives first...
    deliver_event(
        pool.clone(),
        "completed",
        &provider_id,
        "2025-06-03T12:00:00Z",
    )
    .await;

    // ...then an earlier funds_converted straggles in out of order.
    let response = deliver_event(
        pool.clone(),
        "funds_converted",
        &provider_id,
        "2025-06-03T06:00:00Z",
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["applied"], false);

    assert_eq!(
        transfer_status(&pool, &provider_id).await,
        "completed",
        "stale event must not regress a terminal status"
    );
}

// ---------------------------------------------------------------------------
// Ad-hoc payment reconciliation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn payment_events_reconcile_adhoc_payouts(pool: PgPool) {
    let member = common::seed_member(&pool, "adhoc@example.com", "20", false, "40").await;
    let token = auth_token(member.id);

    let app = common::build_test_app(pool.clone());
    let body = serde_json::json!({
        "payee_id": member.id,
        "amount": "150.00",
        "currency": "USD",
    });
    let response = post_json(app, "/api/v1/payments", &token, &body).await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let payment_id = json["data"]["id"].as_i64().unwrap();
    let provider_id = json["data"]["provider_transfer_id"]
        .as_str()
        .unwrap()
        .to_string();

    deliver_event(
        pool.clone(),
        "completed",
        &provider_id,
        "2025-06-03T00:00:00Z",
    )
    .await;

    let status: String = sqlx::query_scalar("SELECT status FROM payments WHERE id = $1")
        .bind(payment_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(status, "completed");
}
