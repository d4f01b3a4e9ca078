//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rust_decimal::Decimal;
use sqlx::PgPool;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use async_trait::async_trait;
use tally_api::auth::jwt::{generate_access_token, JwtConfig};
use tally_api::config::ServerConfig;
use tally_api::routes;
use tally_api::state::AppState;
use tally_core::types::DbId;
use tally_db::models::member::Member;
use tally_db::repositories::MemberRepo;
use tally_payments::api::{
    FundResponse, ProviderApiError, QuoteResponse, RecipientResponse, TransferResponse,
};
use tally_payments::PaymentProvider;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";
pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-shared-secret";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 15,
        },
        webhook_secret: TEST_WEBHOOK_SECRET.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Stub payment provider
// ---------------------------------------------------------------------------

/// Which protocol step the stub should fail at, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailAt {
    Nothing,
    Quote,
    TransferCreation,
    Funding,
}

/// Deterministic in-memory provider: every step succeeds unless configured
/// to fail, and ids are derived from the inputs so tests can predict them.
pub struct StubProvider {
    pub fail_at: FailAt,
}

impl StubProvider {
    pub fn ok() -> Self {
        Self {
            fail_at: FailAt::Nothing,
        }
    }

    pub fn failing_at(fail_at: FailAt) -> Self {
        Self { fail_at }
    }

    fn rejection(step: &str) -> ProviderApiError {
        ProviderApiError::ApiError {
            status: 422,
            body: format!("stub rejected {step}"),
        }
    }
}

#[async_trait]
impl PaymentProvider for StubProvider {
    async fn create_quote(
        &self,
        target_currency: &str,
        target_amount: Decimal,
    ) -> Result<QuoteResponse, ProviderApiError> {
        if self.fail_at == FailAt::Quote {
            return Err(Self::rejection("quote"));
        }
        Ok(QuoteResponse {
            id: format!("quote-{target_currency}-{target_amount}"),
            rate: Decimal::ONE,
            source_amount: target_amount,
            source_currency: "USD".to_string(),
            target_amount,
            target_currency: target_currency.to_string(),
        })
    }

    async fn list_recipients(
        &self,
        _currency: &str,
    ) -> Result<Vec<RecipientResponse>, ProviderApiError> {
        Ok(Vec::new())
    }

    async fn create_recipient(
        &self,
        _holder_name: &str,
        email: &str,
        currency: &str,
    ) -> Result<RecipientResponse, ProviderApiError> {
        Ok(RecipientResponse {
            id: format!("recipient-{email}"),
            currency: currency.to_string(),
            email: Some(email.to_string()),
        })
    }

    async fn create_transfer(
        &self,
        _quote_id: &str,
        _recipient_id: &str,
        reference: &str,
    ) -> Result<TransferResponse, ProviderApiError> {
        if self.fail_at == FailAt::TransferCreation {
            return Err(Self::rejection("transfer creation"));
        }
        Ok(TransferResponse {
            id: format!("transfer-{reference}"),
            status: "incoming_payment_waiting".to_string(),
        })
    }

    async fn fund_transfer(&self, _transfer_id: &str) -> Result<FundResponse, ProviderApiError> {
        if self.fail_at == FailAt::Funding {
            return Err(Self::rejection("funding"));
        }
        Ok(FundResponse {
            status: "COMPLETED".to_string(),
        })
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build the full application router with all middleware layers, using the
/// given database pool and an always-succeeding stub provider.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_provider(pool, Arc::new(StubProvider::ok()))
}

/// Same as [`build_test_app`] but with a caller-supplied provider stub.
pub fn build_test_app_with_provider(
    pool: PgPool,
    provider: Arc<dyn PaymentProvider>,
) -> Router {
    let config = test_config();

    let state = AppState {
        pool,
        config: Arc::new(config),
        provider,
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    Router::new()
        .merge(routes::health::router())
        .merge(routes::webhooks::router())
        .nest("/api/v1", routes::api_routes())
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(30),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

/// Mint a bearer token for a member, signed with the test secret.
pub fn auth_token(member_id: DbId) -> String {
    let config = JwtConfig {
        secret: TEST_JWT_SECRET.to_string(),
        access_token_expiry_mins: 15,
    };
    generate_access_token(member_id, "member", &config).expect("token generation")
}

/// Send a GET request without authentication.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a GET request with a bearer token.
pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    let request = Request::builder()
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send an authenticated JSON request with the given method.
pub async fn send_json(
    app: Router,
    method: Method,
    uri: &str,
    token: &str,
    body: &serde_json::Value,
) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("Authorization", format!("Bearer {token}"))
        .header("Content-Type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send an authenticated POST with a JSON body.
pub async fn post_json(
    app: Router,
    uri: &str,
    token: &str,
    body: &serde_json::Value,
) -> Response<Body> {
    send_json(app, Method::POST, uri, token, body).await
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Insert a member with the given rate and weekly limit settings.
pub async fn seed_member(
    pool: &PgPool,
    email: &str,
    billable_rate: &str,
    weekly_limit_enabled: bool,
    weekly_limit_hours: &str,
) -> Member {
    MemberRepo::create(
        pool,
        "Test Member",
        email,
        billable_rate.parse().unwrap(),
        "USD",
        "UTC",
        weekly_limit_enabled,
        weekly_limit_hours.parse().unwrap(),
    )
    .await
    .expect("member fixture")
}
