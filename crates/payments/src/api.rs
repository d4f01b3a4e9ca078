//! REST API client for the payment provider's HTTP endpoints.
//!
//! Wraps quote creation, recipient account lookup/creation, transfer
//! creation, and funding using [`reqwest`]. Every call carries the bearer
//! token and is bounded by the configured client timeout.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::ProviderConfig;

/// HTTP client for the payment provider.
pub struct ProviderApi {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
    profile_id: String,
    source_currency: String,
}

/// Errors from the provider REST layer.
#[derive(Debug, thiserror::Error)]
pub enum ProviderApiError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("Payment provider error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for the caller's error surface.
        body: String,
    },
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// A currency quote: locked-in rate and amounts for one transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteResponse {
    pub id: String,
    pub rate: Decimal,
    pub source_amount: Decimal,
    pub source_currency: String,
    pub target_amount: Decimal,
    pub target_currency: String,
}

/// A recipient account on the provider side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipientResponse {
    pub id: String,
    pub currency: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// A created transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferResponse {
    pub id: String,
    pub status: String,
}

/// Result of funding a transfer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundResponse {
    pub status: String,
}

impl ProviderApi {
    /// Create a client from configuration. The reqwest client carries the
    /// request timeout so no provider call can hang a settlement request
    /// indefinitely.
    pub fn new(config: &ProviderConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_url: config.api_url.clone(),
            api_token: config.api_token.clone(),
            profile_id: config.profile_id.clone(),
            source_currency: config.source_currency.clone(),
        }
    }

    /// Create a quote for paying out `target_amount` in `target_currency`.
    pub async fn create_quote(
        &self,
        target_currency: &str,
        target_amount: Decimal,
    ) -> Result<QuoteResponse, ProviderApiError> {
        let body = serde_json::json!({
            "profile": self.profile_id,
            "source_currency": self.source_currency,
            "target_currency": target_currency,
            "target_amount": target_amount,
        });

        let response = self
            .client
            .post(format!("{}/v1/quotes", self.api_url))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// List recipient accounts for a currency under the configured profile.
    pub async fn list_recipients(
        &self,
        currency: &str,
    ) -> Result<Vec<RecipientResponse>, ProviderApiError> {
        let response = self
            .client
            .get(format!("{}/v1/accounts", self.api_url))
            .bearer_auth(&self.api_token)
            .query(&[("profile", self.profile_id.as_str()), ("currency", currency)])
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Create a recipient account for a payee.
    pub async fn create_recipient(
        &self,
        holder_name: &str,
        email: &str,
        currency: &str,
    ) -> Result<RecipientResponse, ProviderApiError> {
        let body = serde_json::json!({
            "profile": self.profile_id,
            "currency": currency,
            "account_holder_name": holder_name,
            "details": { "email": email },
        });

        let response = self
            .client
            .post(format!("{}/v1/accounts", self.api_url))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Create a transfer referencing a quote and recipient. `reference` is
    /// derived from the paycheck id and doubles as the idempotency key on
    /// retries.
    pub async fn create_transfer(
        &self,
        quote_id: &str,
        recipient_id: &str,
        reference: &str,
    ) -> Result<TransferResponse, ProviderApiError> {
        let body = serde_json::json!({
            "quote_id": quote_id,
            "target_account": recipient_id,
            "customer_transaction_id": reference,
            "details": {
                "reference": reference,
                "transfer_purpose": "verification.transfers.purpose.pay.bills",
            },
        });

        let response = self
            .client
            .post(format!("{}/v1/transfers", self.api_url))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fund a created transfer from the profile balance.
    pub async fn fund_transfer(&self, transfer_id: &str) -> Result<FundResponse, ProviderApiError> {
        let body = serde_json::json!({ "type": "BALANCE" });

        let response = self
            .client
            .post(format!(
                "{}/v3/profiles/{}/transfers/{}/payments",
                self.api_url, self.profile_id, transfer_id
            ))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code, returning the status
    /// and body text as an error otherwise.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, ProviderApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Check the status and deserialize the JSON body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ProviderApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}
