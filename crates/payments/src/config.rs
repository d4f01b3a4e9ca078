//! Payment provider configuration loaded from environment variables.

/// Connection settings for the external payment provider.
///
/// Sandbox vs. live is purely a matter of which base URL and token are
/// configured; no code path branches on the environment.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Base API URL (default: the provider sandbox).
    pub api_url: String,
    /// Bearer token for all API calls.
    pub api_token: String,
    /// Provider-side profile id transfers are created under.
    pub profile_id: String,
    /// Currency the funding balance is held in.
    pub source_currency: String,
    /// Per-request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl ProviderConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                              |
    /// |-----------------------------|--------------------------------------|
    /// | `PAYMENT_API_URL`           | `https://api.sandbox.transferwise.tech` |
    /// | `PAYMENT_API_TOKEN`         | (required)                           |
    /// | `PAYMENT_PROFILE_ID`        | (required)                           |
    /// | `PAYMENT_SOURCE_CURRENCY`   | `USD`                                |
    /// | `PAYMENT_REQUEST_TIMEOUT_SECS` | `30`                              |
    pub fn from_env() -> Self {
        let api_url = std::env::var("PAYMENT_API_URL")
            .unwrap_or_else(|_| "https://api.sandbox.transferwise.tech".into());

        let api_token =
            std::env::var("PAYMENT_API_TOKEN").expect("PAYMENT_API_TOKEN must be set");

        let profile_id =
            std::env::var("PAYMENT_PROFILE_ID").expect("PAYMENT_PROFILE_ID must be set");

        let source_currency =
            std::env::var("PAYMENT_SOURCE_CURRENCY").unwrap_or_else(|_| "USD".into());

        let request_timeout_secs: u64 = std::env::var("PAYMENT_REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("PAYMENT_REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            api_url,
            api_token,
            profile_id,
            source_currency,
            request_timeout_secs,
        }
    }
}
