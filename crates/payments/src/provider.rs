//! The payment provider seam.
//!
//! Handlers and the orchestrator talk to `dyn PaymentProvider`, so tests
//! can substitute a stub and the settlement path never depends on a live
//! provider being reachable.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::api::{
    FundResponse, ProviderApi, ProviderApiError, QuoteResponse, RecipientResponse,
    TransferResponse,
};

/// The four protocol steps the orchestrator drives, in order.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_quote(
        &self,
        target_currency: &str,
        target_amount: Decimal,
    ) -> Result<QuoteResponse, ProviderApiError>;

    async fn list_recipients(
        &self,
        currency: &str,
    ) -> Result<Vec<RecipientResponse>, ProviderApiError>;

    async fn create_recipient(
        &self,
        holder_name: &str,
        email: &str,
        currency: &str,
    ) -> Result<RecipientResponse, ProviderApiError>;

    async fn create_transfer(
        &self,
        quote_id: &str,
        recipient_id: &str,
        reference: &str,
    ) -> Result<TransferResponse, ProviderApiError>;

    async fn fund_transfer(&self, transfer_id: &str) -> Result<FundResponse, ProviderApiError>;
}

#[async_trait]
impl PaymentProvider for ProviderApi {
    async fn create_quote(
        &self,
        target_currency: &str,
        target_amount: Decimal,
    ) -> Result<QuoteResponse, ProviderApiError> {
        ProviderApi::create_quote(self, target_currency, target_amount).await
    }

    async fn list_recipients(
        &self,
        currency: &str,
    ) -> Result<Vec<RecipientResponse>, ProviderApiError> {
        ProviderApi::list_recipients(self, currency).await
    }

    async fn create_recipient(
        &self,
        holder_name: &str,
        email: &str,
        currency: &str,
    ) -> Result<RecipientResponse, ProviderApiError> {
        ProviderApi::create_recipient(self, holder_name, email, currency).await
    }

    async fn create_transfer(
        &self,
        quote_id: &str,
        recipient_id: &str,
        reference: &str,
    ) -> Result<TransferResponse, ProviderApiError> {
        ProviderApi::create_transfer(self, quote_id, recipient_id, reference).await
    }

    async fn fund_transfer(&self, transfer_id: &str) -> Result<FundResponse, ProviderApiError> {
        ProviderApi::fund_transfer(self, transfer_id).await
    }
}
