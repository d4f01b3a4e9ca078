//! Drives the provider's multi-step transfer protocol for a paycheck:
//! quote → recipient resolution → transfer creation → funding.
//!
//! The local settlement transaction has already committed by the time this
//! runs; any step failure surfaces immediately and leaves the paycheck in
//! `processing` for the retry path. The transfer row is persisted as soon
//! as the provider accepts the creation call, so a funding failure leaves a
//! resumable row and a retry resumes at the funding step only.

use tally_core::status::payment_status;
use tally_db::models::member::Member;
use tally_db::models::payment::Payment;
use tally_db::models::paycheck::Paycheck;
use tally_db::models::transfer::{CreateTransfer, Transfer};
use tally_db::repositories::{MemberRepo, PaymentRepo, TransferRepo};
use tally_db::DbPool;

use crate::api::ProviderApiError;
use crate::provider::PaymentProvider;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Provider(#[from] ProviderApiError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Executes and resumes provider transfers for paychecks and ad-hoc
/// payments.
pub struct TransferOrchestrator<'a> {
    pool: &'a DbPool,
    provider: &'a dyn PaymentProvider,
}

impl<'a> TransferOrchestrator<'a> {
    pub fn new(pool: &'a DbPool, provider: &'a dyn PaymentProvider) -> Self {
        Self { pool, provider }
    }

    /// Run the full protocol for a freshly created paycheck.
    pub async fn execute(
        &self,
        paycheck: &Paycheck,
        member: &Member,
        recipient_override: Option<&str>,
    ) -> Result<Transfer, OrchestratorError> {
        let quote = self
            .provider
            .create_quote(&paycheck.currency, paycheck.total_amount)
            .await?;

        let recipient_id = self.resolve_recipient(member, recipient_override).await?;

        let reference = paycheck_reference(paycheck);
        let created = self
            .provider
            .create_transfer(&quote.id, &recipient_id, &reference)
            .await?;

        tracing::info!(
            paycheck_id = paycheck.id,
            provider_transfer_id = %created.id,
            "Provider transfer created"
        );

        // Persist before funding: a funding failure must leave a row the
        // retry endpoint can resume from.
        let transfer = TransferRepo::create(
            self.pool,
            &CreateTransfer {
                paycheck_id: paycheck.id,
                provider_transfer_id: created.id.clone(),
                provider_recipient_id: recipient_id,
                quote_id: quote.id.clone(),
                status: payment_status::PROCESSING.to_string(),
                source_amount: quote.source_amount,
                source_currency: quote.source_currency.clone(),
                target_amount: quote.target_amount,
                target_currency: quote.target_currency.clone(),
                rate: quote.rate,
                raw_response: serde_json::json!({
                    "quote": quote,
                    "transfer": created,
                }),
            },
        )
        .await?;

        self.fund(&transfer).await?;

        Ok(transfer)
    }

    /// Resume a paycheck whose earlier orchestration failed part-way.
    ///
    /// If a transfer row already exists the provider accepted the creation
    /// call, so only funding is retried; otherwise the whole protocol runs
    /// again under the same paycheck-derived reference.
    pub async fn resume(
        &self,
        paycheck: &Paycheck,
        member: &Member,
    ) -> Result<Transfer, OrchestratorError> {
        match TransferRepo::find_by_paycheck_id(self.pool, paycheck.id).await? {
            Some(existing) => {
                tracing::info!(
                    paycheck_id = paycheck.id,
                    provider_transfer_id = %existing.provider_transfer_id,
                    "Resuming transfer at the funding step"
                );
                self.fund(&existing).await?;
                Ok(existing)
            }
            None => self.execute(paycheck, member, None).await,
        }
    }

    /// Run the simpler ad-hoc payment path: same protocol, but the local
    /// record is a payment row rather than a paycheck-linked transfer.
    pub async fn pay(&self, payment: &Payment, member: &Member) -> Result<Payment, OrchestratorError> {
        let quote = self
            .provider
            .create_quote(&payment.currency, payment.amount)
            .await?;

        let recipient_id = self.resolve_recipient(member, None).await?;

        let reference = format!("payment-{}", payment.id);
        let created = self
            .provider
            .create_transfer(&quote.id, &recipient_id, &reference)
            .await?;

        let updated = PaymentRepo::set_provider_transfer(self.pool, payment.id, &created.id)
            .await?
            .unwrap_or_else(|| payment.clone());

        self.provider.fund_transfer(&created.id).await?;

        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Protocol steps
    // -----------------------------------------------------------------------

    /// Find or create the payee's recipient account.
    ///
    /// Preference order: explicit override from the request, the id stored
    /// on the member row, an existing provider account matching the
    /// member's email, then account creation. A newly resolved id is
    /// written back to the member so later transfers skip this step.
    async fn resolve_recipient(
        &self,
        member: &Member,
        recipient_override: Option<&str>,
    ) -> Result<String, OrchestratorError> {
        if let Some(id) = recipient_override {
            return Ok(id.to_string());
        }
        if let Some(ref id) = member.provider_recipient_id {
            return Ok(id.clone());
        }

        let existing = self
            .provider
            .list_recipients(&member.currency)
            .await?
            .into_iter()
            .find(|r| r.email.as_deref() == Some(member.email.as_str()));

        let recipient = match existing {
            Some(recipient) => recipient,
            None => {
                self.provider
                    .create_recipient(&member.display_name, &member.email, &member.currency)
                    .await?
            }
        };

        MemberRepo::set_provider_recipient(self.pool, member.id, &recipient.id).await?;

        Ok(recipient.id)
    }

    /// Fund a created transfer and record the post-funding status.
    async fn fund(&self, transfer: &Transfer) -> Result<(), OrchestratorError> {
        let funded = self
            .provider
            .fund_transfer(&transfer.provider_transfer_id)
            .await?;

        tracing::info!(
            transfer_id = transfer.id,
            provider_status = %funded.status,
            "Transfer funded"
        );

        TransferRepo::update_status(self.pool, transfer.id, payment_status::PROCESSING).await?;

        Ok(())
    }
}

/// The provider-side reference for a paycheck; also the idempotency key
/// reused by retries.
pub fn paycheck_reference(paycheck: &Paycheck) -> String {
    format!("paycheck-{}", paycheck.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_is_derived_from_the_paycheck_id() {
        use chrono::Utc;
        use rust_decimal::Decimal;

        let paycheck = Paycheck {
            id: 42,
            member_id: 1,
            project_id: 1,
            total_hours: Decimal::from(3),
            total_amount: Decimal::from(60),
            currency: "USD".into(),
            status: "processing".into(),
            payment_method: "bank_transfer".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(paycheck_reference(&paycheck), "paycheck-42");
    }
}
