//! Repository for the `transfers` table.

use sqlx::PgPool;
use tally_core::types::{DbId, Timestamp};

use crate::models::transfer::{CreateTransfer, Transfer};

const COLUMNS: &str = "\
    id, paycheck_id, provider_transfer_id, provider_recipient_id, quote_id, \
    status, source_amount, source_currency, target_amount, target_currency, \
    rate, raw_response, last_event_at, created_at, updated_at";

pub struct TransferRepo;

impl TransferRepo {
    /// Persist a transfer after the provider accepted its creation.
    pub async fn create(pool: &PgPool, input: &CreateTransfer) -> Result<Transfer, sqlx::Error> {
        let query = format!(
            "INSERT INTO transfers \
                 (paycheck_id, provider_transfer_id, provider_recipient_id, quote_id, \
                  status, source_amount, source_currency, target_amount, \
                  target_currency, rate, raw_response) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Transfer>(&query)
            .bind(input.paycheck_id)
            .bind(&input.provider_transfer_id)
            .bind(&input.provider_recipient_id)
            .bind(&input.quote_id)
            .bind(&input.status)
            .bind(input.source_amount)
            .bind(&input.source_currency)
            .bind(input.target_amount)
            .bind(&input.target_currency)
            .bind(input.rate)
            .bind(&input.raw_response)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_paycheck_id(
        pool: &PgPool,
        paycheck_id: DbId,
    ) -> Result<Option<Transfer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM transfers WHERE paycheck_id = $1");
        sqlx::query_as::<_, Transfer>(&query)
            .bind(paycheck_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_provider_transfer_id(
        pool: &PgPool,
        provider_transfer_id: &str,
    ) -> Result<Option<Transfer>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM transfers WHERE provider_transfer_id = $1");
        sqlx::query_as::<_, Transfer>(&query)
            .bind(provider_transfer_id)
            .fetch_optional(pool)
            .await
    }

    /// Set the status directly (used right after funding succeeds).
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Transfer>, sqlx::Error> {
        let query = format!(
            "UPDATE transfers SET status = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Transfer>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Apply a webhook event to a transfer, monotonically.
    ///
    /// The update only lands when `occurred_at` is strictly newer than the
    /// stored `last_event_at`, so late or replayed events cannot regress
    /// the status. Returns the updated row, or `None` when the event was
    /// stale (or the transfer unknown).
    pub async fn apply_event(
        pool: &PgPool,
        provider_transfer_id: &str,
        status: &str,
        occurred_at: Timestamp,
    ) -> Result<Option<Transfer>, sqlx::Error> {
        let query = format!(
            "UPDATE transfers \
             SET status = $2, last_event_at = $3, updated_at = NOW() \
             WHERE provider_transfer_id = $1 \
               AND (last_event_at IS NULL OR last_event_at < $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Transfer>(&query)
            .bind(provider_transfer_id)
            .bind(status)
            .bind(occurred_at)
            .fetch_optional(pool)
            .await
    }
}
