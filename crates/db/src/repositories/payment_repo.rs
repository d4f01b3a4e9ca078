//! Repository for the `payments` table (ad-hoc manual payouts).

use sqlx::PgPool;
use tally_core::types::{DbId, Timestamp};

use crate::models::payment::{CreatePayment, Payment};

const COLUMNS: &str = "\
    id, payee_id, amount, currency, status, provider_transfer_id, \
    last_event_at, created_at, updated_at";

pub struct PaymentRepo;

impl PaymentRepo {
    pub async fn create(pool: &PgPool, input: &CreatePayment) -> Result<Payment, sqlx::Error> {
        let query = format!(
            "INSERT INTO payments (payee_id, amount, currency) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(input.payee_id)
            .bind(input.amount)
            .bind(&input.currency)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_provider_transfer_id(
        pool: &PgPool,
        provider_transfer_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM payments WHERE provider_transfer_id = $1");
        sqlx::query_as::<_, Payment>(&query)
            .bind(provider_transfer_id)
            .fetch_optional(pool)
            .await
    }

    /// List payments for a payee, newest first.
    pub async fn list_for_payee(
        pool: &PgPool,
        payee_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Payment>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM payments WHERE payee_id = $1 \
             ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(payee_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Record the provider transfer id once the payout is created.
    pub async fn set_provider_transfer(
        pool: &PgPool,
        id: DbId,
        provider_transfer_id: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET provider_transfer_id = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(provider_transfer_id)
            .fetch_optional(pool)
            .await
    }

    /// Set the status directly (e.g. marking a payout failed when the
    /// provider rejects it before any transfer exists).
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "UPDATE payments SET status = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }

    /// Apply a webhook event monotonically; same contract as
    /// [`crate::repositories::TransferRepo::apply_event`].
    pub async fn apply_event(
        pool: &PgPool,
        provider_transfer_id: &str,
        status: &str,
        occurred_at: Timestamp,
    ) -> Result<Option<Payment>, sqlx::Error> {
        let query = format!(
            "UPDATE payments \
             SET status = $2, last_event_at = $3, updated_at = NOW() \
             WHERE provider_transfer_id = $1 \
               AND (last_event_at IS NULL OR last_event_at < $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Payment>(&query)
            .bind(provider_transfer_id)
            .bind(status)
            .bind(occurred_at)
            .fetch_optional(pool)
            .await
    }
}
