//! Repository for the `paychecks` table.

use sqlx::PgPool;
use tally_core::types::DbId;

use crate::models::paycheck::Paycheck;

pub(crate) const COLUMNS: &str = "\
    id, member_id, project_id, total_hours, total_amount, currency, \
    status, payment_method, created_at, updated_at";

pub struct PaycheckRepo;

impl PaycheckRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Paycheck>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM paychecks WHERE id = $1");
        sqlx::query_as::<_, Paycheck>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List paychecks, optionally restricted to one member, newest first.
    pub async fn list(
        pool: &PgPool,
        member_id: Option<DbId>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Paycheck>, sqlx::Error> {
        match member_id {
            Some(member_id) => {
                let query = format!(
                    "SELECT {COLUMNS} FROM paychecks WHERE member_id = $1 \
                     ORDER BY created_at DESC LIMIT $2 OFFSET $3"
                );
                sqlx::query_as::<_, Paycheck>(&query)
                    .bind(member_id)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
            None => {
                let query = format!(
                    "SELECT {COLUMNS} FROM paychecks \
                     ORDER BY created_at DESC LIMIT $1 OFFSET $2"
                );
                sqlx::query_as::<_, Paycheck>(&query)
                    .bind(limit)
                    .bind(offset)
                    .fetch_all(pool)
                    .await
            }
        }
    }

    /// Advance a paycheck's status (webhook reconciliation or a failed
    /// orchestration marking it failed).
    pub async fn update_status(
        pool: &PgPool,
        id: DbId,
        status: &str,
    ) -> Result<Option<Paycheck>, sqlx::Error> {
        let query = format!(
            "UPDATE paychecks SET status = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Paycheck>(&query)
            .bind(id)
            .bind(status)
            .fetch_optional(pool)
            .await
    }
}
