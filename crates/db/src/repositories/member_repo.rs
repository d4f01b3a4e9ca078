//! Repository for the `members` table.
//!
//! Member rows are owned by the external membership service; this side
//! reads them and upserts the projection when the service pushes changes.

use rust_decimal::Decimal;
use sqlx::PgPool;
use tally_core::types::DbId;

use crate::models::member::{Member, MemberLimitConfig};

const COLUMNS: &str = "\
    id, display_name, email, billable_rate, currency, timezone, \
    weekly_limit_enabled, weekly_limit_hours, provider_recipient_id, \
    created_at, updated_at";

pub struct MemberRepo;

impl MemberRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Member>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM members WHERE id = $1");
        sqlx::query_as::<_, Member>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The weekly-limit projection for one member.
    pub async fn find_limit_config(
        pool: &PgPool,
        member_id: DbId,
    ) -> Result<Option<MemberLimitConfig>, sqlx::Error> {
        sqlx::query_as::<_, MemberLimitConfig>(
            "SELECT id AS member_id, weekly_limit_enabled, weekly_limit_hours, timezone \
             FROM members WHERE id = $1",
        )
        .bind(member_id)
        .fetch_optional(pool)
        .await
    }

    /// Insert a member projection row (pushed by the membership service;
    /// also used to seed test fixtures).
    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        pool: &PgPool,
        display_name: &str,
        email: &str,
        billable_rate: Decimal,
        currency: &str,
        timezone: &str,
        weekly_limit_enabled: bool,
        weekly_limit_hours: Decimal,
    ) -> Result<Member, sqlx::Error> {
        let query = format!(
            "INSERT INTO members \
                 (display_name, email, billable_rate, currency, timezone, \
                  weekly_limit_enabled, weekly_limit_hours) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Member>(&query)
            .bind(display_name)
            .bind(email)
            .bind(billable_rate)
            .bind(currency)
            .bind(timezone)
            .bind(weekly_limit_enabled)
            .bind(weekly_limit_hours)
            .fetch_one(pool)
            .await
    }

    /// Store the provider-side recipient account id once resolved, so later
    /// transfers skip the recipient-creation step.
    pub async fn set_provider_recipient(
        pool: &PgPool,
        member_id: DbId,
        provider_recipient_id: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE members SET provider_recipient_id = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(member_id)
        .bind(provider_recipient_id)
        .execute(pool)
        .await?;
        Ok(())
    }
}
