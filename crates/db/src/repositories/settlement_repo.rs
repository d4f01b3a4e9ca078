//! Settlement transaction: turn a member's unpaid closed entries into a
//! paycheck.
//!
//! The whole run happens inside one transaction so an entry closed or
//! settled by a concurrent writer between selection and update cannot be
//! double-counted: every paid-flag flip re-checks `is_paid = FALSE` and the
//! paycheck totals are recomputed from the rows that were actually updated.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use tally_core::settlement::{entry_amount, EntrySelection, SettlementTotals};
use tally_core::types::DbId;

use crate::models::member::Member;
use crate::models::paycheck::Paycheck;
use crate::models::time_entry::TimeEntry;
use crate::repositories::paycheck_repo;
use crate::repositories::time_entry_repo::COLUMNS as ENTRY_COLUMNS;

/// The outcome of one member's settlement run.
#[derive(Debug)]
pub struct SettlementRun {
    pub paycheck: Paycheck,
    pub entries: Vec<TimeEntry>,
}

pub struct SettlementRepo;

impl SettlementRepo {
    /// Settle the selected entries for one member within one transaction.
    ///
    /// Returns `Ok(None)` when nothing eligible (or nothing payable)
    /// remained at update time; no paycheck row survives in that case.
    pub async fn settle_member(
        pool: &PgPool,
        member: &Member,
        project_id: DbId,
        selection: &EntrySelection,
    ) -> Result<Option<SettlementRun>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let eligible = select_eligible(&mut tx, member.id, project_id, selection).await?;
        if eligible.is_empty() {
            return Ok(None);
        }

        // Provisional totals from the snapshot; per-entry amounts use the
        // member's current billable rate.
        let rate = member.billable_rate;
        let mut totals = SettlementTotals::default();
        for entry in &eligible {
            let Some(duration) = entry.duration_seconds() else {
                continue;
            };
            totals.add_entry(duration, entry_amount(duration, rate));
        }
        if totals.is_zero() {
            return Ok(None);
        }

        let paycheck = insert_paycheck(&mut tx, member, project_id, &totals).await?;

        // Flip each entry, re-checking is_paid under the transaction. Rows
        // lost to a concurrent settlement run simply drop out here.
        let mut settled: Vec<TimeEntry> = Vec::with_capacity(eligible.len());
        let mut final_totals = SettlementTotals::default();
        for entry in &eligible {
            let Some(duration) = entry.duration_seconds() else {
                continue;
            };
            let amount = entry_amount(duration, rate);
            let updated = mark_settled(&mut tx, entry.id, rate, amount, paycheck.id).await?;
            if let Some(updated) = updated {
                final_totals.add_entry(duration, amount);
                settled.push(updated);
            }
        }

        if settled.is_empty() || final_totals.is_zero() {
            // Everything was claimed by a concurrent run; drop the paycheck
            // by rolling the transaction back.
            tx.rollback().await?;
            return Ok(None);
        }

        let paycheck = if final_totals == totals {
            paycheck
        } else {
            finalize_totals(&mut tx, paycheck.id, &final_totals).await?
        };

        tx.commit().await?;

        Ok(Some(SettlementRun {
            paycheck,
            entries: settled,
        }))
    }
}

// ---------------------------------------------------------------------------
// Transaction steps
// ---------------------------------------------------------------------------

/// Load the member's unpaid, closed entries matched by the selection.
async fn select_eligible(
    tx: &mut Transaction<'_, Postgres>,
    member_id: DbId,
    project_id: DbId,
    selection: &EntrySelection,
) -> Result<Vec<TimeEntry>, sqlx::Error> {
    match selection {
        EntrySelection::ByIds(ids) => {
            let query = format!(
                "SELECT {ENTRY_COLUMNS} FROM time_entries \
                 WHERE member_id = $1 AND project_id = $2 \
                   AND id = ANY($3) \
                   AND is_paid = FALSE AND ended_at IS NOT NULL \
                 ORDER BY started_at ASC"
            );
            sqlx::query_as::<_, TimeEntry>(&query)
                .bind(member_id)
                .bind(project_id)
                .bind(ids)
                .fetch_all(&mut **tx)
                .await
        }
        EntrySelection::ByDateRange { from, to } => {
            let query = format!(
                "SELECT {ENTRY_COLUMNS} FROM time_entries \
                 WHERE member_id = $1 AND project_id = $2 \
                   AND started_at >= $3 AND started_at <= $4 \
                   AND is_paid = FALSE AND ended_at IS NOT NULL \
                 ORDER BY started_at ASC"
            );
            sqlx::query_as::<_, TimeEntry>(&query)
                .bind(member_id)
                .bind(project_id)
                .bind(from)
                .bind(to)
                .fetch_all(&mut **tx)
                .await
        }
    }
}

async fn insert_paycheck(
    tx: &mut Transaction<'_, Postgres>,
    member: &Member,
    project_id: DbId,
    totals: &SettlementTotals,
) -> Result<Paycheck, sqlx::Error> {
    let query = format!(
        "INSERT INTO paychecks \
             (member_id, project_id, total_hours, total_amount, currency) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING {}",
        paycheck_repo::COLUMNS
    );
    sqlx::query_as::<_, Paycheck>(&query)
        .bind(member.id)
        .bind(project_id)
        .bind(totals.rounded_hours())
        .bind(totals.amount)
        .bind(&member.currency)
        .fetch_one(&mut **tx)
        .await
}

/// Conditionally flip one entry to paid. `None` means a concurrent run got
/// there first.
async fn mark_settled(
    tx: &mut Transaction<'_, Postgres>,
    entry_id: DbId,
    rate: Decimal,
    amount: Decimal,
    paycheck_id: DbId,
) -> Result<Option<TimeEntry>, sqlx::Error> {
    let query = format!(
        "UPDATE time_entries \
         SET is_paid = TRUE, paid_rate = $2, amount_paid = $3, \
             paycheck_id = $4, updated_at = NOW() \
         WHERE id = $1 AND is_paid = FALSE \
         RETURNING {ENTRY_COLUMNS}"
    );
    sqlx::query_as::<_, TimeEntry>(&query)
        .bind(entry_id)
        .bind(rate)
        .bind(amount)
        .bind(paycheck_id)
        .fetch_optional(&mut **tx)
        .await
}

/// Replace the provisional totals with the totals of the rows actually
/// consumed.
async fn finalize_totals(
    tx: &mut Transaction<'_, Postgres>,
    paycheck_id: DbId,
    totals: &SettlementTotals,
) -> Result<Paycheck, sqlx::Error> {
    let query = format!(
        "UPDATE paychecks SET total_hours = $2, total_amount = $3, updated_at = NOW() \
         WHERE id = $1 RETURNING {}",
        paycheck_repo::COLUMNS
    );
    sqlx::query_as::<_, Paycheck>(&query)
        .bind(paycheck_id)
        .bind(totals.rounded_hours())
        .bind(totals.amount)
        .fetch_one(&mut **tx)
        .await
}
