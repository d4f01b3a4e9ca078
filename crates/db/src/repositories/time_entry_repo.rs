//! Repository for the `time_entries` table.
//!
//! The open/closed transitions are all conditional updates on
//! `ended_at IS NULL` so racing writers (a toggle and the limit enforcer,
//! or two concurrent toggles) observe zero affected rows instead of
//! double-processing.

use sqlx::PgPool;
use tally_core::tracking::ClosedSpan;
use tally_core::types::{DbId, Timestamp};

use crate::models::time_entry::{CreateManualEntry, TimeEntry, TimeEntryQuery, UpdateManualEntry};

// ---------------------------------------------------------------------------
// Column list
// ---------------------------------------------------------------------------

pub(crate) const COLUMNS: &str = "\
    id, member_id, task_id, project_id, started_at, ended_at, billable, \
    billable_rate, is_paid, paid_rate, amount_paid, paycheck_id, \
    added_manually, stopped_by_system, created_at, updated_at";

/// Outcome of an attempt to start the timer for a (member, task) pair.
#[derive(Debug)]
pub enum StartOutcome {
    /// A new open entry was created.
    Started(TimeEntry),
    /// A concurrent writer opened an entry first; this is that entry.
    AlreadyOpen(TimeEntry),
}

/// Provides state transitions and queries for time entries.
pub struct TimeEntryRepo;

impl TimeEntryRepo {
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<TimeEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM time_entries WHERE id = $1");
        sqlx::query_as::<_, TimeEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// The open entry for a (member, task) pair, if one exists.
    pub async fn find_open_for_pair(
        pool: &PgPool,
        member_id: DbId,
        task_id: DbId,
    ) -> Result<Option<TimeEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM time_entries \
             WHERE member_id = $1 AND task_id = $2 AND ended_at IS NULL"
        );
        sqlx::query_as::<_, TimeEntry>(&query)
            .bind(member_id)
            .bind(task_id)
            .fetch_optional(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Timer transitions
    // -----------------------------------------------------------------------

    /// Close the open entry for a pair, if any. Returns the closed entry,
    /// or `None` when nothing was open (a racing writer got there first).
    pub async fn close_open_for_pair(
        pool: &PgPool,
        member_id: DbId,
        task_id: DbId,
        now: Timestamp,
    ) -> Result<Option<TimeEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE time_entries \
             SET ended_at = $3, stopped_by_system = FALSE, updated_at = NOW() \
             WHERE member_id = $1 AND task_id = $2 AND ended_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TimeEntry>(&query)
            .bind(member_id)
            .bind(task_id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// Open a new entry for a pair.
    ///
    /// The partial unique index `uq_time_entries_open_pair` guarantees at
    /// most one open row per pair; a loser of a concurrent start observes
    /// the winner's row via [`StartOutcome::AlreadyOpen`].
    pub async fn start(
        pool: &PgPool,
        member_id: DbId,
        task_id: DbId,
        project_id: DbId,
        billable: bool,
        billable_rate: rust_decimal::Decimal,
        now: Timestamp,
    ) -> Result<StartOutcome, sqlx::Error> {
        let query = format!(
            "INSERT INTO time_entries \
                 (member_id, task_id, project_id, started_at, billable, billable_rate) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING {COLUMNS}"
        );
        let inserted = sqlx::query_as::<_, TimeEntry>(&query)
            .bind(member_id)
            .bind(task_id)
            .bind(project_id)
            .bind(now)
            .bind(billable)
            .bind(billable_rate)
            .fetch_one(pool)
            .await;

        match inserted {
            Ok(entry) => Ok(StartOutcome::Started(entry)),
            Err(err) if is_open_pair_violation(&err) => {
                match Self::find_open_for_pair(pool, member_id, task_id).await? {
                    Some(existing) => Ok(StartOutcome::AlreadyOpen(existing)),
                    // The racing entry was closed between our insert and
                    // re-read; surface the original conflict.
                    None => Err(err),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Force-stop an open entry on behalf of the limit enforcer.
    ///
    /// Idempotent: an already-closed entry yields `None` and no mutation.
    pub async fn force_stop(
        pool: &PgPool,
        id: DbId,
        now: Timestamp,
    ) -> Result<Option<TimeEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE time_entries \
             SET ended_at = $2, stopped_by_system = TRUE, updated_at = NOW() \
             WHERE id = $1 AND ended_at IS NULL \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TimeEntry>(&query)
            .bind(id)
            .bind(now)
            .fetch_optional(pool)
            .await
    }

    /// All currently open entries, oldest first. Scanned by the enforcer
    /// tick.
    pub async fn list_open(pool: &PgPool) -> Result<Vec<TimeEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM time_entries \
             WHERE ended_at IS NULL ORDER BY started_at ASC"
        );
        sqlx::query_as::<_, TimeEntry>(&query).fetch_all(pool).await
    }

    /// Closed spans for a member overlapping the window. Clipping to the
    /// window edges is done by the caller in pure code.
    pub async fn closed_spans_for_member(
        pool: &PgPool,
        member_id: DbId,
        window_start: Timestamp,
        window_end: Timestamp,
    ) -> Result<Vec<ClosedSpan>, sqlx::Error> {
        let rows: Vec<(Timestamp, Timestamp)> = sqlx::query_as(
            "SELECT started_at, ended_at FROM time_entries \
             WHERE member_id = $1 AND ended_at IS NOT NULL \
               AND started_at < $3 AND ended_at > $2",
        )
        .bind(member_id)
        .bind(window_start)
        .bind(window_end)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(start, end)| ClosedSpan::new(start, end))
            .collect())
    }

    // -----------------------------------------------------------------------
    // Manual entries
    // -----------------------------------------------------------------------

    /// Insert a manual, already-closed entry.
    pub async fn insert_manual(
        pool: &PgPool,
        input: &CreateManualEntry,
        billable_rate: rust_decimal::Decimal,
    ) -> Result<TimeEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO time_entries \
                 (member_id, task_id, project_id, started_at, ended_at, \
                  billable, billable_rate, added_manually) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TimeEntry>(&query)
            .bind(input.member_id)
            .bind(input.task_id)
            .bind(input.project_id)
            .bind(input.started_at)
            .bind(input.ended_at)
            .bind(input.billable)
            .bind(billable_rate)
            .fetch_one(pool)
            .await
    }

    /// Patch a manual entry. Settled entries are immutable: the update is
    /// conditional on `is_paid = FALSE`.
    pub async fn update_manual(
        pool: &PgPool,
        id: DbId,
        input: &UpdateManualEntry,
    ) -> Result<Option<TimeEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE time_entries SET \
                 started_at = COALESCE($2, started_at), \
                 ended_at = COALESCE($3, ended_at), \
                 billable = COALESCE($4, billable), \
                 updated_at = NOW() \
             WHERE id = $1 AND added_manually = TRUE AND is_paid = FALSE \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, TimeEntry>(&query)
            .bind(id)
            .bind(input.started_at)
            .bind(input.ended_at)
            .bind(input.billable)
            .fetch_optional(pool)
            .await
    }

    /// Delete an entry. Refuses rows linked to a paycheck.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM time_entries WHERE id = $1 AND paycheck_id IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// How many of the given ids exist at all. Used to reject selections
    /// containing unknown ids before any mutation.
    pub async fn count_existing(pool: &PgPool, ids: &[DbId]) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*)::BIGINT FROM time_entries WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_one(pool)
        .await
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    /// Query entries with optional filters and pagination.
    pub async fn query(
        pool: &PgPool,
        params: &TimeEntryQuery,
    ) -> Result<Vec<TimeEntry>, sqlx::Error> {
        let limit = params.limit.unwrap_or(50).min(500);
        let offset = params.offset.unwrap_or(0);

        let mut conditions: Vec<String> = Vec::new();
        let mut bind_idx = 1u32;
        let mut id_binds: Vec<DbId> = Vec::new();
        let mut ts_binds: Vec<Timestamp> = Vec::new();

        if let Some(member_id) = params.member_id {
            conditions.push(format!("member_id = ${bind_idx}"));
            bind_idx += 1;
            id_binds.push(member_id);
        }
        if let Some(project_id) = params.project_id {
            conditions.push(format!("project_id = ${bind_idx}"));
            bind_idx += 1;
            id_binds.push(project_id);
        }
        if let Some(task_id) = params.task_id {
            conditions.push(format!("task_id = ${bind_idx}"));
            bind_idx += 1;
            id_binds.push(task_id);
        }
        if let Some(from) = params.from {
            conditions.push(format!("started_at >= ${bind_idx}"));
            bind_idx += 1;
            ts_binds.push(from);
        }
        if let Some(to) = params.to {
            conditions.push(format!("started_at <= ${bind_idx}"));
            bind_idx += 1;
            ts_binds.push(to);
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let query = format!(
            "SELECT {COLUMNS} FROM time_entries {where_clause} \
             ORDER BY started_at DESC \
             LIMIT ${bind_idx} OFFSET ${}",
            bind_idx + 1
        );

        let mut q = sqlx::query_as::<_, TimeEntry>(&query);
        for id in &id_binds {
            q = q.bind(*id);
        }
        for ts in &ts_binds {
            q = q.bind(*ts);
        }
        q.bind(limit).bind(offset).fetch_all(pool).await
    }
}

/// Whether an insert failed on the one-open-entry-per-pair index.
fn is_open_pair_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.code().as_deref() == Some("23505")
                && db_err.constraint() == Some("uq_time_entries_open_pair")
        }
        _ => false,
    }
}
