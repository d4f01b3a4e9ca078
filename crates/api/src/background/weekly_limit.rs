//! Weekly limit enforcement tick.
//!
//! Once a minute, every open time entry is projected to the end of the
//! current member-local calendar week: closed seconds this week plus the
//! open entry's provisional elapsed time. Entries whose projection reaches
//! the member's weekly ceiling are force-stopped. Runs until the
//! cancellation token fires.
//!
//! The tick runs concurrently with timer toggles on the same rows; the
//! force-stop is a conditional update, so an entry the member stopped a
//! moment earlier is a no-op here, not an error.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use tally_core::limits::should_force_stop;
use tally_core::tracking::{open_seconds_within, sum_tracked_seconds};
use tally_core::types::Timestamp;
use tally_core::workweek::{parse_timezone, week_bounds_utc};
use tally_db::models::time_entry::TimeEntry;
use tally_db::repositories::{MemberRepo, TimeEntryRepo};

/// How often open entries are checked against their member's ceiling.
const ENFORCEMENT_INTERVAL: Duration = Duration::from_secs(60);

/// Run the weekly limit enforcement loop.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = ENFORCEMENT_INTERVAL.as_secs(),
        "Weekly limit enforcer started"
    );

    let mut interval = tokio::time::interval(ENFORCEMENT_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Weekly limit enforcer stopping");
                break;
            }
            _ = interval.tick() => {
                if let Err(e) = run_tick(&pool, Utc::now()).await {
                    tracing::error!(error = %e, "Weekly limit tick failed");
                }
            }
        }
    }
}

/// One enforcement pass over all open entries.
///
/// A failure on a single entry is logged and does not abort the pass;
/// returns an error only when the open-entry scan itself fails.
pub async fn run_tick(pool: &PgPool, now: Timestamp) -> Result<(), sqlx::Error> {
    let open_entries = TimeEntryRepo::list_open(pool).await?;

    for entry in &open_entries {
        if let Err(e) = check_entry(pool, entry, now).await {
            tracing::error!(
                entry_id = entry.id,
                member_id = entry.member_id,
                error = %e,
                "Failed to enforce weekly limit for entry"
            );
        }
    }

    Ok(())
}

/// Project one open entry against its member's weekly ceiling and stop it
/// if the ceiling is reached.
async fn check_entry(pool: &PgPool, entry: &TimeEntry, now: Timestamp) -> Result<(), sqlx::Error> {
    let Some(config) = MemberRepo::find_limit_config(pool, entry.member_id).await? else {
        // Member projection missing; nothing to enforce against.
        return Ok(());
    };

    if !config.weekly_limit_enabled {
        return Ok(());
    }

    let tz = parse_timezone(&config.timezone);
    let (week_start, week_end) = week_bounds_utc(now, tz);

    let spans =
        TimeEntryRepo::closed_spans_for_member(pool, entry.member_id, week_start, week_end).await?;
    let completed = sum_tracked_seconds(&spans, week_start, week_end);
    let provisional = open_seconds_within(entry.started_at, now, week_start, week_end);

    if !should_force_stop(completed, provisional, config.weekly_limit_hours) {
        return Ok(());
    }

    match TimeEntryRepo::force_stop(pool, entry.id, now).await? {
        Some(stopped) => {
            tracing::info!(
                entry_id = stopped.id,
                member_id = stopped.member_id,
                completed_seconds = completed,
                provisional_seconds = provisional,
                limit_hours = %config.weekly_limit_hours,
                "Weekly limit reached; entry force-stopped"
            );
        }
        None => {
            tracing::debug!(
                entry_id = entry.id,
                "Entry closed before force-stop; nothing to do"
            );
        }
    }

    Ok(())
}
