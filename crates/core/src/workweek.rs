//! Member-local calendar week boundaries.
//!
//! Weekly limits are enforced against the member's own calendar week:
//! Monday 00:00 local time up to (but not including) the next Monday 00:00.
//! Both bounds are returned in UTC so they can be used directly in queries
//! and in the interval clipping math.

use chrono::{Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::types::Timestamp;

/// Resolve the local-midnight instant for a date, stepping past DST gaps.
///
/// Midnight can be skipped (spring-forward) or occur twice (fall-back) in
/// some zones; a skipped midnight resolves to the first valid instant after
/// it, an ambiguous one to the earlier instant.
fn local_midnight(date: NaiveDate, tz: Tz) -> chrono::DateTime<Tz> {
    let mut naive = date.and_time(NaiveTime::MIN);
    loop {
        match tz.from_local_datetime(&naive) {
            LocalResult::Single(dt) => return dt,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => naive += Duration::minutes(30),
        }
    }
}

/// The UTC bounds `[week_start, week_end)` of the calendar week containing
/// `now` in the given timezone.
pub fn week_bounds_utc(now: Timestamp, tz: Tz) -> (Timestamp, Timestamp) {
    let local = now.with_timezone(&tz);
    let days_from_monday = local.weekday().num_days_from_monday() as i64;
    let monday = local.date_naive() - Duration::days(days_from_monday);

    let start = local_midnight(monday, tz);
    let end = local_midnight(monday + Duration::days(7), tz);

    (start.with_timezone(&Utc), end.with_timezone(&Utc))
}

/// Parse an IANA timezone name, falling back to UTC for unknown values.
///
/// Member rows are owned by an external membership service; a bad timezone
/// string must not break enforcement for everyone else.
pub fn parse_timezone(name: &str) -> Tz {
    name.parse().unwrap_or(Tz::UTC)
}
