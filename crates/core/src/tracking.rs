//! Interval arithmetic for tracked work time.
//!
//! Everything here is a pure function over timestamps so the enforcer tick
//! and any reporting path can share one clipping implementation. Spans that
//! cross a window boundary contribute only the overlapping portion; spans
//! wholly outside a window contribute zero.

use crate::types::Timestamp;

/// A closed tracked span (both endpoints known).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosedSpan {
    pub started_at: Timestamp,
    pub ended_at: Timestamp,
}

impl ClosedSpan {
    pub fn new(started_at: Timestamp, ended_at: Timestamp) -> Self {
        Self {
            started_at,
            ended_at,
        }
    }

    /// Full duration in seconds, ignoring any window.
    pub fn duration_seconds(&self) -> i64 {
        (self.ended_at - self.started_at).num_seconds().max(0)
    }
}

/// Seconds of `[start, end)` that fall inside `[window_start, window_end)`.
///
/// Start is clipped up to `window_start`, end is clipped down to
/// `window_end`. A span entirely outside the window (or inverted after
/// clipping) yields 0.
pub fn clipped_seconds(
    start: Timestamp,
    end: Timestamp,
    window_start: Timestamp,
    window_end: Timestamp,
) -> i64 {
    let clipped_start = start.max(window_start);
    let clipped_end = end.min(window_end);
    (clipped_end - clipped_start).num_seconds().max(0)
}

/// Sum the tracked seconds of the given closed spans inside the window.
///
/// Deterministic and side-effect free; safe to call repeatedly on the same
/// inputs.
pub fn sum_tracked_seconds(
    spans: &[ClosedSpan],
    window_start: Timestamp,
    window_end: Timestamp,
) -> i64 {
    spans
        .iter()
        .map(|s| clipped_seconds(s.started_at, s.ended_at, window_start, window_end))
        .sum()
}

/// Seconds an open span has accumulated inside the window, treating `now`
/// as a provisional end.
pub fn open_seconds_within(
    started_at: Timestamp,
    now: Timestamp,
    window_start: Timestamp,
    window_end: Timestamp,
) -> i64 {
    clipped_seconds(started_at, now, window_start, window_end)
}
