//! Weekly ceiling projection for the limit enforcer.
//!
//! The enforcer tick combines the member's completed seconds this week with
//! the provisional seconds of the currently open entry and stops the timer
//! once the projection reaches the configured ceiling.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Convert a fractional hour limit into whole seconds (truncating).
pub fn limit_seconds(weekly_limit_hours: Decimal) -> i64 {
    (weekly_limit_hours * Decimal::from(3600))
        .trunc()
        .to_i64()
        .unwrap_or(i64::MAX)
}

/// Whether an open entry must be force-stopped.
///
/// `completed_seconds` is the clipped sum of this week's closed entries,
/// `provisional_seconds` the clipped elapsed time of the open entry. The
/// comparison is `>=`: hitting the ceiling exactly stops the timer.
pub fn should_force_stop(
    completed_seconds: i64,
    provisional_seconds: i64,
    weekly_limit_hours: Decimal,
) -> bool {
    completed_seconds + provisional_seconds >= limit_seconds(weekly_limit_hours)
}
