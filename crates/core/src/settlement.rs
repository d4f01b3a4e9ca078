//! Settlement money math and selection types.
//!
//! Amounts are `rust_decimal::Decimal` end to end (NUMERIC in PostgreSQL);
//! floating point never touches money. Per-entry amounts are rounded to two
//! decimal places half-away-from-zero, and paycheck totals are the sum of
//! the rounded per-entry amounts so the stored total always equals what the
//! linked entries were paid.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

/// Round a monetary value to 2 decimal places, half away from zero.
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Exact decimal hours for a duration in seconds (unrounded).
pub fn hours_from_seconds(seconds: i64) -> Decimal {
    Decimal::from(seconds) / Decimal::from(3600)
}

/// The payable amount for one entry: `duration_hours × hourly rate`,
/// rounded to cents.
pub fn entry_amount(duration_seconds: i64, hourly_rate: Decimal) -> Decimal {
    round_money(hours_from_seconds(duration_seconds) * hourly_rate)
}

// ---------------------------------------------------------------------------
// Settlement state
// ---------------------------------------------------------------------------

/// The settlement sub-state of a time entry.
///
/// Derived from the row's `is_paid`/`paid_rate`/`amount_paid`/`paycheck_id`
/// columns so downstream code never sees a half-settled mixture.
#[derive(Debug, Clone, PartialEq)]
pub enum SettlementState {
    /// Not yet consumed by any settlement run.
    Unsettled,
    /// Consumed: the rate and amount are final and the entry is linked to
    /// exactly one paycheck.
    Settled {
        rate: Decimal,
        amount: Decimal,
        paycheck_id: DbId,
    },
}

impl SettlementState {
    pub fn is_settled(&self) -> bool {
        matches!(self, SettlementState::Settled { .. })
    }
}

// ---------------------------------------------------------------------------
// Entry selection
// ---------------------------------------------------------------------------

/// How a settlement run selects candidate entries.
///
/// An explicit tagged variant: the repository matches on it directly rather
/// than looking filter behavior up by name.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySelection {
    /// Settle exactly these entry ids (still subject to eligibility checks).
    ByIds(Vec<DbId>),
    /// Settle all eligible entries whose start falls in `[from, to]`.
    ByDateRange { from: Timestamp, to: Timestamp },
}

impl EntrySelection {
    /// Reject malformed selections before any mutation.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self {
            EntrySelection::ByIds(ids) => {
                if ids.is_empty() {
                    return Err(CoreError::Validation(
                        "entry id selection must not be empty".into(),
                    ));
                }
                Ok(())
            }
            EntrySelection::ByDateRange { from, to } => {
                if from > to {
                    return Err(CoreError::Validation(format!(
                        "invalid date range: {from} is after {to}"
                    )));
                }
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Totals accumulation
// ---------------------------------------------------------------------------

/// Running totals for one member's settlement run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SettlementTotals {
    pub hours: Decimal,
    pub amount: Decimal,
}

impl SettlementTotals {
    /// Fold one consumed entry into the totals. `amount` must already be
    /// the rounded per-entry amount so the total matches what was stored.
    pub fn add_entry(&mut self, duration_seconds: i64, amount: Decimal) {
        self.hours += hours_from_seconds(duration_seconds);
        self.amount += amount;
    }

    /// Whether the run produced nothing payable. Zero-hour, zero-amount
    /// runs are skipped rather than creating empty paychecks.
    pub fn is_zero(&self) -> bool {
        self.hours.is_zero() || self.amount.is_zero()
    }

    /// Hours rounded for storage (2 decimal places).
    pub fn rounded_hours(&self) -> Decimal {
        self.hours
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn one_hour_at_twenty_is_twenty() {
        assert_eq!(entry_amount(3600, dec("20")), dec("20.00"));
    }

    #[test]
    fn partial_hours_round_to_cents() {
        // 50 minutes at 30/h = 25.00
        assert_eq!(entry_amount(3000, dec("30")), dec("25.00"));
        // 1 second at 20/h rounds to a single cent boundary.
        assert_eq!(entry_amount(1, dec("20")), dec("0.01"));
    }

    #[test]
    fn three_one_hour_entries_total_sixty() {
        let mut totals = SettlementTotals::default();
        for _ in 0..3 {
            totals.add_entry(3600, entry_amount(3600, dec("20")));
        }
        assert_eq!(totals.rounded_hours(), dec("3.00"));
        assert_eq!(totals.amount, dec("60.00"));
    }

    #[test]
    fn totals_equal_sum_of_rounded_entry_amounts() {
        // 40 minutes at 19.99/h three times: totals must match the stored
        // per-entry amounts, not the unrounded product.
        let mut totals = SettlementTotals::default();
        let per_entry = entry_amount(2400, dec("19.99"));
        for _ in 0..3 {
            totals.add_entry(2400, per_entry);
        }
        assert_eq!(totals.amount, per_entry * Decimal::from(3));
    }

    #[test]
    fn zero_duration_run_is_skipped() {
        let totals = SettlementTotals::default();
        assert!(totals.is_zero());
    }

    #[test]
    fn empty_id_selection_is_rejected() {
        let sel = EntrySelection::ByIds(vec![]);
        assert!(sel.validate().is_err());
    }

    #[test]
    fn inverted_date_range_is_rejected() {
        let sel = EntrySelection::ByDateRange {
            from: Utc.with_ymd_and_hms(2025, 6, 9, 0, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
        };
        assert!(sel.validate().is_err());
    }

    #[test]
    fn valid_selections_pass() {
        assert!(EntrySelection::ByIds(vec![1, 2, 3]).validate().is_ok());
        let range = EntrySelection::ByDateRange {
            from: Utc.with_ymd_and_hms(2025, 6, 2, 0, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(2025, 6, 9, 0, 0, 0).unwrap(),
        };
        assert!(range.validate().is_ok());
    }

    #[test]
    fn settlement_state_reports_settled() {
        let settled = SettlementState::Settled {
            rate: dec("20"),
            amount: dec("40.00"),
            paycheck_id: 7,
        };
        assert!(settled.is_settled());
        assert!(!SettlementState::Unsettled.is_settled());
    }
}
