//! Ledger rows: realized billing periods and their reversals.
//!
//! The ledger is append-only. A `Paid` row records a period bought by a
//! gateway charge; a `Cancel` row reverses it with the negated amount and the
//! same window fields. Rows are never updated or deleted.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{LedgerEntryId, Timestamp};

use super::period::BillingPeriod;

/// Status column of a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LedgerStatus {
    Paid,
    Cancel,
}

impl LedgerStatus {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerStatus::Paid => "Paid",
            LedgerStatus::Cancel => "Cancel",
        }
    }

    /// Parses the database representation.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Paid" => Some(LedgerStatus::Paid),
            "Cancel" => Some(LedgerStatus::Cancel),
            _ => None,
        }
    }
}

impl std::fmt::Display for LedgerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted ledger row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    /// Gateway payment id of the originating charge. Shared by a `Paid` row and its reversal.
    pub transaction_key: String,
    /// Minor currency units; negative for reversals.
    pub amount: i64,
    pub status: LedgerStatus,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub end_grace_at: Timestamp,
    pub next_schedule_at: Option<Timestamp>,
    /// Payment id minted for the next cycle's scheduled charge.
    pub next_schedule_id: Option<String>,
    pub created_at: Timestamp,
}

impl LedgerEntry {
    /// True when this row is a paid period covering `at`, grace window included.
    pub fn covers(&self, at: Timestamp) -> bool {
        self.status == LedgerStatus::Paid && self.start_at <= at && at <= self.end_grace_at
    }

    /// The schedule correlation fields, when both were recorded.
    pub fn next_schedule(&self) -> Option<(Timestamp, &str)> {
        match (self.next_schedule_at, self.next_schedule_id.as_deref()) {
            (Some(at), Some(id)) => Some((at, id)),
            _ => None,
        }
    }
}

/// A row about to be appended; the ledger assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub transaction_key: String,
    pub amount: i64,
    pub status: LedgerStatus,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub end_grace_at: Timestamp,
    pub next_schedule_at: Option<Timestamp>,
    pub next_schedule_id: Option<String>,
}

impl NewLedgerEntry {
    /// A paid period for the charge identified by `transaction_key`.
    pub fn paid(
        transaction_key: impl Into<String>,
        amount: i64,
        period: &BillingPeriod,
        next_schedule_id: impl Into<String>,
    ) -> Self {
        Self {
            transaction_key: transaction_key.into(),
            amount,
            status: LedgerStatus::Paid,
            start_at: period.start_at,
            end_at: period.end_at,
            end_grace_at: period.end_grace_at,
            next_schedule_at: Some(period.next_schedule_at),
            next_schedule_id: Some(next_schedule_id.into()),
        }
    }

    /// The reversal of a paid row: negated amount, identical window fields.
    pub fn reversal_of(paid: &LedgerEntry) -> Self {
        Self {
            transaction_key: paid.transaction_key.clone(),
            amount: -paid.amount,
            status: LedgerStatus::Cancel,
            start_at: paid.start_at,
            end_at: paid.end_at,
            end_grace_at: paid.end_grace_at,
            next_schedule_at: paid.next_schedule_at,
            next_schedule_id: paid.next_schedule_id.clone(),
        }
    }

    /// Materializes the row with store-assigned identity.
    pub fn into_entry(self, id: LedgerEntryId, created_at: Timestamp) -> LedgerEntry {
        LedgerEntry {
            id,
            transaction_key: self.transaction_key,
            amount: self.amount,
            status: self.status,
            start_at: self.start_at,
            end_at: self.end_at,
            end_grace_at: self.end_grace_at,
            next_schedule_at: self.next_schedule_at,
            next_schedule_id: self.next_schedule_id,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse_rfc3339(s).unwrap()
    }

    fn paid_entry() -> LedgerEntry {
        let period = BillingPeriod::starting_at(ts("2024-01-01T00:00:00Z"), 15);
        NewLedgerEntry::paid("pay_1", 9900, &period, "sched_1")
            .into_entry(LedgerEntryId::new(), ts("2024-01-01T00:00:01Z"))
    }

    #[test]
    fn status_round_trips_through_database_form() {
        assert_eq!(LedgerStatus::parse("Paid"), Some(LedgerStatus::Paid));
        assert_eq!(LedgerStatus::parse("Cancel"), Some(LedgerStatus::Cancel));
        assert_eq!(LedgerStatus::parse("Cancelled"), None);
        assert_eq!(LedgerStatus::Cancel.as_str(), "Cancel");
    }

    #[test]
    fn status_serializes_as_pascal_case() {
        assert_eq!(serde_json::to_string(&LedgerStatus::Paid).unwrap(), "\"Paid\"");
    }

    #[test]
    fn reversal_negates_amount_and_copies_window() {
        let paid = paid_entry();
        let reversal = NewLedgerEntry::reversal_of(&paid);

        assert_eq!(reversal.transaction_key, "pay_1");
        assert_eq!(reversal.amount, -9900);
        assert_eq!(reversal.status, LedgerStatus::Cancel);
        assert_eq!(reversal.start_at, paid.start_at);
        assert_eq!(reversal.end_at, paid.end_at);
        assert_eq!(reversal.end_grace_at, paid.end_grace_at);
        assert_eq!(reversal.next_schedule_at, paid.next_schedule_at);
        assert_eq!(reversal.next_schedule_id, paid.next_schedule_id);
    }

    #[test]
    fn covers_includes_grace_window_bounds() {
        let paid = paid_entry();

        assert!(paid.covers(ts("2024-01-01T00:00:00Z")));
        assert!(paid.covers(ts("2024-02-01T00:00:00Z")));
        assert!(!paid.covers(ts("2024-02-01T00:00:01Z")));
        assert!(!paid.covers(ts("2023-12-31T23:59:59Z")));
    }

    #[test]
    fn cancel_rows_never_cover() {
        let reversal = NewLedgerEntry::reversal_of(&paid_entry())
            .into_entry(LedgerEntryId::new(), ts("2024-01-02T00:00:00Z"));
        assert!(!reversal.covers(ts("2024-01-05T00:00:00Z")));
    }

    #[test]
    fn next_schedule_requires_both_fields() {
        let mut paid = paid_entry();
        assert_eq!(paid.next_schedule().map(|(_, id)| id), Some("sched_1"));

        paid.next_schedule_id = None;
        assert!(paid.next_schedule().is_none());
    }
}
