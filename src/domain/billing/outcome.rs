//! Result of a handled lifecycle event.

use super::errors::ReconciliationFailure;
use super::ledger_entry::LedgerEntry;

/// What happened after the ledger write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Ledger row inserted and the gateway schedule is in sync
    /// (or there was nothing to sync).
    Committed,
    /// Ledger row inserted or found; the gateway side needs operator follow-up.
    ReconciliationFailed(ReconciliationFailure),
    /// The event was a redelivery; the existing row is returned untouched
    /// and the gateway schedule is in sync again.
    AlreadyRecorded,
}

/// Ledger row produced (or found) for an event, plus how reconciliation went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandledEvent {
    pub entry: LedgerEntry,
    pub outcome: CommitOutcome,
}

impl HandledEvent {
    pub fn committed(entry: LedgerEntry) -> Self {
        Self {
            entry,
            outcome: CommitOutcome::Committed,
        }
    }

    pub fn reconciliation_failed(entry: LedgerEntry, failure: ReconciliationFailure) -> Self {
        Self {
            entry,
            outcome: CommitOutcome::ReconciliationFailed(failure),
        }
    }

    pub fn already_recorded(entry: LedgerEntry) -> Self {
        Self {
            entry,
            outcome: CommitOutcome::AlreadyRecorded,
        }
    }

    /// True when the gateway schedule may be out of sync with the ledger.
    pub fn needs_follow_up(&self) -> bool {
        matches!(self.outcome, CommitOutcome::ReconciliationFailed(_))
    }
}
