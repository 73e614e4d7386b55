//! Subscription ledger port.
//!
//! Defines the contract for the append-only `payment` ledger.
//!
//! # Design
//!
//! - **Append-only**: rows are inserted once and never updated or deleted
//! - **Conditional insert**: at most one row per `(transaction_key, status)`,
//!   so redelivered webhooks cannot open a second period or a second reversal
//! - **Guarded reversal**: a `Cancel` row is only inserted when a `Paid` row
//!   exists for the same key, checked in the same atomic step as the insert
//! - **One ordering contract**: "latest paid" and "current period" live here,
//!   not at call sites

use crate::domain::billing::{LedgerEntry, LedgerStatus, NewLedgerEntry};
use crate::domain::foundation::{DomainError, Timestamp};
use async_trait::async_trait;

/// Result of attempting to append a ledger row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppendResult {
    /// Row was inserted.
    Inserted(LedgerEntry),
    /// A row with the same `(transaction_key, status)` already exists.
    AlreadyExists(LedgerEntry),
}

impl AppendResult {
    pub fn entry(&self) -> &LedgerEntry {
        match self {
            AppendResult::Inserted(entry) | AppendResult::AlreadyExists(entry) => entry,
        }
    }
}

/// Repository port for the subscription ledger.
#[async_trait]
pub trait SubscriptionLedger: Send + Sync {
    /// Append a row atomically.
    ///
    /// # Errors
    ///
    /// - `LedgerEntryNotFound` when appending a `Cancel` row without a `Paid`
    ///   row for the same transaction key
    /// - `DatabaseError` on persistence failure
    async fn append(&self, entry: NewLedgerEntry) -> Result<AppendResult, DomainError>;

    /// The row recorded for `(transaction_key, status)`, if any.
    async fn find_entry(
        &self,
        transaction_key: &str,
        status: LedgerStatus,
    ) -> Result<Option<LedgerEntry>, DomainError>;

    /// Most recently created `Paid` row for the key, by `created_at`.
    async fn find_latest_paid(
        &self,
        transaction_key: &str,
    ) -> Result<Option<LedgerEntry>, DomainError>;

    /// The paid period in force for the key at `at`.
    ///
    /// Latest `Paid` row with `start_at <= at <= end_grace_at`, unless a
    /// `Cancel` row for the key was created after it.
    async fn current_period(
        &self,
        transaction_key: &str,
        at: Timestamp,
    ) -> Result<Option<LedgerEntry>, DomainError>;
}
