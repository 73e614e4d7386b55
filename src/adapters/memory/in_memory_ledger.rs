//! In-memory subscription ledger.
//!
//! Mirrors the PostgreSQL adapter's constraints (one row per
//! `(transaction_key, status)`, reversals require a paid row) so handlers can
//! be exercised without a database. Insertion order stands in for
//! `created_at` ordering.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::{LedgerEntry, LedgerStatus, NewLedgerEntry};
use crate::domain::foundation::{DomainError, LedgerEntryId, Timestamp};
use crate::ports::{AppendResult, SubscriptionLedger};

#[derive(Default)]
pub struct InMemorySubscriptionLedger {
    rows: RwLock<Vec<LedgerEntry>>,
    append_error: RwLock<Option<DomainError>>,
    read_error: RwLock<Option<DomainError>>,
}

impl InMemorySubscriptionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an existing row, bypassing the append checks.
    pub async fn insert_raw(&self, entry: LedgerEntry) {
        self.rows.write().await.push(entry);
    }

    /// Makes every subsequent `append` fail with `error`.
    pub async fn fail_appends_with(&self, error: DomainError) {
        *self.append_error.write().await = Some(error);
    }

    /// Makes every subsequent lookup fail with `error`.
    pub async fn fail_reads_with(&self, error: DomainError) {
        *self.read_error.write().await = Some(error);
    }

    async fn check_read(&self) -> Result<(), DomainError> {
        match self.read_error.read().await.clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    /// Snapshot of every row in insertion order.
    pub async fn rows(&self) -> Vec<LedgerEntry> {
        self.rows.read().await.clone()
    }
}

#[async_trait]
impl SubscriptionLedger for InMemorySubscriptionLedger {
    async fn append(&self, entry: NewLedgerEntry) -> Result<AppendResult, DomainError> {
        if let Some(error) = self.append_error.read().await.clone() {
            return Err(error);
        }

        let mut rows = self.rows.write().await;

        if let Some(existing) = rows
            .iter()
            .find(|r| r.transaction_key == entry.transaction_key && r.status == entry.status)
        {
            return Ok(AppendResult::AlreadyExists(existing.clone()));
        }

        if entry.status == LedgerStatus::Cancel
            && !rows
                .iter()
                .any(|r| r.transaction_key == entry.transaction_key && r.status == LedgerStatus::Paid)
        {
            return Err(DomainError::ledger_entry_not_found(&entry.transaction_key));
        }

        let inserted = entry.into_entry(LedgerEntryId::new(), Timestamp::now());
        rows.push(inserted.clone());
        Ok(AppendResult::Inserted(inserted))
    }

    async fn find_entry(
        &self,
        transaction_key: &str,
        status: LedgerStatus,
    ) -> Result<Option<LedgerEntry>, DomainError> {
        self.check_read().await?;
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .find(|r| r.transaction_key == transaction_key && r.status == status)
            .cloned())
    }

    async fn find_latest_paid(
        &self,
        transaction_key: &str,
    ) -> Result<Option<LedgerEntry>, DomainError> {
        self.check_read().await?;
        let rows = self.rows.read().await;
        Ok(rows
            .iter()
            .rev()
            .find(|r| r.transaction_key == transaction_key && r.status == LedgerStatus::Paid)
            .cloned())
    }

    async fn current_period(
        &self,
        transaction_key: &str,
        at: Timestamp,
    ) -> Result<Option<LedgerEntry>, DomainError> {
        self.check_read().await?;
        let rows = self.rows.read().await;

        let Some(position) = rows
            .iter()
            .rposition(|r| r.transaction_key == transaction_key && r.covers(at))
        else {
            return Ok(None);
        };

        let reversed = rows[position + 1..]
            .iter()
            .any(|r| r.transaction_key == transaction_key && r.status == LedgerStatus::Cancel);

        Ok((!reversed).then(|| rows[position].clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::BillingPeriod;
    use crate::domain::foundation::ErrorCode;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse_rfc3339(s).unwrap()
    }

    fn paid(key: &str) -> NewLedgerEntry {
        let period = BillingPeriod::starting_at(ts("2024-01-01T00:00:00Z"), 5);
        NewLedgerEntry::paid(key, 9900, &period, format!("sched_{}", key))
    }

    #[tokio::test]
    async fn append_inserts_and_assigns_identity() {
        let ledger = InMemorySubscriptionLedger::new();

        let result = ledger.append(paid("pay_1")).await.unwrap();

        assert!(matches!(result, AppendResult::Inserted(_)));
        assert_eq!(ledger.rows().await.len(), 1);
        assert_eq!(result.entry().transaction_key, "pay_1");
    }

    #[tokio::test]
    async fn duplicate_paid_returns_existing_row() {
        let ledger = InMemorySubscriptionLedger::new();
        let first = ledger.append(paid("pay_1")).await.unwrap();

        let second = ledger.append(paid("pay_1")).await.unwrap();

        assert_eq!(second, AppendResult::AlreadyExists(first.entry().clone()));
        assert_eq!(ledger.rows().await.len(), 1);
    }

    #[tokio::test]
    async fn reversal_without_paid_row_is_rejected() {
        let ledger = InMemorySubscriptionLedger::new();
        let seeded = ledger.append(paid("pay_1")).await.unwrap();
        let mut orphan = NewLedgerEntry::reversal_of(seeded.entry());
        orphan.transaction_key = "pay_2".to_string();

        let err = ledger.append(orphan).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::LedgerEntryNotFound);
        assert_eq!(ledger.rows().await.len(), 1);
    }

    #[tokio::test]
    async fn find_latest_paid_ignores_other_keys_and_reversals() {
        let ledger = InMemorySubscriptionLedger::new();
        let paid_row = ledger.append(paid("pay_1")).await.unwrap();
        ledger.append(paid("pay_2")).await.unwrap();
        ledger
            .append(NewLedgerEntry::reversal_of(paid_row.entry()))
            .await
            .unwrap();

        let found = ledger.find_latest_paid("pay_1").await.unwrap().unwrap();

        assert_eq!(found.id, paid_row.entry().id);
        assert!(ledger.find_latest_paid("pay_3").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_entry_matches_key_and_status() {
        let ledger = InMemorySubscriptionLedger::new();
        let paid_row = ledger.append(paid("pay_1")).await.unwrap();

        assert!(ledger
            .find_entry("pay_1", LedgerStatus::Cancel)
            .await
            .unwrap()
            .is_none());

        let reversal = ledger
            .append(NewLedgerEntry::reversal_of(paid_row.entry()))
            .await
            .unwrap();
        let found = ledger
            .find_entry("pay_1", LedgerStatus::Cancel)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(found.id, reversal.entry().id);
        assert!(ledger
            .find_entry("pay_2", LedgerStatus::Paid)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn injected_append_error_leaves_no_row() {
        let ledger = InMemorySubscriptionLedger::new();
        ledger
            .fail_appends_with(DomainError::database("connection reset"))
            .await;

        let err = ledger.append(paid("pay_1")).await.unwrap_err();

        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(ledger.rows().await.is_empty());
    }

    #[tokio::test]
    async fn current_period_respects_window_and_reversal() {
        let ledger = InMemorySubscriptionLedger::new();
        let paid_row = ledger.append(paid("pay_1")).await.unwrap();

        let inside = ts("2024-01-15T00:00:00Z");
        assert!(ledger.current_period("pay_1", inside).await.unwrap().is_some());
        assert!(ledger
            .current_period("pay_1", ts("2024-02-01T00:00:01Z"))
            .await
            .unwrap()
            .is_none());

        ledger
            .append(NewLedgerEntry::reversal_of(paid_row.entry()))
            .await
            .unwrap();
        assert!(ledger.current_period("pay_1", inside).await.unwrap().is_none());
    }
}
