//! GetSubscriptionStatusHandler - Query handler for a subscription's current period.

use std::sync::Arc;

use crate::domain::billing::{BillingError, LedgerEntry};
use crate::domain::foundation::ValidationError;
use crate::ports::{Clock, SubscriptionLedger};

/// Query for the period covering "now".
#[derive(Debug, Clone)]
pub struct GetSubscriptionStatusQuery {
    pub transaction_key: String,
}

/// Current subscription state for a transaction key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionStatus {
    pub transaction_key: String,
    /// Covering paid row, if the subscription is active.
    pub period: Option<LedgerEntry>,
}

impl SubscriptionStatus {
    pub fn is_active(&self) -> bool {
        self.period.is_some()
    }
}

/// Reads through `SubscriptionLedger::current_period`, the same contract the
/// webhook flows rely on.
pub struct GetSubscriptionStatusHandler {
    ledger: Arc<dyn SubscriptionLedger>,
    clock: Arc<dyn Clock>,
}

impl GetSubscriptionStatusHandler {
    pub fn new(ledger: Arc<dyn SubscriptionLedger>, clock: Arc<dyn Clock>) -> Self {
        Self { ledger, clock }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionStatusQuery,
    ) -> Result<SubscriptionStatus, BillingError> {
        let transaction_key = query.transaction_key.trim();
        if transaction_key.is_empty() {
            return Err(ValidationError::empty_field("transaction_key").into());
        }

        let period = self
            .ledger
            .current_period(transaction_key, self.clock.now())
            .await
            .map_err(|e| {
                tracing::error!(%transaction_key, error = %e, "Current period lookup failed");
                BillingError::from(e)
            })?;

        Ok(SubscriptionStatus {
            transaction_key: transaction_key.to_string(),
            period,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionLedger;
    use crate::adapters::system::FixedClock;
    use crate::domain::billing::{BillingPeriod, NewLedgerEntry};
    use crate::domain::foundation::Timestamp;

    fn ts(s: &str) -> Timestamp {
        Timestamp::parse_rfc3339(s).unwrap()
    }

    async fn ledger_with_paid_row() -> (Arc<InMemorySubscriptionLedger>, LedgerEntry) {
        let ledger = Arc::new(InMemorySubscriptionLedger::new());
        let period = BillingPeriod::starting_at(ts("2024-01-01T00:00:00Z"), 0);
        let entry = ledger
            .append(NewLedgerEntry::paid("pay_1", 9900, &period, "sched_1"))
            .await
            .unwrap()
            .entry()
            .clone();
        (ledger, entry)
    }

    fn query(key: &str) -> GetSubscriptionStatusQuery {
        GetSubscriptionStatusQuery {
            transaction_key: key.to_string(),
        }
    }

    #[tokio::test]
    async fn active_within_grace_window() {
        let (ledger, entry) = ledger_with_paid_row().await;
        let handler =
            GetSubscriptionStatusHandler::new(ledger, Arc::new(FixedClock(ts("2024-01-31T12:00:00Z"))));

        let status = handler.handle(query("pay_1")).await.unwrap();

        assert!(status.is_active());
        assert_eq!(status.period, Some(entry));
    }

    #[tokio::test]
    async fn inactive_after_grace_window() {
        let (ledger, _) = ledger_with_paid_row().await;
        let handler =
            GetSubscriptionStatusHandler::new(ledger, Arc::new(FixedClock(ts("2024-02-01T00:00:01Z"))));

        let status = handler.handle(query("pay_1")).await.unwrap();

        assert!(!status.is_active());
    }

    #[tokio::test]
    async fn inactive_after_reversal() {
        let (ledger, entry) = ledger_with_paid_row().await;
        ledger
            .append(NewLedgerEntry::reversal_of(&entry))
            .await
            .unwrap();
        let handler =
            GetSubscriptionStatusHandler::new(ledger, Arc::new(FixedClock(ts("2024-01-15T00:00:00Z"))));

        let status = handler.handle(query("pay_1")).await.unwrap();

        assert!(!status.is_active());
    }

    #[tokio::test]
    async fn blank_key_is_rejected() {
        let (ledger, _) = ledger_with_paid_row().await;
        let handler =
            GetSubscriptionStatusHandler::new(ledger, Arc::new(FixedClock(ts("2024-01-15T00:00:00Z"))));

        let err = handler.handle(query("  ")).await.unwrap_err();

        assert!(matches!(err, BillingError::Validation(_)));
    }
}
