//! HandleCancelledEventHandler - Reverses a paid period and cancels its pending charge.

use std::sync::Arc;

use crate::domain::billing::{
    BillingError, HandledEvent, NewLedgerEntry, ReconciliationFailure, ScheduleSearchWindow,
};
use crate::domain::foundation::Timestamp;
use crate::ports::{AppendResult, PaymentGateway, SubscriptionLedger};

/// Command to record a `Cancelled` lifecycle event.
#[derive(Debug, Clone)]
pub struct HandleCancelledEventCommand {
    /// Gateway payment id carried by the webhook.
    pub payment_id: String,
}

/// Handler for `Cancelled` events.
///
/// Resolves the canonical transaction key through the gateway, appends a
/// reversal of the latest paid row, then looks up and deletes the pending
/// charge that row scheduled. A redelivery repeats the lookup so a charge
/// left behind by an interrupted delivery is still cancelled.
pub struct HandleCancelledEventHandler {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn SubscriptionLedger>,
}

impl HandleCancelledEventHandler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, ledger: Arc<dyn SubscriptionLedger>) -> Self {
        Self { gateway, ledger }
    }

    pub async fn handle(
        &self,
        cmd: HandleCancelledEventCommand,
    ) -> Result<HandledEvent, BillingError> {
        // 1. Resolve the payment (fatal)
        let payment = self.gateway.get_payment(&cmd.payment_id).await.map_err(|e| {
            tracing::error!(payment_id = %cmd.payment_id, error = %e, "Payment lookup failed");
            BillingError::from(e)
        })?;

        // 2. Find the period being reversed
        let transaction_key = payment.canonical_key(&cmd.payment_id);
        let paid = self
            .ledger
            .find_latest_paid(&transaction_key)
            .await
            .map_err(|e| {
                tracing::error!(%transaction_key, error = %e, "Ledger lookup failed");
                BillingError::from(e)
            })?
            .ok_or_else(|| {
                tracing::error!(%transaction_key, "Cancellation for unrecorded payment");
                BillingError::not_found(&transaction_key)
            })?;

        // 3. Append the reversal (fatal)
        let appended = self.ledger.append(NewLedgerEntry::reversal_of(&paid)).await;
        let (reversal, replayed) = match appended {
            Ok(AppendResult::Inserted(entry)) => {
                tracing::info!(%transaction_key, amount = entry.amount, "Paid period reversed");
                (entry, false)
            }
            Ok(AppendResult::AlreadyExists(existing)) => {
                tracing::info!(
                    %transaction_key,
                    "Cancellation already recorded, re-checking pending charge"
                );
                (existing, true)
            }
            Err(e) => {
                tracing::error!(%transaction_key, error = %e, "Ledger append failed");
                return Err(e.into());
            }
        };
        let settled = |entry| {
            if replayed {
                HandledEvent::already_recorded(entry)
            } else {
                HandledEvent::committed(entry)
            }
        };

        // 4. Cancel the pending charge (non-fatal)
        let (Some(billing_key), Some((next_schedule_at, schedule_payment_id))) =
            (payment.recurring_billing_key(), paid.next_schedule())
        else {
            return Ok(settled(reversal));
        };

        let cancelled = self
            .cancel_pending_schedule(billing_key, next_schedule_at, schedule_payment_id)
            .await;
        match cancelled {
            Ok(()) => Ok(settled(reversal)),
            // An earlier delivery already removed it.
            Err(ReconciliationFailure::ScheduleNotFound { .. }) if replayed => {
                Ok(settled(reversal))
            }
            Err(failure) => {
                tracing::warn!(
                    %transaction_key,
                    needs_follow_up = true,
                    error = %failure,
                    "Pending charge was not cancelled"
                );
                Ok(HandledEvent::reconciliation_failed(reversal, failure))
            }
        }
    }

    async fn cancel_pending_schedule(
        &self,
        billing_key: &str,
        next_schedule_at: Timestamp,
        schedule_payment_id: &str,
    ) -> Result<(), ReconciliationFailure> {
        let window = ScheduleSearchWindow::around(next_schedule_at);

        let schedules = self
            .gateway
            .query_payment_schedules(billing_key, window.from, window.until)
            .await
            .map_err(|e| ReconciliationFailure::ScheduleLookup {
                reason: e.to_string(),
            })?;

        let schedule = schedules
            .into_iter()
            .find(|s| s.payment_id == schedule_payment_id)
            .ok_or_else(|| ReconciliationFailure::ScheduleNotFound {
                schedule_payment_id: schedule_payment_id.to_string(),
            })?;

        self.gateway
            .cancel_schedules(std::slice::from_ref(&schedule.id))
            .await
            .map_err(|e| ReconciliationFailure::ScheduleCancellation {
                schedule_id: schedule.id.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(schedule_id = %schedule.id, "Pending charge cancelled");
        Ok(())
    }
}
