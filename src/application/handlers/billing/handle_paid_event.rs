//! HandlePaidEventHandler - Records a paid period and schedules the next charge.

use std::sync::Arc;

use crate::domain::billing::{
    BillingError, BillingPeriod, HandledEvent, LedgerEntry, LedgerStatus, NewLedgerEntry,
    ReconciliationFailure, ScheduleSearchWindow, PLAN_CURRENCY,
};
use crate::domain::foundation::Timestamp;
use crate::ports::{
    AppendResult, Clock, CreateScheduleRequest, PaymentDetail, PaymentGateway, RandomSource,
    SubscriptionLedger,
};

/// Command to record a `Paid` lifecycle event.
#[derive(Debug, Clone)]
pub struct HandlePaidEventCommand {
    /// Gateway payment id carried by the webhook.
    pub payment_id: String,
}

/// Handler for `Paid` events.
///
/// Fetches the payment, appends a `Paid` ledger row for a fresh 30-day
/// period, then registers the next cycle's charge with the gateway when the
/// payment carries a billing key. Schedule failures do not undo the row.
///
/// A redelivered event finds the existing row and re-checks its charge: if
/// the gateway has no schedule for the stored id, it is created again.
pub struct HandlePaidEventHandler {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn SubscriptionLedger>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl HandlePaidEventHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        ledger: Arc<dyn SubscriptionLedger>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Self {
        Self {
            gateway,
            ledger,
            clock,
            random,
        }
    }

    pub async fn handle(&self, cmd: HandlePaidEventCommand) -> Result<HandledEvent, BillingError> {
        // 1. Resolve the payment (fatal)
        let payment = self.gateway.get_payment(&cmd.payment_id).await.map_err(|e| {
            tracing::error!(payment_id = %cmd.payment_id, error = %e, "Payment lookup failed");
            BillingError::from(e)
        })?;

        // 2. Compute the period and mint the next charge's payment id
        let period = BillingPeriod::starting_at(self.clock.now(), self.random.charge_minute());
        let schedule_payment_id = self.random.schedule_payment_id();

        // 3. Append the paid row (fatal)
        let new_entry = NewLedgerEntry::paid(
            cmd.payment_id.clone(),
            payment.amount_total,
            &period,
            schedule_payment_id,
        );
        let entry = match self.ledger.append(new_entry).await {
            Ok(AppendResult::Inserted(entry)) => entry,
            Ok(AppendResult::AlreadyExists(existing)) => {
                tracing::info!(
                    transaction_key = %existing.transaction_key,
                    "Paid event already recorded, checking charge schedule"
                );
                return self.restore_schedule(&payment, existing).await;
            }
            Err(e) => {
                tracing::error!(payment_id = %cmd.payment_id, error = %e, "Ledger append failed");
                return Err(e.into());
            }
        };

        tracing::info!(
            transaction_key = %entry.transaction_key,
            amount = entry.amount,
            end_grace_at = %entry.end_grace_at,
            "Paid period recorded"
        );

        // 4. Schedule the next charge (non-fatal)
        let (Some(billing_key), Some((next_schedule_at, schedule_payment_id))) =
            (payment.recurring_billing_key(), entry.next_schedule())
        else {
            tracing::debug!(
                transaction_key = %entry.transaction_key,
                "One-time payment, no charge scheduled"
            );
            return Ok(HandledEvent::committed(entry));
        };

        let scheduled = self
            .schedule_next_charge(&payment, &entry, billing_key, next_schedule_at, schedule_payment_id)
            .await;
        match scheduled {
            Ok(()) => Ok(HandledEvent::committed(entry)),
            Err(failure) => Ok(follow_up(entry, failure)),
        }
    }

    /// Re-creates the charge a previous delivery committed but never
    /// registered. Nothing is created once the row is reversed or its charge
    /// time has passed.
    async fn restore_schedule(
        &self,
        payment: &PaymentDetail,
        existing: LedgerEntry,
    ) -> Result<HandledEvent, BillingError> {
        let (Some(billing_key), Some((next_schedule_at, schedule_payment_id))) =
            (payment.recurring_billing_key(), existing.next_schedule())
        else {
            return Ok(HandledEvent::already_recorded(existing));
        };
        if !self.clock.now().is_before(&next_schedule_at) {
            return Ok(HandledEvent::already_recorded(existing));
        }

        let reversal = self
            .ledger
            .find_entry(&existing.transaction_key, LedgerStatus::Cancel)
            .await
            .map_err(|e| {
                tracing::error!(
                    transaction_key = %existing.transaction_key,
                    error = %e,
                    "Ledger lookup failed"
                );
                BillingError::from(e)
            })?;
        if reversal.is_some() {
            return Ok(HandledEvent::already_recorded(existing));
        }

        let window = ScheduleSearchWindow::around(next_schedule_at);
        let schedules = match self
            .gateway
            .query_payment_schedules(billing_key, window.from, window.until)
            .await
        {
            Ok(schedules) => schedules,
            Err(e) => {
                let failure = ReconciliationFailure::ScheduleLookup {
                    reason: e.to_string(),
                };
                return Ok(follow_up(existing, failure));
            }
        };
        if schedules.iter().any(|s| s.payment_id == schedule_payment_id) {
            return Ok(HandledEvent::already_recorded(existing));
        }

        let scheduled = self
            .schedule_next_charge(payment, &existing, billing_key, next_schedule_at, schedule_payment_id)
            .await;
        match scheduled {
            Ok(()) => {
                tracing::info!(
                    transaction_key = %existing.transaction_key,
                    %schedule_payment_id,
                    "Restored missing charge schedule"
                );
                Ok(HandledEvent::already_recorded(existing))
            }
            Err(failure) => Ok(follow_up(existing, failure)),
        }
    }

    async fn schedule_next_charge(
        &self,
        payment: &PaymentDetail,
        entry: &LedgerEntry,
        billing_key: &str,
        time_to_pay: Timestamp,
        schedule_payment_id: &str,
    ) -> Result<(), ReconciliationFailure> {
        let Some(customer_id) = payment.customer_id.as_deref() else {
            return Err(ReconciliationFailure::MissingCustomer {
                transaction_key: entry.transaction_key.clone(),
            });
        };

        let request = CreateScheduleRequest {
            schedule_payment_id: schedule_payment_id.to_string(),
            billing_key: billing_key.to_string(),
            order_name: payment.order_name.clone(),
            customer_id: customer_id.to_string(),
            amount_total: payment.amount_total,
            currency: PLAN_CURRENCY.to_string(),
            time_to_pay,
        };

        self.gateway
            .create_schedule(request)
            .await
            .map_err(|e| ReconciliationFailure::ScheduleCreation {
                schedule_payment_id: schedule_payment_id.to_string(),
                reason: e.to_string(),
            })
    }
}

fn follow_up(entry: LedgerEntry, failure: ReconciliationFailure) -> HandledEvent {
    tracing::warn!(
        transaction_key = %entry.transaction_key,
        needs_follow_up = true,
        error = %failure,
        "Next charge was not scheduled"
    );
    HandledEvent::reconciliation_failed(entry, failure)
}
