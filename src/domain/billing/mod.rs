//! Billing domain - subscription ledger and charge schedule reconciliation.
//!
//! The ledger is the system of record for paid periods; the payment gateway
//! owns future charge schedules. The two are correlated through
//! `next_schedule_id`, the payment id minted for the next cycle's charge.

mod errors;
mod ledger_entry;
mod outcome;
mod period;
mod webhook_event;

pub use errors::{BillingError, ReconciliationFailure};
pub use ledger_entry::{LedgerEntry, LedgerStatus, NewLedgerEntry};
pub use outcome::{CommitOutcome, HandledEvent};
pub use period::{
    BillingPeriod, ScheduleSearchWindow, CHARGE_HOUR, GRACE_DAYS, PERIOD_DAYS,
    SCHEDULE_SEARCH_MARGIN_DAYS,
};
pub use webhook_event::{PaymentWebhookEvent, WebhookStatus};

/// Currency of the single subscription plan.
pub const PLAN_CURRENCY: &str = "KRW";
