//! Billing handlers - webhook reconciliation and subscription status.
//!
//! Commands:
//! - `DispatchPaymentWebhookHandler` - validates a delivery and routes it
//! - `HandlePaidEventHandler` - records a paid period, schedules the next charge
//! - `HandleCancelledEventHandler` - reverses a paid period, cancels its pending charge
//!
//! Queries:
//! - `GetSubscriptionStatusHandler` - period covering the current time

mod dispatch_webhook;
mod get_subscription_status;
mod handle_cancelled_event;
mod handle_paid_event;

pub use dispatch_webhook::{
    DispatchPaymentWebhookCommand, DispatchPaymentWebhookHandler, DispatchPaymentWebhookResult,
};
pub use get_subscription_status::{
    GetSubscriptionStatusHandler, GetSubscriptionStatusQuery, SubscriptionStatus,
};
pub use handle_cancelled_event::{HandleCancelledEventCommand, HandleCancelledEventHandler};
pub use handle_paid_event::{HandlePaidEventCommand, HandlePaidEventHandler};
