//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.

pub mod handlers;

pub use handlers::billing::{
    DispatchPaymentWebhookCommand, DispatchPaymentWebhookHandler, DispatchPaymentWebhookResult,
    GetSubscriptionStatusHandler, GetSubscriptionStatusQuery, HandleCancelledEventCommand,
    HandleCancelledEventHandler, HandlePaidEventCommand, HandlePaidEventHandler,
    SubscriptionStatus,
};
