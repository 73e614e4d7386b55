//! Billing HTTP adapter - gateway webhook and subscription status endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    ErrorResponse, HealthResponse, LedgerEntryResponse, SubscriptionStatusResponse,
    WebhookResponse,
};
pub use handlers::{BillingApiError, BillingAppState};
pub use routes::{billing_router, subscription_routes, webhook_routes};
