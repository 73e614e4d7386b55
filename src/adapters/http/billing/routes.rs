//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{get_subscription_status, handle_payment_webhook, health, BillingAppState};

/// Gateway webhook routes.
///
/// # Routes
/// - `POST /payments` - Payment lifecycle events
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new().route("/payments", post(handle_payment_webhook))
}

/// Subscription query routes.
///
/// # Routes
/// - `GET /:transaction_key` - Current period for a transaction
pub fn subscription_routes() -> Router<BillingAppState> {
    Router::new().route("/:transaction_key", get(get_subscription_status))
}

/// Create the complete billing router.
///
/// # Example
///
/// ```ignore
/// let app = billing_router().with_state(BillingAppState { /* ... */ });
/// ```
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/webhooks", webhook_routes())
        .nest("/api/subscriptions", subscription_routes())
}
