//! HTTP handlers for billing endpoints.
//!
//! These handlers connect Axum routes to the billing command/query handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::billing::{
    DispatchPaymentWebhookCommand, DispatchPaymentWebhookHandler, DispatchPaymentWebhookResult,
    GetSubscriptionStatusHandler, GetSubscriptionStatusQuery, HandleCancelledEventHandler,
    HandlePaidEventHandler,
};
use crate::domain::billing::{BillingError, CommitOutcome, HandledEvent};
use crate::ports::{Clock, PaymentGateway, RandomSource, SubscriptionLedger};

use super::dto::{ErrorResponse, HealthResponse, SubscriptionStatusResponse, WebhookResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state.
///
/// Built once at startup; cloned per request.
#[derive(Clone)]
pub struct BillingAppState {
    pub gateway: Arc<dyn PaymentGateway>,
    pub ledger: Arc<dyn SubscriptionLedger>,
    pub clock: Arc<dyn Clock>,
    pub random: Arc<dyn RandomSource>,
}

impl BillingAppState {
    pub fn webhook_handler(&self) -> DispatchPaymentWebhookHandler {
        let paid = HandlePaidEventHandler::new(
            self.gateway.clone(),
            self.ledger.clone(),
            self.clock.clone(),
            self.random.clone(),
        );
        let cancelled = HandleCancelledEventHandler::new(self.gateway.clone(), self.ledger.clone());
        DispatchPaymentWebhookHandler::new(Arc::new(paid), Arc::new(cancelled))
    }

    pub fn subscription_status_handler(&self) -> GetSubscriptionStatusHandler {
        GetSubscriptionStatusHandler::new(self.ledger.clone(), self.clock.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Endpoint
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/webhooks/payments
pub async fn handle_payment_webhook(
    State(state): State<BillingAppState>,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.webhook_handler();
    let cmd = DispatchPaymentWebhookCommand {
        payload: body.to_vec(),
    };

    let response = match handler.handle(cmd).await? {
        DispatchPaymentWebhookResult::Paid(handled) => {
            WebhookResponse::recorded(message_for("Payment recorded", &handled), &handled.entry)
        }
        DispatchPaymentWebhookResult::Cancelled(handled) => {
            WebhookResponse::recorded(message_for("Payment cancelled", &handled), &handled.entry)
        }
        DispatchPaymentWebhookResult::Ignored { .. } => WebhookResponse::acknowledged(),
    };

    Ok((StatusCode::OK, Json(response)))
}

fn message_for(applied: &str, handled: &HandledEvent) -> String {
    match handled.outcome {
        CommitOutcome::AlreadyRecorded => format!("{} (already processed)", applied),
        CommitOutcome::Committed | CommitOutcome::ReconciliationFailed(_) => applied.to_string(),
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/subscriptions/:transaction_key
pub async fn get_subscription_status(
    State(state): State<BillingAppState>,
    Path(transaction_key): Path<String>,
) -> Result<impl IntoResponse, BillingApiError> {
    let handler = state.subscription_status_handler();
    let status = handler
        .handle(GetSubscriptionStatusQuery { transaction_key })
        .await?;

    Ok((StatusCode::OK, Json(SubscriptionStatusResponse::from(status))))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts billing errors to HTTP responses.
#[derive(Debug)]
pub struct BillingApiError(BillingError);

impl From<BillingError> for BillingApiError {
    fn from(err: BillingError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        (status, Json(ErrorResponse::new(self.0.to_string()))).into_response()
    }
}
