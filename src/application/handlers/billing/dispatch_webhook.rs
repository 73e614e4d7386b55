//! DispatchPaymentWebhookHandler - Routes a webhook delivery to its lifecycle handler.

use std::future::Future;
use std::sync::Arc;

use tracing::Instrument;

use crate::domain::billing::{BillingError, HandledEvent, PaymentWebhookEvent, WebhookStatus};

use super::handle_cancelled_event::{HandleCancelledEventCommand, HandleCancelledEventHandler};
use super::handle_paid_event::{HandlePaidEventCommand, HandlePaidEventHandler};

/// Command carrying a raw webhook body.
#[derive(Debug, Clone)]
pub struct DispatchPaymentWebhookCommand {
    pub payload: Vec<u8>,
}

/// Result of dispatching a webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchPaymentWebhookResult {
    /// `Paid` event handled.
    Paid(HandledEvent),
    /// `Cancelled` event handled.
    Cancelled(HandledEvent),
    /// Any other status; acknowledged so the gateway does not redeliver.
    Ignored { status: String },
}

impl DispatchPaymentWebhookResult {
    /// Ledger row written or found, if the event had one.
    pub fn handled(&self) -> Option<&HandledEvent> {
        match self {
            DispatchPaymentWebhookResult::Paid(handled)
            | DispatchPaymentWebhookResult::Cancelled(handled) => Some(handled),
            DispatchPaymentWebhookResult::Ignored { .. } => None,
        }
    }
}

/// Entry point for gateway webhook deliveries.
///
/// Validates the body, then hands off to the paid or cancelled flow.
/// Deliveries are handled independently; there is no deduplication here,
/// redelivery safety comes from the ledger's conditional insert.
///
/// Each flow runs on its own task. Dropping the request future (client
/// disconnect, server timeout) cannot stop a flow between its ledger write
/// and its gateway calls.
pub struct DispatchPaymentWebhookHandler {
    paid: Arc<HandlePaidEventHandler>,
    cancelled: Arc<HandleCancelledEventHandler>,
}

impl DispatchPaymentWebhookHandler {
    pub fn new(
        paid: Arc<HandlePaidEventHandler>,
        cancelled: Arc<HandleCancelledEventHandler>,
    ) -> Self {
        Self { paid, cancelled }
    }

    pub async fn handle(
        &self,
        cmd: DispatchPaymentWebhookCommand,
    ) -> Result<DispatchPaymentWebhookResult, BillingError> {
        let event = PaymentWebhookEvent::parse(&cmd.payload).map_err(|e| {
            tracing::warn!(error = %e, "Rejected malformed webhook");
            BillingError::from(e)
        })?;

        match event.status {
            WebhookStatus::Paid => {
                let span = tracing::info_span!("paid_event", payment_id = %event.payment_id);
                let handler = Arc::clone(&self.paid);
                let cmd = HandlePaidEventCommand {
                    payment_id: event.payment_id,
                };
                let handled = run_detached(span, async move { handler.handle(cmd).await }).await?;
                Ok(DispatchPaymentWebhookResult::Paid(handled))
            }
            WebhookStatus::Cancelled => {
                let span = tracing::info_span!("cancelled_event", payment_id = %event.payment_id);
                let handler = Arc::clone(&self.cancelled);
                let cmd = HandleCancelledEventCommand {
                    payment_id: event.payment_id,
                };
                let handled = run_detached(span, async move { handler.handle(cmd).await }).await?;
                Ok(DispatchPaymentWebhookResult::Cancelled(handled))
            }
            WebhookStatus::Other(status) => {
                tracing::info!(
                    payment_id = %event.payment_id,
                    %status,
                    "Ignoring webhook with unhandled status"
                );
                Ok(DispatchPaymentWebhookResult::Ignored { status })
            }
        }
    }
}

async fn run_detached<F>(span: tracing::Span, flow: F) -> Result<HandledEvent, BillingError>
where
    F: Future<Output = Result<HandledEvent, BillingError>> + Send + 'static,
{
    tokio::spawn(flow.instrument(span)).await.map_err(|e| {
        tracing::error!(error = %e, "Webhook handler task failed");
        BillingError::internal(e.to_string())
    })?
}
