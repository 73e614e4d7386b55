//! Inbound gateway webhook event.

use serde::Deserialize;

use crate::domain::foundation::ValidationError;

/// Lifecycle tag carried by a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookStatus {
    Paid,
    Cancelled,
    /// Any other tag; acknowledged without side effects.
    Other(String),
}

impl WebhookStatus {
    fn from_tag(tag: String) -> Self {
        match tag.as_str() {
            "Paid" => WebhookStatus::Paid,
            "Cancelled" => WebhookStatus::Cancelled,
            _ => WebhookStatus::Other(tag),
        }
    }
}

/// A validated webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentWebhookEvent {
    pub payment_id: String,
    pub status: WebhookStatus,
}

#[derive(Deserialize)]
struct RawWebhookEvent {
    payment_id: Option<String>,
    status: Option<String>,
}

impl PaymentWebhookEvent {
    pub fn new(payment_id: impl Into<String>, status: WebhookStatus) -> Self {
        Self {
            payment_id: payment_id.into(),
            status,
        }
    }

    /// Parses and validates a raw JSON body.
    ///
    /// `payment_id` must be a non-blank string and `status` must be a string;
    /// anything else is rejected before dispatch.
    pub fn parse(payload: &[u8]) -> Result<Self, ValidationError> {
        let raw: RawWebhookEvent = serde_json::from_slice(payload)
            .map_err(|e| ValidationError::invalid_format("body", e.to_string()))?;

        let payment_id = raw
            .payment_id
            .map(|id| id.trim().to_string())
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ValidationError::empty_field("payment_id"))?;

        let status = raw
            .status
            .ok_or_else(|| ValidationError::empty_field("status"))?;

        Ok(Self {
            payment_id,
            status: WebhookStatus::from_tag(status),
        })
    }
}
