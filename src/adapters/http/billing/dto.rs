//! HTTP DTOs for the billing endpoints.
//!
//! The webhook response shape is fixed by the gateway integration:
//! `{ success, message, payment }` on success and `{ success: false, error }`
//! on failure.

use serde::Serialize;

use crate::application::handlers::billing::SubscriptionStatus;
use crate::domain::billing::LedgerEntry;

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Ledger row as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerEntryResponse {
    pub id: String,
    pub transaction_key: String,
    pub amount: i64,
    pub status: String,
    pub start_at: String,
    pub end_at: String,
    pub end_grace_at: String,
    pub next_schedule_at: Option<String>,
    pub next_schedule_id: Option<String>,
    pub created_at: String,
}

impl From<&LedgerEntry> for LedgerEntryResponse {
    fn from(entry: &LedgerEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            transaction_key: entry.transaction_key.clone(),
            amount: entry.amount,
            status: entry.status.as_str().to_string(),
            start_at: entry.start_at.to_rfc3339(),
            end_at: entry.end_at.to_rfc3339(),
            end_grace_at: entry.end_grace_at.to_rfc3339(),
            next_schedule_at: entry.next_schedule_at.map(|t| t.to_rfc3339()),
            next_schedule_id: entry.next_schedule_id.clone(),
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Webhook acknowledgement.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<LedgerEntryResponse>,
}

impl WebhookResponse {
    /// Event applied (or already applied) to the ledger.
    pub fn recorded(message: impl Into<String>, entry: &LedgerEntry) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            payment: Some(entry.into()),
        }
    }

    /// Event acknowledged with no side effects.
    pub fn acknowledged() -> Self {
        Self {
            success: true,
            message: None,
            payment: None,
        }
    }
}

/// Failure body for every billing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
        }
    }
}

/// Subscription status view.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionStatusResponse {
    pub transaction_key: String,
    pub active: bool,
    pub period: Option<LedgerEntryResponse>,
}

impl From<SubscriptionStatus> for SubscriptionStatusResponse {
    fn from(status: SubscriptionStatus) -> Self {
        Self {
            active: status.is_active(),
            period: status.period.as_ref().map(LedgerEntryResponse::from),
            transaction_key: status.transaction_key,
        }
    }
}

/// Liveness check body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
