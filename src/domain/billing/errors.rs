//! Billing error types.
//!
//! Two families:
//! - [`BillingError`] aborts the current webhook and is reported to the caller.
//! - [`ReconciliationFailure`] happens after the ledger write has committed; it
//!   is logged and carried in the handler result, never reported as failure.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode, ValidationError};

/// Fatal errors while handling a webhook.
#[derive(Debug, Clone, Error)]
pub enum BillingError {
    /// Malformed inbound payload.
    #[error("Invalid webhook payload: {0}")]
    Validation(#[from] ValidationError),

    /// Payment lookup failed at the gateway.
    #[error("Payment gateway error: {0}")]
    Upstream(String),

    /// Ledger read or write failed.
    #[error("Ledger error: {0}")]
    Persistence(String),

    /// Cancellation for a transaction that was never recorded as paid.
    #[error("No paid ledger entry found for transaction {transaction_key}")]
    NotFound { transaction_key: String },

    /// The handler task panicked or was aborted.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BillingError {
    pub fn upstream(message: impl Into<String>) -> Self {
        BillingError::Upstream(message.into())
    }

    pub fn persistence(message: impl Into<String>) -> Self {
        BillingError::Persistence(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        BillingError::Internal(message.into())
    }

    pub fn not_found(transaction_key: impl Into<String>) -> Self {
        BillingError::NotFound {
            transaction_key: transaction_key.into(),
        }
    }

    /// Returns true if a redelivery of the same event may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BillingError::Upstream(_)
                | BillingError::Persistence(_)
                | BillingError::NotFound { .. }
                | BillingError::Internal(_)
        )
    }

    /// Maps the error to the HTTP status returned to the gateway.
    ///
    /// The gateway retries on 5xx; malformed bodies are answered with 400 so
    /// they are not redelivered.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BillingError::Validation(_) => StatusCode::BAD_REQUEST,
            BillingError::Upstream(_)
            | BillingError::Persistence(_)
            | BillingError::NotFound { .. }
            | BillingError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DomainError> for BillingError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::LedgerEntryNotFound => BillingError::NotFound {
                transaction_key: err
                    .details
                    .get("transaction_key")
                    .cloned()
                    .unwrap_or_else(|| err.message.clone()),
            },
            ErrorCode::ExternalServiceError => BillingError::Upstream(err.message),
            _ => BillingError::Persistence(err.message),
        }
    }
}

/// Non-fatal failures while syncing the gateway's charge schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReconciliationFailure {
    #[error("Failed to create charge schedule {schedule_payment_id}: {reason}")]
    ScheduleCreation {
        schedule_payment_id: String,
        reason: String,
    },

    #[error("Failed to look up charge schedules: {reason}")]
    ScheduleLookup { reason: String },

    #[error("No pending charge schedule for payment {schedule_payment_id}")]
    ScheduleNotFound { schedule_payment_id: String },

    #[error("Failed to cancel charge schedule {schedule_id}: {reason}")]
    ScheduleCancellation { schedule_id: String, reason: String },

    #[error("Payment for transaction {transaction_key} has no customer id")]
    MissingCustomer { transaction_key: String },
}
