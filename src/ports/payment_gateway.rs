//! Payment gateway port for the recurring-payment provider.
//!
//! Defines the four gateway capabilities the billing flows depend on:
//! payment lookup, schedule creation, schedule lookup and schedule
//! cancellation. Implementations perform network I/O and carry their own
//! deadlines; retry policy is an implementation concern.
//!
//! # Fatality
//!
//! Only `get_payment` is fatal to a webhook. The schedule calls happen after
//! the ledger write and their failures are reconciliation failures.

use crate::domain::billing::BillingError;
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for the external recurring-payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Fetch a payment by its gateway payment id.
    async fn get_payment(&self, payment_id: &str) -> Result<PaymentDetail, GatewayError>;

    /// Register a future-dated charge keyed by `request.schedule_payment_id`.
    async fn create_schedule(&self, request: CreateScheduleRequest) -> Result<(), GatewayError>;

    /// List schedules for a billing key whose charge time falls in `[from, until]`.
    async fn query_payment_schedules(
        &self,
        billing_key: &str,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<ScheduleRecord>, GatewayError>;

    /// Delete pending schedules by gateway schedule id.
    async fn cancel_schedules(&self, schedule_ids: &[String]) -> Result<(), GatewayError>;
}

/// Payment as reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetail {
    /// Gateway's own record id.
    pub id: String,

    /// Merchant-facing payment id, when the gateway reports one.
    pub gateway_payment_id: Option<String>,

    /// Charged amount in minor currency units.
    pub amount_total: i64,

    pub order_name: String,

    /// Present only for recurring (billing-key) payments.
    pub billing_key: Option<String>,

    /// Customer the payment belongs to; required to schedule a charge.
    pub customer_id: Option<String>,
}

impl PaymentDetail {
    /// Identifier used to correlate this payment with ledger rows.
    ///
    /// Precedence: gateway payment id, then record id, then the id the
    /// webhook carried. Blank values are skipped.
    pub fn canonical_key(&self, webhook_payment_id: &str) -> String {
        [self.gateway_payment_id.as_deref(), Some(self.id.as_str())]
            .into_iter()
            .flatten()
            .find(|candidate| !candidate.trim().is_empty())
            .unwrap_or(webhook_payment_id)
            .to_string()
    }

    /// Billing key, if this payment can be charged again.
    pub fn recurring_billing_key(&self) -> Option<&str> {
        self.billing_key.as_deref().filter(|key| !key.is_empty())
    }
}

/// Request to schedule the next cycle's charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateScheduleRequest {
    /// Locally minted id that becomes the scheduled charge's payment id.
    pub schedule_payment_id: String,
    pub billing_key: String,
    pub order_name: String,
    pub customer_id: String,
    pub amount_total: i64,
    pub currency: String,
    pub time_to_pay: Timestamp,
}

/// Gateway-owned schedule record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRecord {
    /// Gateway schedule id.
    pub id: String,
    /// Payment id the schedule will charge under.
    pub payment_id: String,
}

/// Errors from gateway operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayError {
    /// Error code for categorization.
    pub code: GatewayErrorCode,

    /// Human-readable message.
    pub message: String,

    /// HTTP status returned by the gateway, if any.
    pub status: Option<u16>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl GatewayError {
    /// Create a new gateway error.
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create from a non-success HTTP response.
    pub fn from_status(status: u16, body: impl Into<String>) -> Self {
        let code = match status {
            401 | 403 => GatewayErrorCode::AuthenticationError,
            404 => GatewayErrorCode::NotFound,
            429 => GatewayErrorCode::RateLimitExceeded,
            _ => GatewayErrorCode::UpstreamError,
        };
        Self {
            code,
            message: format!("Gateway responded {}: {}", status, body.into()),
            status: Some(status),
            retryable: code.is_retryable() || status >= 500,
        }
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    /// Create a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::Timeout, message)
    }

    /// Create an unparseable-response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidResponse, message)
    }

    /// Create an error for a request that was never sent.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidRequest, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for BillingError {
    fn from(err: GatewayError) -> Self {
        BillingError::Upstream(err.to_string())
    }
}

impl From<GatewayError> for DomainError {
    fn from(err: GatewayError) -> Self {
        DomainError::new(ErrorCode::ExternalServiceError, err.to_string())
    }
}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Network connectivity issue.
    NetworkError,

    /// Request deadline elapsed.
    Timeout,

    /// Credential rejected.
    AuthenticationError,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Any other non-success response.
    UpstreamError,

    /// Response body did not match the expected shape.
    InvalidResponse,

    /// Request could not be built from the given ids or base URL.
    InvalidRequest,
}

impl GatewayErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError
                | GatewayErrorCode::Timeout
                | GatewayErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for GatewayErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            GatewayErrorCode::NetworkError => "network_error",
            GatewayErrorCode::Timeout => "timeout",
            GatewayErrorCode::AuthenticationError => "authentication_error",
            GatewayErrorCode::NotFound => "not_found",
            GatewayErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            GatewayErrorCode::UpstreamError => "upstream_error",
            GatewayErrorCode::InvalidResponse => "invalid_response",
            GatewayErrorCode::InvalidRequest => "invalid_request",
        };
        write!(f, "{}", s)
    }
}
