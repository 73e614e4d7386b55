//! HTTP payment gateway adapter.
//!
//! Implements `PaymentGateway` against the gateway's REST API.
//!
//! # Deadlines and retries
//!
//! Every request carries the client-wide timeout. `get_payment` is fatal to
//! a webhook and is retried on transient failures (network, timeout, 429,
//! 5xx) with exponential backoff. Schedule calls run once; their failures
//! become reconciliation failures upstream.
//!
//! # Paths
//!
//! Ids are appended as percent-encoded path segments, so `/`, `?` or `#`
//! inside an id stay part of it. Empty, `.` and `..` ids are rejected
//! before any request is sent.
//!
//! # Configuration
//!
//! ```ignore
//! let config = HttpGatewayConfig::new(api_secret).with_base_url(server.uri());
//! let gateway = HttpPaymentGateway::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::domain::foundation::Timestamp;
use crate::ports::{
    CreateScheduleRequest, GatewayError, PaymentDetail, PaymentGateway, ScheduleRecord,
};

use super::retry::RetryPolicy;
use super::wire_types::{
    CancelSchedulesBody, CreateScheduleBody, PaymentResponse, ScheduleFilter, ScheduleListResponse,
    ScheduleQueryBody,
};

/// Default gateway base URL.
pub const DEFAULT_BASE_URL: &str = "https://api.portone.io";

/// Default authorization scheme prefix.
pub const DEFAULT_AUTH_SCHEME: &str = "PortOne";

/// HTTP gateway configuration.
#[derive(Clone)]
pub struct HttpGatewayConfig {
    /// API secret sent in the `Authorization` header.
    api_secret: SecretString,

    /// Base URL without trailing slash.
    base_url: String,

    /// Scheme prefix for the `Authorization` header.
    auth_scheme: String,

    /// Per-request deadline.
    request_timeout: Duration,

    /// Retry policy for payment lookups.
    lookup_retry: RetryPolicy,
}

impl HttpGatewayConfig {
    pub fn new(api_secret: SecretString) -> Self {
        Self {
            api_secret,
            base_url: DEFAULT_BASE_URL.to_string(),
            auth_scheme: DEFAULT_AUTH_SCHEME.to_string(),
            request_timeout: Duration::from_secs(10),
            lookup_retry: RetryPolicy::default(),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_auth_scheme(mut self, scheme: impl Into<String>) -> Self {
        self.auth_scheme = scheme.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_lookup_retry(mut self, policy: RetryPolicy) -> Self {
        self.lookup_retry = policy;
        self
    }
}

/// reqwest-backed payment gateway.
pub struct HttpPaymentGateway {
    config: HttpGatewayConfig,
    base_url: Url,
    http_client: reqwest::Client,
}

impl HttpPaymentGateway {
    /// Build the adapter and its HTTP client.
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GatewayError::network(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = Url::parse(&config.base_url).map_err(|e| {
            GatewayError::invalid_request(format!("Invalid gateway base URL: {}", e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(GatewayError::invalid_request(format!(
                "Gateway base URL cannot carry a path: {}",
                config.base_url
            )));
        }

        Ok(Self {
            config,
            base_url,
            http_client,
        })
    }

    /// Base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        if let Some(segment) = segments
            .iter()
            .find(|s| matches!(s.trim(), "" | "." | ".."))
        {
            return Err(GatewayError::invalid_request(format!(
                "Invalid path segment {:?}",
                segment
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::invalid_request("Gateway base URL cannot carry a path"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http_client.request(method, url).header(
            reqwest::header::AUTHORIZATION,
            format!(
                "{} {}",
                self.config.auth_scheme,
                self.config.api_secret.expose_secret()
            ),
        )
    }

    async fn send(&self, operation: &str, request: RequestBuilder) -> Result<Response, GatewayError> {
        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::timeout(format!("{} timed out: {}", operation, e))
            } else {
                GatewayError::network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(
                operation,
                status = status.as_u16(),
                error = %error_text,
                "Gateway request failed"
            );
            return Err(GatewayError::from_status(status.as_u16(), error_text));
        }

        Ok(response)
    }

    async fn read_json<T: DeserializeOwned>(
        operation: &str,
        response: Response,
    ) -> Result<T, GatewayError> {
        response.json().await.map_err(|e| {
            GatewayError::invalid_response(format!(
                "Failed to parse {} response: {}",
                operation, e
            ))
        })
    }

    async fn fetch_payment_once(&self, payment_id: &str) -> Result<PaymentDetail, GatewayError> {
        let url = self.endpoint(&["payments", payment_id])?;
        let request = self.request(Method::GET, url);
        let response = self.send("get_payment", request).await?;
        let body: PaymentResponse = Self::read_json("get_payment", response).await?;
        Ok(body.into())
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn get_payment(&self, payment_id: &str) -> Result<PaymentDetail, GatewayError> {
        self.config
            .lookup_retry
            .run("get_payment", || self.fetch_payment_once(payment_id))
            .await
    }

    async fn create_schedule(&self, request: CreateScheduleRequest) -> Result<(), GatewayError> {
        let url = self.endpoint(&["payments", &request.schedule_payment_id, "schedule"])?;
        let builder = self
            .request(Method::POST, url)
            .json(&CreateScheduleBody::from(&request));

        self.send("create_schedule", builder).await?;

        tracing::debug!(
            schedule_payment_id = %request.schedule_payment_id,
            time_to_pay = %request.time_to_pay,
            "Gateway schedule created"
        );
        Ok(())
    }

    async fn query_payment_schedules(
        &self,
        billing_key: &str,
        from: Timestamp,
        until: Timestamp,
    ) -> Result<Vec<ScheduleRecord>, GatewayError> {
        let body = ScheduleQueryBody {
            filter: ScheduleFilter {
                billing_key: billing_key.to_string(),
                from: from.to_rfc3339(),
                until: until.to_rfc3339(),
            },
        };
        let url = self.endpoint(&["payment-schedules"])?;
        let builder = self.request(Method::GET, url).json(&body);

        let response = self.send("query_payment_schedules", builder).await?;
        let list: ScheduleListResponse =
            Self::read_json("query_payment_schedules", response).await?;

        Ok(list.items.into_iter().map(ScheduleRecord::from).collect())
    }

    async fn cancel_schedules(&self, schedule_ids: &[String]) -> Result<(), GatewayError> {
        let body = CancelSchedulesBody {
            schedule_ids: schedule_ids.to_vec(),
        };
        let url = self.endpoint(&["payment-schedules"])?;
        let builder = self.request(Method::DELETE, url).json(&body);

        self.send("cancel_schedules", builder).await?;
        Ok(())
    }
}
