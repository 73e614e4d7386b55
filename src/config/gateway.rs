//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use crate::adapters::gateway::{HttpGatewayConfig, RetryPolicy, DEFAULT_AUTH_SCHEME, DEFAULT_BASE_URL};

use super::error::ValidationError;
use super::server::Environment;

/// Recurring-payment gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// REST API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API secret for the `Authorization` header
    pub api_secret: SecretString,

    /// `Authorization` header scheme
    #[serde(default = "default_auth_scheme")]
    pub auth_scheme: String,

    /// Per-request deadline in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Attempts for payment lookups, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff before the first retry, in milliseconds
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_ms: u64,
}

impl GatewayConfig {
    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Retry policy for payment lookups
    pub fn lookup_retry(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_attempts,
            Duration::from_millis(self.initial_backoff_ms),
        )
    }

    /// Worst-case time spent in `get_payment`: every attempt hitting the
    /// request timeout, plus the backoff sleeps between them.
    pub fn lookup_budget(&self) -> Duration {
        let policy = self.lookup_retry();
        let backoff: Duration = (1..policy.max_attempts())
            .map(|attempt| policy.backoff_after(attempt))
            .sum();
        self.request_timeout() * policy.max_attempts() + backoff
    }

    /// Worst-case time one webhook spends at the gateway: a fully retried
    /// lookup plus the two single-attempt schedule calls that follow it
    /// (query and cancel, or query and create on a replay).
    pub fn webhook_budget(&self) -> Duration {
        self.lookup_budget() + self.request_timeout() * 2
    }

    /// Adapter configuration for `HttpPaymentGateway`
    pub fn http_config(&self) -> HttpGatewayConfig {
        HttpGatewayConfig::new(self.api_secret.clone())
            .with_base_url(&self.base_url)
            .with_auth_scheme(&self.auth_scheme)
            .with_request_timeout(self.request_timeout())
            .with_lookup_retry(self.lookup_retry())
    }

    /// Validate gateway configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.api_secret.expose_secret().trim().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__API_SECRET"));
        }
        if !self.base_url.starts_with("https://") && !self.base_url.starts_with("http://") {
            return Err(ValidationError::InvalidGatewayUrl);
        }
        if *environment == Environment::Production && !self.base_url.starts_with("https://") {
            return Err(ValidationError::GatewayUrlMustBeHttps);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.max_attempts == 0 || self.max_attempts > 10 {
            return Err(ValidationError::InvalidRetryAttempts);
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_auth_scheme() -> String {
    DEFAULT_AUTH_SCHEME.to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff() -> u64 {
    200
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(secret: &str) -> GatewayConfig {
        GatewayConfig {
            base_url: default_base_url(),
            api_secret: SecretString::new(secret.to_string()),
            auth_scheme: default_auth_scheme(),
            request_timeout_secs: default_request_timeout(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff(),
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config("secret").validate(&Environment::Production).is_ok());
    }

    #[test]
    fn test_blank_secret_is_missing() {
        assert_eq!(
            config("  ").validate(&Environment::Development),
            Err(ValidationError::MissingRequired("GATEWAY__API_SECRET"))
        );
    }

    #[test]
    fn test_production_requires_https() {
        let mut c = config("secret");
        c.base_url = "http://localhost:9000".to_string();
        assert!(c.validate(&Environment::Development).is_ok());
        assert_eq!(
            c.validate(&Environment::Production),
            Err(ValidationError::GatewayUrlMustBeHttps)
        );
    }

    #[test]
    fn test_invalid_url() {
        let mut c = config("secret");
        c.base_url = "api.portone.io".to_string();
        assert_eq!(
            c.validate(&Environment::Development),
            Err(ValidationError::InvalidGatewayUrl)
        );
    }

    #[test]
    fn test_retry_bounds() {
        let mut c = config("secret");
        c.max_attempts = 0;
        assert_eq!(
            c.validate(&Environment::Development),
            Err(ValidationError::InvalidRetryAttempts)
        );
    }

    #[test]
    fn test_lookup_retry_from_config() {
        let policy = config("secret").lookup_retry();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.backoff_after(1), Duration::from_millis(200));
    }

    #[test]
    fn test_lookup_budget_covers_all_attempts() {
        assert_eq!(
            config("secret").lookup_budget(),
            Duration::from_millis(30_000 + 200 + 400)
        );

        let mut single = config("secret");
        single.max_attempts = 1;
        assert_eq!(single.lookup_budget(), Duration::from_secs(10));
    }

    #[test]
    fn test_webhook_budget_adds_schedule_calls() {
        assert_eq!(
            config("secret").webhook_budget(),
            Duration::from_millis(50_000 + 200 + 400)
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", config("super-secret-value"));
        assert!(!rendered.contains("super-secret-value"));
    }
}
