//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid host/port combination")]
    InvalidSocketAddr,

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid gateway base URL format")]
    InvalidGatewayUrl,

    #[error("Gateway base URL must use HTTPS in production")]
    GatewayUrlMustBeHttps,

    #[error("Gateway max_attempts must be between 1 and 10")]
    InvalidRetryAttempts,

    #[error("Server request timeout ({server_secs}s) is shorter than the gateway budget of one webhook ({budget_secs}s)")]
    RequestTimeoutBelowWebhookBudget { server_secs: u64, budget_secs: u64 },
}
