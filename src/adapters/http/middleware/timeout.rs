//! Inbound request deadline.
//!
//! tower-http's `TimeoutLayer` answers an expired request with an empty
//! `408`. The gateway only redelivers on 5xx and expects the
//! `{ success: false, error }` body, so the expired response is rewritten.
//!
//! ```ignore
//! let app = with_request_timeout(billing_router().with_state(state), Duration::from_secs(60));
//! ```

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{middleware, Json, Router};
use tower_http::timeout::TimeoutLayer;

use crate::adapters::http::billing::ErrorResponse;

/// Wraps `router` so requests running past `timeout` get a retryable 500.
pub fn with_request_timeout(router: Router, timeout: Duration) -> Router {
    router
        .layer(TimeoutLayer::new(timeout))
        .layer(middleware::map_response(timeout_as_error))
}

async fn timeout_as_error(response: Response) -> Response {
    if response.status() != StatusCode::REQUEST_TIMEOUT {
        return response;
    }

    tracing::warn!("Request exceeded the server deadline");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Request timed out")),
    )
        .into_response()
}
