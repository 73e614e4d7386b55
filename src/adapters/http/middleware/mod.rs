//! HTTP middleware for axum.
//!
//! - `timeout` - Inbound request deadline with a JSON error body

pub mod timeout;

pub use timeout::with_request_timeout;
