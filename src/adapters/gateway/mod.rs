//! Payment gateway adapters.
//!
//! - `HttpPaymentGateway` - reqwest client for the gateway's REST API
//! - `MockPaymentGateway` - call-recording fake for tests

mod http_gateway;
mod mock_gateway;
mod retry;
mod wire_types;

pub use http_gateway::{HttpGatewayConfig, HttpPaymentGateway, DEFAULT_AUTH_SCHEME, DEFAULT_BASE_URL};
pub use mock_gateway::{MethodCall, MockPaymentGateway, StoredSchedule};
pub use retry::RetryPolicy;
