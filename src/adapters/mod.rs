//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `gateway` - Payment gateway (HTTP client, mock)
//! - `postgres` - Ledger persistence
//! - `memory` - In-memory ledger for tests and local runs
//! - `system` - Clock and randomness
//! - `http` - Axum routes

pub mod gateway;
pub mod http;
pub mod memory;
pub mod postgres;
pub mod system;

pub use gateway::{HttpGatewayConfig, HttpPaymentGateway, MockPaymentGateway};
pub use memory::InMemorySubscriptionLedger;
pub use postgres::PostgresSubscriptionLedger;
pub use system::{FixedClock, FixedRandom, SystemClock, ThreadRngSource};
