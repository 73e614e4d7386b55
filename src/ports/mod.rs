//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the billing flows and the outside world. Adapters implement these ports.
//!
//! - `PaymentGateway` - recurring-payment gateway (payments and charge schedules)
//! - `SubscriptionLedger` - append-only ledger of paid periods and reversals
//! - `Clock` / `RandomSource` - injected time and randomness

mod clock;
mod payment_gateway;
mod subscription_ledger;

pub use clock::{Clock, RandomSource};
pub use payment_gateway::{
    CreateScheduleRequest, GatewayError, GatewayErrorCode, PaymentDetail, PaymentGateway,
    ScheduleRecord,
};
pub use subscription_ledger::{AppendResult, SubscriptionLedger};
