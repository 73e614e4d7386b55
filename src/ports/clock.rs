//! Time and randomness ports.
//!
//! The billing window depends on "now" and on a random charge minute; both
//! are injected so handlers stay deterministic under test.

use crate::domain::foundation::Timestamp;

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Source of randomness for scheduling.
pub trait RandomSource: Send + Sync {
    /// Minute within the charge hour, in `0..60`.
    fn charge_minute(&self) -> u32;

    /// Fresh payment id for the next scheduled charge.
    fn schedule_payment_id(&self) -> String;
}
