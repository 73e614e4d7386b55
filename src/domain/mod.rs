//! Domain layer.
//!
//! - `foundation` - shared value objects and error types
//! - `billing` - ledger entries, billing windows and webhook semantics

pub mod billing;
pub mod foundation;
