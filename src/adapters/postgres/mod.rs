//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSubscriptionLedger` - append-only `payment` table

mod ledger_repository;

pub use ledger_repository::PostgresSubscriptionLedger;
