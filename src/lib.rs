//! Subscription Ledger - recurring-payment webhook service
//!
//! Ingests `Paid` / `Cancelled` lifecycle events from a recurring-payment
//! gateway and keeps two sources of truth in step: the append-only
//! subscription ledger of billing periods, and the gateway's schedule of
//! future charges.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
