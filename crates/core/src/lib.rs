//! Core ledger logic for Paycore.
//!
//! This crate has no database or web dependencies. Persistence sits behind the
//! [`ledger::LedgerStore`] trait; `paycore-db` provides the `PostgreSQL`
//! implementation and [`ledger::InMemoryLedgerStore`] serves tests and demos.
//!
//! # Modules
//!
//! - `ledger` - Transfer engine, double-entry posting and read queries

pub mod ledger;
