//! Two-party fund transfers over a double-entry ledger.
//!
//! This module implements the transfer engine:
//! - Wallet, transaction and ledger entry records
//! - Canonical lock ordering for wallet pairs
//! - Request and business rule validation
//! - Posting of debit/credit entries
//! - The store boundary and an in-memory store
//! - The transfer engine and read-side queries

pub mod engine;
pub mod entry;
pub mod error;
pub mod memory;
pub mod pair;
pub mod posting;
pub mod query;
pub mod store;
pub mod transaction;
pub mod types;
pub mod validation;
pub mod wallet;

#[cfg(test)]
mod posting_props;

pub use engine::LedgerEngine;
pub use entry::{EntryType, LedgerEntry, NewLedgerEntry};
pub use error::LedgerError;
pub use memory::{FaultPoint, InMemoryLedgerStore, InMemoryUnit};
pub use pair::WalletPair;
pub use posting::{TransferPlan, plan_transfer};
pub use query::LedgerQueries;
pub use store::{InsertOutcome, LedgerStore, StoreError, UnitOfWork};
pub use transaction::{NewTransaction, Transaction, TransactionStatus};
pub use types::{IdempotencyKey, TransactionType, TransferOutcome, TransferRequest, WalletType};
pub use validation::{validate_entries, validate_request, validate_transfer};
pub use wallet::Wallet;
