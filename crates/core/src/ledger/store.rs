//! Persistence boundary for the ledger engine.
//!
//! A [`LedgerStore`] hands out [`UnitOfWork`]s. Every write of a transfer goes
//! through one unit, and the unit either commits all of them or none. Row locks
//! taken by [`UnitOfWork::lock_wallets`] are held until the unit ends.
//!
//! Dropping a unit without calling [`UnitOfWork::commit`] must roll it back.

use async_trait::async_trait;
use rust_decimal::Decimal;
use thiserror::Error;

use paycore_shared::Retryable;
use paycore_shared::types::{TransactionId, WalletId};

use super::entry::{LedgerEntry, NewLedgerEntry};
use super::pair::WalletPair;
use super::transaction::{NewTransaction, Transaction, TransactionStatus};
use super::types::IdempotencyKey;
use super::wallet::Wallet;

/// Failures reported by a store.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Lock wait timeout, deadlock victim or serialization failure.
    #[error("Lock contention: {0}")]
    Contention(String),

    /// The connection to the backing store was lost or could not be acquired.
    #[error("Connection failure: {0}")]
    Connection(String),

    /// A row the unit expected to update does not exist.
    #[error("{entity} {id} not found")]
    RowMissing {
        /// Table or entity name.
        entity: &'static str,
        /// Identifier that was looked up.
        id: uuid::Uuid,
    },

    /// A storage constraint rejected the write.
    #[error("Constraint violated: {0}")]
    Constraint(String),

    /// Any other backend failure.
    #[error("Store error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns true for transient conditions.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Contention(_) | Self::Connection(_))
    }
}

impl Retryable for StoreError {
    fn is_retryable(&self) -> bool {
        Self::is_retryable(self)
    }
}

/// Result of inserting a transaction row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// The row was written inside the unit.
    Inserted(Transaction),
    /// A committed transaction already owns the idempotency key.
    DuplicateKey,
}

/// Source of units of work and of committed-state reads.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Unit of work type produced by this store.
    type Unit: UnitOfWork;

    /// Opens a unit of work.
    async fn begin(&self) -> Result<Self::Unit, StoreError>;

    /// Reads a committed wallet.
    async fn find_wallet(&self, id: WalletId) -> Result<Option<Wallet>, StoreError>;

    /// Reads a committed transaction.
    async fn find_transaction(&self, id: TransactionId)
    -> Result<Option<Transaction>, StoreError>;

    /// Reads a committed transaction by idempotency key.
    async fn find_transaction_by_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Lists committed transactions where the wallet is sender or receiver, newest first.
    async fn list_wallet_transactions(
        &self,
        wallet_id: WalletId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Transaction>, StoreError>;

    /// Counts committed transactions where the wallet is sender or receiver.
    async fn count_wallet_transactions(&self, wallet_id: WalletId) -> Result<u64, StoreError>;

    /// Lists the ledger entries of a transaction in write order.
    async fn list_transaction_entries(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Vec<LedgerEntry>, StoreError>;
}

/// An atomic, isolated group of writes.
#[async_trait]
pub trait UnitOfWork: Send + Sized {
    /// Acquires exclusive row locks on both wallets, lower id first, and
    /// returns the rows that exist.
    ///
    /// Must be called at most once per unit.
    async fn lock_wallets(&mut self, pair: WalletPair) -> Result<Vec<Wallet>, StoreError>;

    /// Looks up a transaction by key as seen from inside the unit.
    async fn find_transaction_by_key(
        &mut self,
        key: &IdempotencyKey,
    ) -> Result<Option<Transaction>, StoreError>;

    /// Inserts a transaction row, reporting an idempotency key collision as
    /// [`InsertOutcome::DuplicateKey`] instead of an error.
    async fn insert_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<InsertOutcome, StoreError>;

    /// Appends a ledger entry.
    async fn insert_ledger_entry(&mut self, entry: NewLedgerEntry)
    -> Result<LedgerEntry, StoreError>;

    /// Sets a locked wallet's balance.
    async fn update_wallet_balance(
        &mut self,
        wallet_id: WalletId,
        balance: Decimal,
    ) -> Result<(), StoreError>;

    /// Sets a transaction's status and returns the updated row.
    async fn update_transaction_status(
        &mut self,
        transaction_id: TransactionId,
        status: TransactionStatus,
    ) -> Result<Transaction, StoreError>;

    /// Makes every write of the unit durable and releases its locks.
    async fn commit(self) -> Result<(), StoreError>;

    /// Discards every write of the unit and releases its locks.
    async fn rollback(self) -> Result<(), StoreError>;
}
