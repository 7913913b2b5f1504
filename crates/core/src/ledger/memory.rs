//! In-memory [`LedgerStore`].
//!
//! Row locks are per-wallet async mutexes held by the unit of work until it
//! ends. An inserted idempotency key is held the same way, so a second unit
//! inserting that key waits for the first to commit or roll back. Writes are
//! staged in the unit and applied in one step on commit, so readers never
//! observe a half-applied transfer. Faults can be injected at
//! any store call to exercise rollback paths.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::OwnedMutexGuard;
use tracing::debug;

use paycore_shared::types::{Currency, Money, TransactionId, UserId, WalletId};

use super::entry::{LedgerEntry, NewLedgerEntry};
use super::pair::WalletPair;
use super::store::{InsertOutcome, LedgerStore, StoreError, UnitOfWork};
use super::transaction::{NewTransaction, Transaction, TransactionStatus};
use super::types::{IdempotencyKey, WalletType};
use super::wallet::Wallet;

/// Store call at which an injected fault fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultPoint {
    /// [`LedgerStore::begin`].
    Begin,
    /// [`UnitOfWork::lock_wallets`].
    LockWallets,
    /// [`UnitOfWork::find_transaction_by_key`].
    FindByKey,
    /// [`UnitOfWork::insert_transaction`].
    InsertTransaction,
    /// [`UnitOfWork::insert_ledger_entry`].
    InsertLedgerEntry,
    /// [`UnitOfWork::update_wallet_balance`].
    UpdateWalletBalance,
    /// [`UnitOfWork::update_transaction_status`].
    UpdateTransactionStatus,
    /// [`UnitOfWork::commit`].
    Commit,
    /// Any committed-state read on the store itself.
    Read,
}

#[derive(Debug)]
struct Fault {
    point: FaultPoint,
    skip: u32,
    error: StoreError,
}

#[derive(Debug, Default)]
struct State {
    wallets: HashMap<WalletId, Wallet>,
    wallet_owners: HashSet<(UserId, WalletType)>,
    transactions: HashMap<TransactionId, Transaction>,
    committed_keys: HashMap<IdempotencyKey, TransactionId>,
    entries: Vec<LedgerEntry>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    row_locks: Mutex<HashMap<WalletId, Arc<tokio::sync::Mutex<()>>>>,
    key_locks: Mutex<HashMap<IdempotencyKey, Arc<tokio::sync::Mutex<()>>>>,
    faults: Mutex<Vec<Fault>>,
}

impl Inner {
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn row_lock(&self, id: WalletId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.row_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(id).or_default())
    }

    fn key_lock(&self, key: &IdempotencyKey) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.key_locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(key.clone()).or_default())
    }

    fn check_fault(&self, point: FaultPoint) -> Result<(), StoreError> {
        let mut faults = self.faults.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(pos) = faults.iter().position(|f| f.point == point) else {
            return Ok(());
        };
        if faults[pos].skip > 0 {
            faults[pos].skip -= 1;
            return Ok(());
        }
        Err(faults.remove(pos).error)
    }
}

/// Thread-safe in-memory store; clones share the same data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    inner: Arc<Inner>,
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a wallet with an opening balance.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Constraint`] for a negative balance, a balance
    /// finer than the currency's minor unit, or if the user already has a
    /// wallet of this type.
    pub fn open_wallet(
        &self,
        user_id: UserId,
        wallet_type: WalletType,
        currency: Currency,
        opening_balance: Decimal,
    ) -> Result<Wallet, StoreError> {
        if opening_balance < Decimal::ZERO {
            return Err(StoreError::Constraint("chk_wallet_balance_non_negative".to_string()));
        }
        Money::new(opening_balance, currency)
            .check_scale()
            .map_err(|e| StoreError::Constraint(e.to_string()))?;

        let mut state = self.inner.state();
        if !state.wallet_owners.insert((user_id, wallet_type)) {
            return Err(StoreError::Constraint("uq_wallet_user_type".to_string()));
        }

        let now = Utc::now();
        let wallet = Wallet {
            id: WalletId::new(),
            user_id,
            wallet_type,
            currency,
            balance: opening_balance,
            created_at: now,
            updated_at: now,
        };
        state.wallets.insert(wallet.id, wallet.clone());
        Ok(wallet)
    }

    /// Makes the next call at `point` fail with `error`.
    pub fn inject_fault(&self, point: FaultPoint, error: StoreError) {
        self.inject_fault_after(point, 0, error);
    }

    /// Lets `skip` calls at `point` succeed, then fails the next one with `error`.
    pub fn inject_fault_after(&self, point: FaultPoint, skip: u32, error: StoreError) {
        let mut faults = self.inner.faults.lock().unwrap_or_else(PoisonError::into_inner);
        faults.push(Fault { point, skip, error });
    }

    /// Removes all pending faults.
    pub fn clear_faults(&self) {
        self.inner
            .faults
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of committed transactions.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.inner.state().transactions.len()
    }

    /// Number of committed ledger entries.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.inner.state().entries.len()
    }

    /// Sum of committed balances held in `currency`.
    #[must_use]
    pub fn total_balance(&self, currency: Currency) -> Decimal {
        self.inner
            .state()
            .wallets
            .values()
            .filter(|w| w.currency == currency)
            .map(|w| w.balance)
            .sum()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    type Unit = InMemoryUnit;

    async fn begin(&self) -> Result<InMemoryUnit, StoreError> {
        self.inner.check_fault(FaultPoint::Begin)?;
        Ok(InMemoryUnit {
            inner: Arc::clone(&self.inner),
            locked: Vec::new(),
            guards: Vec::new(),
            staged: Staged::default(),
        })
    }

    async fn find_wallet(&self, id: WalletId) -> Result<Option<Wallet>, StoreError> {
        self.inner.check_fault(FaultPoint::Read)?;
        Ok(self.inner.state().wallets.get(&id).cloned())
    }

    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        self.inner.check_fault(FaultPoint::Read)?;
        Ok(self.inner.state().transactions.get(&id).cloned())
    }

    async fn find_transaction_by_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Transaction>, StoreError> {
        self.inner.check_fault(FaultPoint::Read)?;
        let state = self.inner.state();
        Ok(state
            .committed_keys
            .get(key)
            .and_then(|id| state.transactions.get(id))
            .cloned())
    }

    async fn list_wallet_transactions(
        &self,
        wallet_id: WalletId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.inner.check_fault(FaultPoint::Read)?;
        let mut transactions: Vec<Transaction> = self
            .inner
            .state()
            .transactions
            .values()
            .filter(|t| t.involves(wallet_id))
            .cloned()
            .collect();
        transactions.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(transactions
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect())
    }

    async fn count_wallet_transactions(&self, wallet_id: WalletId) -> Result<u64, StoreError> {
        self.inner.check_fault(FaultPoint::Read)?;
        let count = self
            .inner
            .state()
            .transactions
            .values()
            .filter(|t| t.involves(wallet_id))
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }

    async fn list_transaction_entries(
        &self,
        transaction_id: TransactionId,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        self.inner.check_fault(FaultPoint::Read)?;
        Ok(self
            .inner
            .state()
            .entries
            .iter()
            .filter(|e| e.transaction_id == transaction_id)
            .cloned()
            .collect())
    }
}

#[derive(Debug, Default)]
struct Staged {
    balances: HashMap<WalletId, Decimal>,
    transactions: HashMap<TransactionId, Transaction>,
    keys: Vec<IdempotencyKey>,
    entries: Vec<LedgerEntry>,
}

/// Unit of work over an [`InMemoryLedgerStore`].
///
/// Dropping the unit without committing discards its writes and releases its
/// row and idempotency key locks.
#[derive(Debug)]
pub struct InMemoryUnit {
    inner: Arc<Inner>,
    locked: Vec<WalletId>,
    guards: Vec<OwnedMutexGuard<()>>,
    staged: Staged,
}

impl InMemoryUnit {
    fn wallet_view(&self, wallet: &Wallet) -> Wallet {
        let mut view = wallet.clone();
        if let Some(balance) = self.staged.balances.get(&wallet.id) {
            view.balance = *balance;
        }
        view
    }
}

#[async_trait]
impl UnitOfWork for InMemoryUnit {
    async fn lock_wallets(&mut self, pair: WalletPair) -> Result<Vec<Wallet>, StoreError> {
        self.inner.check_fault(FaultPoint::LockWallets)?;
        if !self.locked.is_empty() {
            return Err(StoreError::Backend(
                "wallets already locked in this unit of work".to_string(),
            ));
        }

        for id in pair.ids() {
            let lock = self.inner.row_lock(id);
            self.guards.push(lock.lock_owned().await);
            self.locked.push(id);
        }

        let state = self.inner.state();
        Ok(pair
            .ids()
            .iter()
            .filter_map(|id| state.wallets.get(id))
            .map(|w| self.wallet_view(w))
            .collect())
    }

    async fn find_transaction_by_key(
        &mut self,
        key: &IdempotencyKey,
    ) -> Result<Option<Transaction>, StoreError> {
        self.inner.check_fault(FaultPoint::FindByKey)?;
        if let Some(txn) = self
            .staged
            .transactions
            .values()
            .find(|t| &t.idempotency_key == key)
        {
            return Ok(Some(txn.clone()));
        }
        let state = self.inner.state();
        Ok(state
            .committed_keys
            .get(key)
            .and_then(|id| state.transactions.get(id))
            .cloned())
    }

    async fn insert_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<InsertOutcome, StoreError> {
        self.inner.check_fault(FaultPoint::InsertTransaction)?;
        let key = transaction.idempotency_key.clone();
        if self.staged.keys.contains(&key) {
            return Ok(InsertOutcome::DuplicateKey);
        }

        // Waits while another unit holds the key uncommitted.
        let key_guard = self.inner.key_lock(&key).lock_owned().await;
        {
            let state = self.inner.state();
            if state.committed_keys.contains_key(&key) {
                debug!(%key, "Idempotency key already committed");
                return Ok(InsertOutcome::DuplicateKey);
            }
            for wallet_id in [transaction.sender_wallet_id, transaction.receiver_wallet_id] {
                if !state.wallets.contains_key(&wallet_id) {
                    return Err(StoreError::Constraint("transactions_wallet_id_fkey".to_string()));
                }
            }
            if state.transactions.contains_key(&transaction.id)
                || self.staged.transactions.contains_key(&transaction.id)
            {
                return Err(StoreError::Constraint("transactions_pkey".to_string()));
            }
        }

        self.guards.push(key_guard);
        self.staged.keys.push(key);
        let txn = transaction.into_transaction(Utc::now());
        self.staged.transactions.insert(txn.id, txn.clone());
        Ok(InsertOutcome::Inserted(txn))
    }

    async fn insert_ledger_entry(
        &mut self,
        entry: NewLedgerEntry,
    ) -> Result<LedgerEntry, StoreError> {
        self.inner.check_fault(FaultPoint::InsertLedgerEntry)?;
        if entry.amount <= Decimal::ZERO {
            return Err(StoreError::Constraint("chk_entry_amount_positive".to_string()));
        }
        {
            let state = self.inner.state();
            if !self.staged.transactions.contains_key(&entry.transaction_id)
                && !state.transactions.contains_key(&entry.transaction_id)
            {
                return Err(StoreError::Constraint(
                    "ledger_entries_transaction_id_fkey".to_string(),
                ));
            }
            if !state.wallets.contains_key(&entry.wallet_id) {
                return Err(StoreError::Constraint(
                    "ledger_entries_wallet_id_fkey".to_string(),
                ));
            }
        }

        let entry = entry.into_entry(Utc::now());
        self.staged.entries.push(entry.clone());
        Ok(entry)
    }

    async fn update_wallet_balance(
        &mut self,
        wallet_id: WalletId,
        balance: Decimal,
    ) -> Result<(), StoreError> {
        self.inner.check_fault(FaultPoint::UpdateWalletBalance)?;
        if !self.locked.contains(&wallet_id) {
            return Err(StoreError::Backend(format!(
                "wallet {wallet_id} updated without holding its row lock"
            )));
        }
        if balance < Decimal::ZERO {
            return Err(StoreError::Constraint("chk_wallet_balance_non_negative".to_string()));
        }
        if !self.inner.state().wallets.contains_key(&wallet_id) {
            return Err(StoreError::RowMissing {
                entity: "wallet",
                id: wallet_id.into_inner(),
            });
        }
        self.staged.balances.insert(wallet_id, balance);
        Ok(())
    }

    async fn update_transaction_status(
        &mut self,
        transaction_id: TransactionId,
        status: TransactionStatus,
    ) -> Result<Transaction, StoreError> {
        self.inner.check_fault(FaultPoint::UpdateTransactionStatus)?;
        if !self.staged.transactions.contains_key(&transaction_id) {
            let committed = self.inner.state().transactions.get(&transaction_id).cloned();
            let Some(committed) = committed else {
                return Err(StoreError::RowMissing {
                    entity: "transaction",
                    id: transaction_id.into_inner(),
                });
            };
            self.staged.transactions.insert(transaction_id, committed);
        }

        let Some(txn) = self.staged.transactions.get_mut(&transaction_id) else {
            return Err(StoreError::RowMissing {
                entity: "transaction",
                id: transaction_id.into_inner(),
            });
        };
        txn.status = status;
        txn.updated_at = Utc::now();
        Ok(txn.clone())
    }

    async fn commit(mut self) -> Result<(), StoreError> {
        self.inner.check_fault(FaultPoint::Commit)?;

        let staged = std::mem::take(&mut self.staged);
        {
            let mut state = self.inner.state();
            let now = Utc::now();
            for (id, balance) in staged.balances {
                if let Some(wallet) = state.wallets.get_mut(&id) {
                    wallet.balance = balance;
                    wallet.updated_at = now;
                }
            }
            for (id, txn) in staged.transactions {
                state.committed_keys.insert(txn.idempotency_key.clone(), id);
                state.transactions.insert(id, txn);
            }
            state.entries.extend(staged.entries);
        }
        debug!(locked = self.guards.len(), "In-memory unit of work committed");
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}
