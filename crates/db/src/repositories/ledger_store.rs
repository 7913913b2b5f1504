//! PostgreSQL implementation of the ledger store.
//!
//! A unit of work is one database transaction at READ COMMITTED. Wallet rows
//! are locked with `SELECT ... ORDER BY id FOR UPDATE`, so PostgreSQL takes
//! the row locks in ascending id order, the same order [`WalletPair`]
//! encodes. Dropping an uncommitted unit rolls the transaction back.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use paycore_core::ledger::{
    IdempotencyKey, InsertOutcome, LedgerEntry, LedgerStore, NewLedgerEntry, NewTransaction,
    StoreError, Transaction, TransactionStatus, UnitOfWork, Wallet, WalletPair,
};
use paycore_shared::config::LedgerConfig;
use paycore_shared::types::{TransactionId, WalletId};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;

use super::transaction::TransactionRepository;
use super::wallet::WalletRepository;
use crate::convert::{entry_active_model, transaction_active_model};
use crate::entities::{transactions, wallets};
use crate::error::classify_db_err;

/// [`LedgerStore`] backed by PostgreSQL through `SeaORM`.
#[derive(Debug, Clone)]
pub struct SeaOrmLedgerStore {
    db: DatabaseConnection,
    lock_timeout: Duration,
    wallets: WalletRepository,
    transactions: TransactionRepository,
}

impl SeaOrmLedgerStore {
    /// Creates a store; each unit waits at most `lock_timeout` for a row lock.
    #[must_use]
    pub fn new(db: DatabaseConnection, lock_timeout: Duration) -> Self {
        Self {
            wallets: WalletRepository::new(db.clone()),
            transactions: TransactionRepository::new(db.clone()),
            db,
            lock_timeout,
        }
    }

    /// Creates a store using the configured lock timeout.
    #[must_use]
    pub fn from_config(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self::new(db, config.lock_timeout())
    }

    /// The underlying connection pool.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl LedgerStore for SeaOrmLedgerStore {
    type Unit = SeaOrmUnit;

    async fn begin(&self) -> Result<SeaOrmUnit, StoreError> {
        let txn = self.db.begin().await.map_err(classify_db_err)?;
        let statement = format!(
            "SET LOCAL lock_timeout = '{}ms'",
            self.lock_timeout.as_millis()
        );
        txn.execute_unprepared(&statement)
            .await
            .map_err(classify_db_err)?;

        Ok(SeaOrmUnit {
            txn,
            locked: Vec::with_capacity(2),
        })
    }

    async fn find_wallet(&self, id: WalletId) -> Result<Option<Wallet>, StoreError> {
        self.wallets.find_by_id(id).await
    }

    async fn find_transaction(
        &self,
        id: TransactionId,
    ) -> Result<Option<Transaction>, StoreError> {
        self.transactions.find_by_id(id).await
    }

    async fn find_transaction_by_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Transaction>, StoreError> {
        self.transactions.find_by_key(key).await
    }

    async fn list_wallet_transactions(
        &self,
        wallet_id: WalletId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Transaction>, StoreError> {
        self.transactions
            .list_by_wallet(wallet_id, limit, offset)
            .await
    }

    async fn count_wallet_transactions(&self, wallet_id: WalletId) -> Result<u64, StoreError> {
        self.transactions.count_by_wallet(wallet_id).await
    }

    async fn list_transaction_entries(
        &self,
        id: TransactionId,
    ) -> Result<Vec<LedgerEntry>, StoreError> {
        self.transactions.list_entries(id).await
    }
}

/// One open database transaction.
#[derive(Debug)]
pub struct SeaOrmUnit {
    txn: DatabaseTransaction,
    locked: Vec<WalletId>,
}

#[async_trait]
impl UnitOfWork for SeaOrmUnit {
    async fn lock_wallets(&mut self, pair: WalletPair) -> Result<Vec<Wallet>, StoreError> {
        let ids = pair.ids().map(WalletId::into_inner);
        let rows = wallets::Entity::find()
            .filter(wallets::Column::Id.is_in(ids))
            .order_by_asc(wallets::Column::Id)
            .lock_exclusive()
            .all(&self.txn)
            .await
            .map_err(classify_db_err)?;

        let wallets = rows
            .into_iter()
            .map(Wallet::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        self.locked.extend(wallets.iter().map(|w| w.id));
        debug!(locked = wallets.len(), "Wallet rows locked");

        Ok(wallets)
    }

    async fn find_transaction_by_key(
        &mut self,
        key: &IdempotencyKey,
    ) -> Result<Option<Transaction>, StoreError> {
        transactions::Entity::find()
            .filter(transactions::Column::IdempotencyKey.eq(key.as_str()))
            .one(&self.txn)
            .await
            .map_err(classify_db_err)?
            .map(Transaction::try_from)
            .transpose()
    }

    async fn insert_transaction(
        &mut self,
        transaction: NewTransaction,
    ) -> Result<InsertOutcome, StoreError> {
        let id = transaction.id;
        let model = transaction_active_model(transaction, Utc::now());

        // DO NOTHING leaves the database transaction usable after a key collision.
        let inserted = transactions::Entity::insert(model)
            .on_conflict(
                OnConflict::column(transactions::Column::IdempotencyKey)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.txn)
            .await
            .map_err(classify_db_err)?;

        if inserted == 0 {
            return Ok(InsertOutcome::DuplicateKey);
        }

        let model = transactions::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(classify_db_err)?
            .ok_or(StoreError::RowMissing {
                entity: "transaction",
                id: id.into_inner(),
            })?;

        Ok(InsertOutcome::Inserted(Transaction::try_from(model)?))
    }

    async fn insert_ledger_entry(
        &mut self,
        entry: NewLedgerEntry,
    ) -> Result<LedgerEntry, StoreError> {
        entry_active_model(entry, Utc::now())
            .insert(&self.txn)
            .await
            .map_err(classify_db_err)?
            .try_into()
    }

    async fn update_wallet_balance(
        &mut self,
        wallet_id: WalletId,
        balance: Decimal,
    ) -> Result<(), StoreError> {
        if !self.locked.contains(&wallet_id) {
            return Err(StoreError::Backend(format!(
                "wallet {wallet_id} updated without holding its lock"
            )));
        }

        let result = wallets::Entity::update_many()
            .col_expr(wallets::Column::Balance, Expr::value(balance))
            .col_expr(wallets::Column::UpdatedAt, Expr::current_timestamp().into())
            .filter(wallets::Column::Id.eq(wallet_id.into_inner()))
            .exec(&self.txn)
            .await
            .map_err(classify_db_err)?;

        if result.rows_affected == 0 {
            return Err(StoreError::RowMissing {
                entity: "wallet",
                id: wallet_id.into_inner(),
            });
        }
        Ok(())
    }

    async fn update_transaction_status(
        &mut self,
        id: TransactionId,
        status: TransactionStatus,
    ) -> Result<Transaction, StoreError> {
        let model = transactions::Entity::find_by_id(id.into_inner())
            .one(&self.txn)
            .await
            .map_err(classify_db_err)?
            .ok_or(StoreError::RowMissing {
                entity: "transaction",
                id: id.into_inner(),
            })?;

        let mut active: transactions::ActiveModel = model.into();
        active.status = Set(status.into());
        active.updated_at = Set(Utc::now().into());

        active
            .update(&self.txn)
            .await
            .map_err(classify_db_err)?
            .try_into()
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().await.map_err(classify_db_err)
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.txn.rollback().await.map_err(classify_db_err)
    }
}
