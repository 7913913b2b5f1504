//! Transaction repository for committed reads.
//!
//! Everything here runs outside a transfer and sees only committed rows.

use paycore_core::ledger::{IdempotencyKey, LedgerEntry, StoreError, Transaction};
use paycore_shared::types::{TransactionId, WalletId};
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select,
};

use crate::entities::{ledger_entries, transactions};
use crate::error::classify_db_err;

/// Transaction and ledger entry reads.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    db: DatabaseConnection,
}

impl TransactionRepository {
    /// Creates a new transaction repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a transaction by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: TransactionId) -> Result<Option<Transaction>, StoreError> {
        transactions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(classify_db_err)?
            .map(Transaction::try_from)
            .transpose()
    }

    /// Finds a transaction by idempotency key.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_key(
        &self,
        key: &IdempotencyKey,
    ) -> Result<Option<Transaction>, StoreError> {
        transactions::Entity::find()
            .filter(transactions::Column::IdempotencyKey.eq(key.as_str()))
            .one(&self.db)
            .await
            .map_err(classify_db_err)?
            .map(Transaction::try_from)
            .transpose()
    }

    /// Lists transactions where the wallet is sender or receiver, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_wallet(
        &self,
        wallet_id: WalletId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Transaction>, StoreError> {
        by_wallet(wallet_id)
            .order_by_desc(transactions::Column::CreatedAt)
            .order_by_desc(transactions::Column::Id)
            .limit(limit)
            .offset(offset)
            .all(&self.db)
            .await
            .map_err(classify_db_err)?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    /// Counts transactions where the wallet is sender or receiver.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_by_wallet(&self, wallet_id: WalletId) -> Result<u64, StoreError> {
        by_wallet(wallet_id)
            .count(&self.db)
            .await
            .map_err(classify_db_err)
    }

    /// Lists the ledger entries of a transaction, debit first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_entries(&self, id: TransactionId) -> Result<Vec<LedgerEntry>, StoreError> {
        ledger_entries::Entity::find()
            .filter(ledger_entries::Column::TransactionId.eq(id.into_inner()))
            .order_by_asc(ledger_entries::Column::EntryType)
            .all(&self.db)
            .await
            .map_err(classify_db_err)?
            .into_iter()
            .map(LedgerEntry::try_from)
            .collect()
    }
}

fn by_wallet(wallet_id: WalletId) -> Select<transactions::Entity> {
    let id = wallet_id.into_inner();
    transactions::Entity::find().filter(
        Condition::any()
            .add(transactions::Column::SenderWalletId.eq(id))
            .add(transactions::Column::ReceiverWalletId.eq(id)),
    )
}
