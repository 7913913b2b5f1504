//! Read-only queries over committed ledger state.
//!
//! Every query is side-effect-free, so each one runs under the retry policy:
//! transient store failures are retried with backoff and the whole sequence is
//! bounded by the policy deadline.

use paycore_shared::types::{
    DEFAULT_PER_PAGE, MAX_PER_PAGE, PageRequest, PageResponse, TransactionId, WalletId,
};
use paycore_shared::{RetryPolicy, retry};
use tracing::instrument;

use super::entry::LedgerEntry;
use super::error::LedgerError;
use super::store::LedgerStore;
use super::transaction::Transaction;
use super::wallet::Wallet;

/// Read service over a [`LedgerStore`].
#[derive(Debug, Clone)]
pub struct LedgerQueries<S> {
    store: S,
    policy: RetryPolicy,
}

impl<S: LedgerStore> LedgerQueries<S> {
    /// Creates a query service.
    #[must_use]
    pub const fn new(store: S, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// Fetches a transaction by id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TransactionNotFound`] if no committed transaction has this id.
    #[instrument(skip(self), fields(transaction_id = %id))]
    pub async fn get_transaction_by_id(
        &self,
        id: TransactionId,
    ) -> Result<Transaction, LedgerError> {
        retry(&self.policy, || self.store.find_transaction(id))
            .await?
            .ok_or(LedgerError::TransactionNotFound(id))
    }

    /// Lists transactions where the wallet is sender or receiver, newest first.
    ///
    /// A `limit` of zero means the default page size; larger limits are capped.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails after retries.
    #[instrument(skip(self), fields(wallet_id = %wallet_id))]
    pub async fn get_transactions_by_wallet(
        &self,
        wallet_id: WalletId,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let limit = effective_limit(limit);
        let transactions = retry(&self.policy, || {
            self.store.list_wallet_transactions(wallet_id, limit, offset)
        })
        .await?;
        Ok(transactions)
    }

    /// Paginated transaction history of a wallet.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::WalletNotFound`] for an unknown wallet.
    #[instrument(skip(self), fields(wallet_id = %wallet_id, page = page.page))]
    pub async fn wallet_history(
        &self,
        wallet_id: WalletId,
        page: PageRequest,
    ) -> Result<PageResponse<Transaction>, LedgerError> {
        let page = page.clamped();
        self.get_wallet(wallet_id).await?;

        let total = retry(&self.policy, || {
            self.store.count_wallet_transactions(wallet_id)
        })
        .await?;
        let data = retry(&self.policy, || {
            self.store
                .list_wallet_transactions(wallet_id, page.limit(), page.offset())
        })
        .await?;

        Ok(PageResponse::new(data, page, total))
    }

    /// Fetches a wallet by id.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::WalletNotFound`] if the wallet does not exist.
    #[instrument(skip(self), fields(wallet_id = %id))]
    pub async fn get_wallet(&self, id: WalletId) -> Result<Wallet, LedgerError> {
        retry(&self.policy, || self.store.find_wallet(id))
            .await?
            .ok_or(LedgerError::WalletNotFound(id))
    }

    /// Lists the ledger entries of a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::TransactionNotFound`] if the transaction does not exist.
    #[instrument(skip(self), fields(transaction_id = %id))]
    pub async fn get_transaction_entries(
        &self,
        id: TransactionId,
    ) -> Result<Vec<LedgerEntry>, LedgerError> {
        let entries = retry(&self.policy, || self.store.list_transaction_entries(id)).await?;
        if entries.is_empty() {
            self.get_transaction_by_id(id).await?;
        }
        Ok(entries)
    }
}

fn effective_limit(limit: u64) -> u64 {
    match limit {
        0 => u64::from(DEFAULT_PER_PAGE),
        n => n.min(u64::from(MAX_PER_PAGE)),
    }
}
