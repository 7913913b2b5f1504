//! Ledger domain types for transfer requests and their outcomes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paycore_shared::types::{Currency, Money, WalletId};

use super::error::LedgerError;
use super::transaction::Transaction;

/// Transaction type classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Wallet-to-wallet transfer.
    Transfer,
    /// Payment to a merchant wallet.
    Payment,
    /// Funds moved out to a settlement wallet.
    Withdrawal,
    /// Funds moved in from a settlement wallet.
    Deposit,
}

/// Kind of wallet a user can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WalletType {
    /// Everyday savings wallet.
    Savings,
    /// Fixed-deposit wallet.
    Fixed,
    /// Miscellaneous wallet.
    Miscellaneous,
}

/// Caller-supplied token deduplicating attempts of the same logical transfer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Longest accepted key, matching the database column.
    pub const MAX_LEN: usize = 255;

    /// Validates and wraps a key. Keys are opaque and compared byte for byte.
    pub fn new(key: impl Into<String>) -> Result<Self, LedgerError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(LedgerError::InvalidIdempotencyKey(
                "key must not be blank".to_string(),
            ));
        }
        if key.len() > Self::MAX_LEN {
            return Err(LedgerError::InvalidIdempotencyKey(format!(
                "key longer than {} bytes",
                Self::MAX_LEN
            )));
        }
        Ok(Self(key))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Input for a two-party transfer.
///
/// Build it with [`TransferRequest::new`], which rejects non-positive amounts and
/// amounts finer than the currency's minor unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// Wallet to debit.
    pub sender_wallet_id: WalletId,
    /// Wallet to credit.
    pub receiver_wallet_id: WalletId,
    /// Exact amount to move, in major units.
    pub amount: Decimal,
    /// Currency both wallets must hold.
    pub currency: Currency,
    /// Classification of the transfer.
    pub transaction_type: TransactionType,
    /// Optional free-text description.
    pub description: Option<String>,
    /// Deduplication key for client retries.
    pub idempotency_key: IdempotencyKey,
}

impl TransferRequest {
    /// Creates a validated transfer request.
    pub fn new(
        sender_wallet_id: WalletId,
        receiver_wallet_id: WalletId,
        amount: Money,
        transaction_type: TransactionType,
        description: Option<String>,
        idempotency_key: IdempotencyKey,
    ) -> Result<Self, LedgerError> {
        let request = Self {
            sender_wallet_id,
            receiver_wallet_id,
            amount: amount.amount,
            currency: amount.currency,
            transaction_type,
            description,
            idempotency_key,
        };
        super::validation::validate_request(&request)?;
        Ok(request)
    }

    /// The requested amount with its currency.
    #[must_use]
    pub const fn money(&self) -> Money {
        Money::new(self.amount, self.currency)
    }
}

/// Result of executing a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    /// This call materialized the transfer.
    Created(Transaction),
    /// A transfer with the same idempotency key already exists; it is returned unchanged.
    Replayed(Transaction),
}

impl TransferOutcome {
    /// The transaction record, whichever call created it.
    #[must_use]
    pub const fn transaction(&self) -> &Transaction {
        match self {
            Self::Created(txn) | Self::Replayed(txn) => txn,
        }
    }

    /// Consumes the outcome and returns the transaction record.
    #[must_use]
    pub fn into_transaction(self) -> Transaction {
        match self {
            Self::Created(txn) | Self::Replayed(txn) => txn,
        }
    }

    /// Returns true if this call was answered from an earlier attempt.
    #[must_use]
    pub const fn is_replay(&self) -> bool {
        matches!(self, Self::Replayed(_))
    }
}
