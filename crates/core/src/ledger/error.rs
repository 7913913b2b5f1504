//! Ledger error types.
//!
//! Errors fall into three groups: request validation, business rules checked
//! under lock, and infrastructure failures surfaced by the store. Only the
//! last group can be worth retrying.

use std::time::Duration;

use rust_decimal::Decimal;
use thiserror::Error;

use paycore_shared::types::{Currency, MoneyError, TransactionId, WalletId};
use paycore_shared::{AppError, RetryError};

use super::store::StoreError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Validation Errors ==========
    /// Transfer amount must be strictly positive.
    #[error("Transfer amount must be positive, got {0}")]
    NonPositiveAmount(Decimal),

    /// Amount cannot be represented in the currency.
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] MoneyError),

    /// Idempotency key is blank or too long.
    #[error("Invalid idempotency key: {0}")]
    InvalidIdempotencyKey(String),

    /// Sender and receiver are the same wallet.
    #[error("Cannot transfer from wallet {0} to itself")]
    SameWallet(WalletId),

    // ========== Business Rule Errors ==========
    /// A wallet holds a different currency than the one requested.
    #[error("Wallet {wallet_id} holds {actual}, transfer is in {expected}")]
    CurrencyMismatch {
        /// Offending wallet.
        wallet_id: WalletId,
        /// Currency of the transfer.
        expected: Currency,
        /// Currency held by the wallet.
        actual: Currency,
    },

    /// Sender balance does not cover the amount.
    #[error("Insufficient funds in wallet {wallet_id}: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Sender wallet.
        wallet_id: WalletId,
        /// Balance at the time of the check.
        available: Decimal,
        /// Requested amount.
        requested: Decimal,
    },

    // ========== Lookup Errors ==========
    /// Wallet does not exist.
    #[error("Wallet not found: {0}")]
    WalletNotFound(WalletId),

    /// Transaction does not exist.
    #[error("Transaction not found: {0}")]
    TransactionNotFound(TransactionId),

    // ========== Infrastructure Errors ==========
    /// The store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The operation did not finish within its deadline; nothing was committed.
    #[error("Deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    /// A store returned data that breaks an engine invariant.
    #[error("Invariant violated: {0}")]
    InvariantViolation(String),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NonPositiveAmount(_) => "NON_POSITIVE_AMOUNT",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidIdempotencyKey(_) => "INVALID_IDEMPOTENCY_KEY",
            Self::SameWallet(_) => "SAME_WALLET",
            Self::CurrencyMismatch { .. } => "CURRENCY_MISMATCH",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::WalletNotFound(_) => "WALLET_NOT_FOUND",
            Self::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            Self::Store(StoreError::Contention(_)) => "CONTENTION",
            Self::Store(StoreError::Connection(_)) => "CONNECTION_FAILURE",
            Self::Store(_) => "DATABASE_ERROR",
            Self::DeadlineExceeded(_) => "DEADLINE_EXCEEDED",
            Self::InvariantViolation(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::NonPositiveAmount(_)
            | Self::InvalidAmount(_)
            | Self::InvalidIdempotencyKey(_)
            | Self::SameWallet(_) => 400,

            Self::WalletNotFound(_) | Self::TransactionNotFound(_) => 404,

            Self::CurrencyMismatch { .. } | Self::InsufficientFunds { .. } => 422,

            Self::Store(StoreError::Contention(_) | StoreError::Connection(_)) => 503,
            Self::DeadlineExceeded(_) => 504,
            Self::Store(_) | Self::InvariantViolation(_) => 500,
        }
    }

    /// Returns true for domain failures that no retry can fix.
    #[must_use]
    pub const fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::NonPositiveAmount(_)
                | Self::InvalidAmount(_)
                | Self::InvalidIdempotencyKey(_)
                | Self::SameWallet(_)
                | Self::CurrencyMismatch { .. }
                | Self::InsufficientFunds { .. }
                | Self::WalletNotFound(_)
                | Self::TransactionNotFound(_)
        )
    }

    /// Returns true if the caller may resubmit the same request with the same key.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::DeadlineExceeded(_) => true,
            _ => false,
        }
    }
}

impl From<RetryError<StoreError>> for LedgerError {
    fn from(err: RetryError<StoreError>) -> Self {
        match err {
            RetryError::Operation(e) => Self::Store(e),
            RetryError::DeadlineExceeded(deadline) => Self::DeadlineExceeded(deadline),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::NonPositiveAmount(_)
            | LedgerError::InvalidAmount(_)
            | LedgerError::InvalidIdempotencyKey(_)
            | LedgerError::SameWallet(_) => Self::Validation(message),
            LedgerError::CurrencyMismatch { .. } | LedgerError::InsufficientFunds { .. } => {
                Self::BusinessRule(message)
            }
            LedgerError::WalletNotFound(_) | LedgerError::TransactionNotFound(_) => {
                Self::NotFound(message)
            }
            LedgerError::Store(StoreError::Contention(_) | StoreError::Connection(_)) => {
                Self::Unavailable(message)
            }
            LedgerError::Store(_) => Self::Database(message),
            LedgerError::DeadlineExceeded(_) => Self::Timeout(message),
            LedgerError::InvariantViolation(_) => Self::Internal(message),
        }
    }
}
