//! Transfer transaction records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paycore_shared::types::{Currency, Money, TransactionId, WalletId};

use super::types::{IdempotencyKey, TransactionType, TransferRequest};

/// Transaction status.
///
/// Aborted attempts roll back entirely, so committed rows are `Completed`.
/// `Pending` is only visible inside the unit of work that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Created inside an open unit of work.
    Pending,
    /// Both entries and both balance updates succeeded.
    Completed,
    /// Reserved for audit records of failed attempts.
    Failed,
}

impl TransactionStatus {
    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns true if no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// The business record of a transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier.
    pub id: TransactionId,
    /// Debited wallet.
    pub sender_wallet_id: WalletId,
    /// Credited wallet.
    pub receiver_wallet_id: WalletId,
    /// Amount moved.
    pub amount: Decimal,
    /// Currency of the transfer.
    pub currency: Currency,
    /// Classification.
    pub transaction_type: TransactionType,
    /// Optional description.
    pub description: Option<String>,
    /// Current status.
    pub status: TransactionStatus,
    /// Globally unique deduplication key.
    pub idempotency_key: IdempotencyKey,
    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
    /// When the transaction was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// The transferred amount with its currency.
    #[must_use]
    pub const fn money(&self) -> Money {
        Money::new(self.amount, self.currency)
    }

    /// Returns true if `wallet_id` is the sender or the receiver.
    #[must_use]
    pub fn involves(&self, wallet_id: WalletId) -> bool {
        self.sender_wallet_id == wallet_id || self.receiver_wallet_id == wallet_id
    }
}

/// A transaction row about to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Identifier assigned by the engine.
    pub id: TransactionId,
    /// Debited wallet.
    pub sender_wallet_id: WalletId,
    /// Credited wallet.
    pub receiver_wallet_id: WalletId,
    /// Amount moved.
    pub amount: Decimal,
    /// Currency of the transfer.
    pub currency: Currency,
    /// Classification.
    pub transaction_type: TransactionType,
    /// Optional description.
    pub description: Option<String>,
    /// Initial status.
    pub status: TransactionStatus,
    /// Deduplication key.
    pub idempotency_key: IdempotencyKey,
}

impl NewTransaction {
    /// A pending transaction for `request` with a fresh identifier.
    #[must_use]
    pub fn pending(request: &TransferRequest) -> Self {
        Self {
            id: TransactionId::new(),
            sender_wallet_id: request.sender_wallet_id,
            receiver_wallet_id: request.receiver_wallet_id,
            amount: request.amount,
            currency: request.currency,
            transaction_type: request.transaction_type,
            description: request.description.clone(),
            status: TransactionStatus::Pending,
            idempotency_key: request.idempotency_key.clone(),
        }
    }

    /// Materializes the row with its write timestamp.
    #[must_use]
    pub fn into_transaction(self, now: DateTime<Utc>) -> Transaction {
        Transaction {
            id: self.id,
            sender_wallet_id: self.sender_wallet_id,
            receiver_wallet_id: self.receiver_wallet_id,
            amount: self.amount,
            currency: self.currency,
            transaction_type: self.transaction_type,
            description: self.description,
            status: self.status,
            idempotency_key: self.idempotency_key,
            created_at: now,
            updated_at: now,
        }
    }
}
