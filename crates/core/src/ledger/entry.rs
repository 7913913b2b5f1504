//! Ledger entry domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paycore_shared::types::{Currency, LedgerEntryId, TransactionId, WalletId};

/// Type of ledger entry.
///
/// Wallet balances are what the ledger owes the holder, so a debit reduces
/// the balance and a credit increases it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    /// Money leaves the wallet.
    Debit,
    /// Money enters the wallet.
    Credit,
}

impl EntryType {
    /// Applies an entry of `amount` to `balance`, returning `None` on overflow.
    #[must_use]
    pub fn apply(self, balance: Decimal, amount: Decimal) -> Option<Decimal> {
        match self {
            Self::Debit => balance.checked_sub(amount),
            Self::Credit => balance.checked_add(amount),
        }
    }

    /// Database and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Debit => "debit",
            Self::Credit => "credit",
        }
    }
}

/// An immutable movement of money against one wallet.
///
/// Every completed transfer owns exactly one debit and one credit entry of
/// equal amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Unique identifier for this entry.
    pub id: LedgerEntryId,
    /// Wallet whose balance moved.
    pub wallet_id: WalletId,
    /// Transaction this entry belongs to.
    pub transaction_id: TransactionId,
    /// Positive amount moved.
    pub amount: Decimal,
    /// Whether this is a debit or credit.
    pub entry_type: EntryType,
    /// Currency of the wallet.
    pub currency: Currency,
    /// Wallet balance observed under lock before the movement.
    pub balance_before: Decimal,
    /// Wallet balance after the movement.
    pub balance_after: Decimal,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    /// Returns the signed amount (negative for debit, positive for credit).
    #[must_use]
    pub fn signed_amount(&self) -> Decimal {
        match self.entry_type {
            EntryType::Debit => -self.amount,
            EntryType::Credit => self.amount,
        }
    }

    /// Returns true if `balance_after` follows from `balance_before` and the amount.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.entry_type.apply(self.balance_before, self.amount) == Some(self.balance_after)
    }
}

/// A ledger entry about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    /// Identifier assigned by the engine.
    pub id: LedgerEntryId,
    /// Wallet whose balance moves.
    pub wallet_id: WalletId,
    /// Owning transaction.
    pub transaction_id: TransactionId,
    /// Positive amount moved.
    pub amount: Decimal,
    /// Whether this is a debit or credit.
    pub entry_type: EntryType,
    /// Currency of the wallet.
    pub currency: Currency,
    /// Balance before the movement.
    pub balance_before: Decimal,
    /// Balance after the movement.
    pub balance_after: Decimal,
}

impl NewLedgerEntry {
    /// Materializes the entry with its write timestamp.
    #[must_use]
    pub fn into_entry(self, created_at: DateTime<Utc>) -> LedgerEntry {
        LedgerEntry {
            id: self.id,
            wallet_id: self.wallet_id,
            transaction_id: self.transaction_id,
            amount: self.amount,
            entry_type: self.entry_type,
            currency: self.currency,
            balance_before: self.balance_before,
            balance_after: self.balance_after,
            created_at,
        }
    }
}
