//! Canonical lock order for the two wallets of a transfer.
//!
//! Every unit of work that locks two wallets locks the lower id first. Two
//! opposite-direction transfers between the same wallets therefore queue on
//! the same first lock instead of each holding one and waiting for the other.

use paycore_shared::types::WalletId;

use super::error::LedgerError;
use super::wallet::Wallet;

/// Two distinct wallets in ascending id order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletPair {
    first: WalletId,
    second: WalletId,
}

impl WalletPair {
    /// Orders two wallet ids for locking.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::SameWallet`] if the ids are equal.
    pub fn new(a: WalletId, b: WalletId) -> Result<Self, LedgerError> {
        if a == b {
            return Err(LedgerError::SameWallet(a));
        }
        let (first, second) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { first, second })
    }

    /// Wallet locked first.
    #[must_use]
    pub const fn first(&self) -> WalletId {
        self.first
    }

    /// Wallet locked second.
    #[must_use]
    pub const fn second(&self) -> WalletId {
        self.second
    }

    /// Both ids in lock order.
    #[must_use]
    pub const fn ids(&self) -> [WalletId; 2] {
        [self.first, self.second]
    }

    /// Returns true if `id` is one of the pair.
    #[must_use]
    pub fn contains(&self, id: WalletId) -> bool {
        self.first == id || self.second == id
    }

    /// Splits locked rows into `(sender, receiver)`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::WalletNotFound`] if either wallet has no row.
    /// - [`LedgerError::InvariantViolation`] if the rows or roles do not match the pair.
    pub fn resolve(
        &self,
        rows: Vec<Wallet>,
        sender_id: WalletId,
        receiver_id: WalletId,
    ) -> Result<(Wallet, Wallet), LedgerError> {
        if sender_id == receiver_id || !self.contains(sender_id) || !self.contains(receiver_id) {
            return Err(LedgerError::InvariantViolation(format!(
                "transfer {sender_id} -> {receiver_id} does not match locked pair {} / {}",
                self.first, self.second
            )));
        }

        let mut sender = None;
        let mut receiver = None;
        for row in rows {
            if row.id == sender_id && sender.is_none() {
                sender = Some(row);
            } else if row.id == receiver_id && receiver.is_none() {
                receiver = Some(row);
            } else {
                return Err(LedgerError::InvariantViolation(format!(
                    "lock returned unexpected wallet row {}",
                    row.id
                )));
            }
        }

        let sender = sender.ok_or(LedgerError::WalletNotFound(sender_id))?;
        let receiver = receiver.ok_or(LedgerError::WalletNotFound(receiver_id))?;
        Ok((sender, receiver))
    }
}
