//! Double-entry posting of a validated transfer.

use rust_decimal::Decimal;

use paycore_shared::types::LedgerEntryId;

use super::entry::{EntryType, NewLedgerEntry};
use super::error::LedgerError;
use super::transaction::Transaction;
use super::wallet::Wallet;

/// The writes that materialize one transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferPlan {
    /// Entry against the sender.
    pub debit: NewLedgerEntry,
    /// Entry against the receiver.
    pub credit: NewLedgerEntry,
    /// Sender balance after the transfer.
    pub sender_balance: Decimal,
    /// Receiver balance after the transfer.
    pub receiver_balance: Decimal,
}

impl TransferPlan {
    /// Net change across both wallets; zero for every valid plan.
    #[must_use]
    pub fn net_change(&self) -> Decimal {
        (self.receiver_balance - self.credit.balance_before)
            + (self.sender_balance - self.debit.balance_before)
    }
}

/// Computes entries and new balances for `transaction` from the locked rows.
///
/// # Errors
///
/// - [`LedgerError::InsufficientFunds`] if the debit would leave the sender negative.
/// - [`LedgerError::InvalidAmount`] if a balance would overflow.
pub fn plan_transfer(
    transaction: &Transaction,
    sender: &Wallet,
    receiver: &Wallet,
) -> Result<TransferPlan, LedgerError> {
    let amount = transaction.money();

    let sender_after = sender.money().checked_sub(amount)?;
    if sender_after.is_negative() {
        return Err(LedgerError::InsufficientFunds {
            wallet_id: sender.id,
            available: sender.balance,
            requested: transaction.amount,
        });
    }
    let receiver_after = receiver.money().checked_add(amount)?;

    let debit = NewLedgerEntry {
        id: LedgerEntryId::new(),
        wallet_id: sender.id,
        transaction_id: transaction.id,
        amount: transaction.amount,
        entry_type: EntryType::Debit,
        currency: sender.currency,
        balance_before: sender.balance,
        balance_after: sender_after.amount,
    };
    let credit = NewLedgerEntry {
        id: LedgerEntryId::new(),
        wallet_id: receiver.id,
        transaction_id: transaction.id,
        amount: transaction.amount,
        entry_type: EntryType::Credit,
        currency: receiver.currency,
        balance_before: receiver.balance,
        balance_after: receiver_after.amount,
    };

    Ok(TransferPlan {
        debit,
        credit,
        sender_balance: sender_after.amount,
        receiver_balance: receiver_after.amount,
    })
}
