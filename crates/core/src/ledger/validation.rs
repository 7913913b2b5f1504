//! Business rule validation for transfers.
//!
//! [`validate_request`] runs before any store access. [`validate_transfer`]
//! runs with both wallets locked, so the balance it checks cannot move until
//! the unit of work ends.

use rust_decimal::Decimal;

use super::entry::{EntryType, LedgerEntry};
use super::error::LedgerError;
use super::types::{IdempotencyKey, TransferRequest};
use super::wallet::Wallet;

/// Stateless checks on a transfer request.
///
/// # Errors
///
/// Returns an error if the amount is not positive, is finer than the
/// currency's minor unit, the key is invalid, or both wallets are the same.
pub fn validate_request(request: &TransferRequest) -> Result<(), LedgerError> {
    if request.amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(request.amount));
    }
    request.money().check_scale()?;
    // Re-check fields that may have been set directly.
    IdempotencyKey::new(request.idempotency_key.as_str())?;
    if request.sender_wallet_id == request.receiver_wallet_id {
        return Err(LedgerError::SameWallet(request.sender_wallet_id));
    }
    Ok(())
}

/// Checks a request against the locked sender and receiver rows.
///
/// Checks run in order: distinct wallets, currencies, then funds.
///
/// # Errors
///
/// Returns the first rule the transfer violates.
pub fn validate_transfer(
    request: &TransferRequest,
    sender: &Wallet,
    receiver: &Wallet,
) -> Result<(), LedgerError> {
    if sender.id == receiver.id {
        return Err(LedgerError::SameWallet(sender.id));
    }

    for wallet in [sender, receiver] {
        if wallet.currency != request.currency {
            return Err(LedgerError::CurrencyMismatch {
                wallet_id: wallet.id,
                expected: request.currency,
                actual: wallet.currency,
            });
        }
    }

    if !sender.covers(request.amount) {
        return Err(LedgerError::InsufficientFunds {
            wallet_id: sender.id,
            available: sender.balance,
            requested: request.amount,
        });
    }

    Ok(())
}

/// Checks that the entries of one transaction form a balanced pair.
///
/// # Errors
///
/// Returns [`LedgerError::InvariantViolation`] unless there is exactly one
/// debit and one credit of the same positive amount, each with a consistent
/// before/after balance.
pub fn validate_entries(entries: &[LedgerEntry]) -> Result<(), LedgerError> {
    let [first, second] = entries else {
        return Err(LedgerError::InvariantViolation(format!(
            "expected 2 entries, found {}",
            entries.len()
        )));
    };

    let (debit, credit) = match (first.entry_type, second.entry_type) {
        (EntryType::Debit, EntryType::Credit) => (first, second),
        (EntryType::Credit, EntryType::Debit) => (second, first),
        _ => {
            return Err(LedgerError::InvariantViolation(
                "transaction must have one debit and one credit".to_string(),
            ));
        }
    };

    if debit.amount <= Decimal::ZERO || debit.amount != credit.amount {
        return Err(LedgerError::InvariantViolation(format!(
            "unbalanced entries: debit {} credit {}",
            debit.amount, credit.amount
        )));
    }

    if debit.transaction_id != credit.transaction_id {
        return Err(LedgerError::InvariantViolation(
            "entries belong to different transactions".to_string(),
        ));
    }

    for entry in [debit, credit] {
        if !entry.is_consistent() {
            return Err(LedgerError::InvariantViolation(format!(
                "entry {} balance_after does not follow from balance_before",
                entry.id
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::types::{TransactionType, WalletType};
    use chrono::Utc;
    use paycore_shared::types::{Currency, Money, UserId, WalletId};
    use rust_decimal_macros::dec;

    fn wallet(currency: Currency, balance: Decimal) -> Wallet {
        let now = Utc::now();
        Wallet {
            id: WalletId::new(),
            user_id: UserId::new(),
            wallet_type: WalletType::Savings,
            currency,
            balance,
            created_at: now,
            updated_at: now,
        }
    }

    fn request(sender: &Wallet, receiver: &Wallet, amount: Decimal) -> TransferRequest {
        TransferRequest::new(
            sender.id,
            receiver.id,
            Money::new(amount, Currency::Ngn),
            TransactionType::Transfer,
            None,
            IdempotencyKey::new("k1").unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_valid_transfer() {
        let sender = wallet(Currency::Ngn, dec!(100.00));
        let receiver = wallet(Currency::Ngn, dec!(50.00));
        let req = request(&sender, &receiver, dec!(30.00));
        assert!(validate_transfer(&req, &sender, &receiver).is_ok());
    }

    #[test]
    fn test_exact_balance_is_allowed() {
        let sender = wallet(Currency::Ngn, dec!(30.00));
        let receiver = wallet(Currency::Ngn, dec!(0));
        let req = request(&sender, &receiver, dec!(30.00));
        assert!(validate_transfer(&req, &sender, &receiver).is_ok());
    }

    #[test]
    fn test_insufficient_funds() {
        let sender = wallet(Currency::Ngn, dec!(70.00));
        let receiver = wallet(Currency::Ngn, dec!(80.00));
        let err = validate_transfer(&request(&sender, &receiver, dec!(150.00)), &sender, &receiver)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::InsufficientFunds { available, requested, .. }
                if available == dec!(70.00) && requested == dec!(150.00)
        ));
    }

    #[test]
    fn test_currency_checked_before_funds() {
        let sender = wallet(Currency::Ngn, dec!(1.00));
        let receiver = wallet(Currency::Usd, dec!(0));
        let err = validate_transfer(&request(&sender, &receiver, dec!(30.00)), &sender, &receiver)
            .unwrap_err();
        assert!(matches!(
            err,
            LedgerError::CurrencyMismatch { wallet_id, actual: Currency::Usd, .. }
                if wallet_id == receiver.id
        ));
    }

    #[test]
    fn test_request_same_wallet() {
        let sender = wallet(Currency::Ngn, dec!(100.00));
        let mut req = request(&sender, &wallet(Currency::Ngn, dec!(0)), dec!(1.00));
        req.receiver_wallet_id = sender.id;
        assert!(matches!(validate_request(&req), Err(LedgerError::SameWallet(_))));
    }

    #[test]
    fn test_request_negative_amount_set_directly() {
        let sender = wallet(Currency::Ngn, dec!(100.00));
        let mut req = request(&sender, &wallet(Currency::Ngn, dec!(0)), dec!(1.00));
        req.amount = dec!(-5.00);
        assert!(matches!(validate_request(&req), Err(LedgerError::NonPositiveAmount(_))));
    }

    #[test]
    fn test_request_trailing_zeros_accepted() {
        let sender = wallet(Currency::Ngn, dec!(100.00));
        let mut req = request(&sender, &wallet(Currency::Ngn, dec!(0)), dec!(1.00));
        req.amount = dec!(30.000);
        assert!(validate_request(&req).is_ok());
        req.amount = dec!(30.005);
        assert!(matches!(validate_request(&req), Err(LedgerError::InvalidAmount(_))));
    }
}
