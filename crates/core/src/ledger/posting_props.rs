//! Property-based tests for transfer posting.
//!
//! For any affordable transfer, posting conserves the combined balance of the
//! two wallets and produces a balanced, self-consistent pair of entries.

use chrono::Utc;
use proptest::prelude::*;
use rust_decimal::Decimal;

use paycore_shared::types::{Currency, Money, UserId, WalletId};

use super::error::LedgerError;
use super::posting::plan_transfer;
use super::transaction::{NewTransaction, Transaction};
use super::types::{IdempotencyKey, TransactionType, TransferRequest, WalletType};
use super::validation::{validate_entries, validate_transfer};
use super::wallet::Wallet;

/// Amounts from 0.01 to 1,000,000.00.
fn cents() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn balance() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn wallet(balance: Decimal) -> Wallet {
    let now = Utc::now();
    Wallet {
        id: WalletId::new(),
        user_id: UserId::new(),
        wallet_type: WalletType::Savings,
        currency: Currency::Ngn,
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
        IdempotencyKey::new("prop").unwrap(),
    )
    .unwrap()
}

fn pending(request: &TransferRequest) -> Transaction {
    NewTransaction::pending(request).into_transaction(Utc::now())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Posting never creates or destroys money.
    #[test]
    fn prop_posting_conserves_total(
        sender_balance in balance(),
        receiver_balance in balance(),
        amount in cents(),
    ) {
        prop_assume!(amount <= sender_balance);
        let sender = wallet(sender_balance);
        let receiver = wallet(receiver_balance);
        let req = request(&sender, &receiver, amount);
        prop_assert!(validate_transfer(&req, &sender, &receiver).is_ok());

        let plan = plan_transfer(&pending(&req), &sender, &receiver).unwrap();

        prop_assert_eq!(
            plan.sender_balance + plan.receiver_balance,
            sender_balance + receiver_balance
        );
        prop_assert_eq!(plan.net_change(), Decimal::ZERO);
        prop_assert!(plan.sender_balance >= Decimal::ZERO);
    }

    /// Posted entries always form a balanced, consistent pair.
    #[test]
    fn prop_posted_entries_are_balanced(
        sender_balance in balance(),
        receiver_balance in balance(),
        amount in cents(),
    ) {
        prop_assume!(amount <= sender_balance);
        let sender = wallet(sender_balance);
        let receiver = wallet(receiver_balance);

        let plan = plan_transfer(&pending(&request(&sender, &receiver, amount)), &sender, &receiver)
            .unwrap();
        let now = Utc::now();
        let entries = [plan.debit.into_entry(now), plan.credit.into_entry(now)];

        prop_assert!(validate_entries(&entries).is_ok());
    }

    /// Transfers larger than the balance are rejected by validation and by posting.
    #[test]
    fn prop_overdraft_rejected(
        sender_balance in balance(),
        excess in cents(),
    ) {
        let sender = wallet(sender_balance);
        let receiver = wallet(Decimal::ZERO);
        let req = request(&sender, &receiver, sender_balance + excess);

        let is_insufficient = matches!(
            validate_transfer(&req, &sender, &receiver),
            Err(LedgerError::InsufficientFunds { .. })
        );
        prop_assert!(is_insufficient);
        let is_insufficient = matches!(
            plan_transfer(&pending(&req), &sender, &receiver),
            Err(LedgerError::InsufficientFunds { .. })
        );
        prop_assert!(is_insufficient);
    }
}
