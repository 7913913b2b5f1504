//! Conversions between entity models and ledger domain types.

use chrono::{DateTime, FixedOffset, Utc};
use paycore_core::ledger::{
    IdempotencyKey, LedgerEntry, NewLedgerEntry, NewTransaction, StoreError, Transaction, Wallet,
};
use paycore_shared::types::Currency;
use sea_orm::Set;

use crate::entities::{ledger_entries, transactions, wallets};

fn currency(code: &str) -> Result<Currency, StoreError> {
    code.parse()
        .map_err(|e: String| StoreError::Backend(format!("corrupt currency column: {e}")))
}

fn utc(ts: DateTime<FixedOffset>) -> DateTime<Utc> {
    ts.with_timezone(&Utc)
}

impl TryFrom<wallets::Model> for Wallet {
    type Error = StoreError;

    fn try_from(model: wallets::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id.into(),
            user_id: model.user_id.into(),
            wallet_type: model.wallet_type.into(),
            currency: currency(&model.currency)?,
            balance: model.balance,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        })
    }
}

impl TryFrom<transactions::Model> for Transaction {
    type Error = StoreError;

    fn try_from(model: transactions::Model) -> Result<Self, Self::Error> {
        let idempotency_key = IdempotencyKey::new(model.idempotency_key)
            .map_err(|e| StoreError::Backend(format!("corrupt idempotency_key column: {e}")))?;

        Ok(Self {
            id: model.id.into(),
            sender_wallet_id: model.sender_wallet_id.into(),
            receiver_wallet_id: model.receiver_wallet_id.into(),
            amount: model.amount,
            currency: currency(&model.currency)?,
            transaction_type: model.transaction_type.into(),
            description: model.description,
            status: model.status.into(),
            idempotency_key,
            created_at: utc(model.created_at),
            updated_at: utc(model.updated_at),
        })
    }
}

impl TryFrom<ledger_entries::Model> for LedgerEntry {
    type Error = StoreError;

    fn try_from(model: ledger_entries::Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id.into(),
            wallet_id: model.wallet_id.into(),
            transaction_id: model.transaction_id.into(),
            amount: model.amount,
            entry_type: model.entry_type.into(),
            currency: currency(&model.currency)?,
            balance_before: model.balance_before,
            balance_after: model.balance_after,
            created_at: utc(model.created_at),
        })
    }
}

pub(crate) fn transaction_active_model(
    txn: NewTransaction,
    now: DateTime<Utc>,
) -> transactions::ActiveModel {
    let now: DateTime<FixedOffset> = now.into();
    transactions::ActiveModel {
        id: Set(txn.id.into_inner()),
        sender_wallet_id: Set(txn.sender_wallet_id.into_inner()),
        receiver_wallet_id: Set(txn.receiver_wallet_id.into_inner()),
        amount: Set(txn.amount),
        currency: Set(txn.currency.code().to_string()),
        transaction_type: Set(txn.transaction_type.into()),
        description: Set(txn.description),
        status: Set(txn.status.into()),
        idempotency_key: Set(txn.idempotency_key.as_str().to_string()),
        created_at: Set(now),
        updated_at: Set(now),
    }
}

pub(crate) fn entry_active_model(
    entry: NewLedgerEntry,
    now: DateTime<Utc>,
) -> ledger_entries::ActiveModel {
    ledger_entries::ActiveModel {
        id: Set(entry.id.into_inner()),
        wallet_id: Set(entry.wallet_id.into_inner()),
        transaction_id: Set(entry.transaction_id.into_inner()),
        amount: Set(entry.amount),
        entry_type: Set(entry.entry_type.into()),
        currency: Set(entry.currency.code().to_string()),
        balance_before: Set(entry.balance_before),
        balance_after: Set(entry.balance_after),
        created_at: Set(now.into()),
    }
}
