//! PostgreSQL enum types and their mapping to ledger domain enums.

use paycore_core::ledger;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `wallet_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "wallet_type")]
pub enum WalletType {
    /// Savings wallet.
    #[sea_orm(string_value = "savings")]
    Savings,
    /// Fixed deposit wallet.
    #[sea_orm(string_value = "fixed")]
    Fixed,
    /// Everything else.
    #[sea_orm(string_value = "miscellaneous")]
    Miscellaneous,
}

/// `transaction_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_type")]
pub enum TransactionType {
    /// Wallet to wallet transfer.
    #[sea_orm(string_value = "transfer")]
    Transfer,
    /// Payment.
    #[sea_orm(string_value = "payment")]
    Payment,
    /// Withdrawal.
    #[sea_orm(string_value = "withdrawal")]
    Withdrawal,
    /// Deposit.
    #[sea_orm(string_value = "deposit")]
    Deposit,
}

/// `transaction_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "transaction_status")]
pub enum TransactionStatus {
    /// Inserted, entries not yet written.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Entries and balances written.
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Terminal failure.
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// `entry_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "entry_type")]
pub enum EntryType {
    /// Money leaving the wallet.
    #[sea_orm(string_value = "debit")]
    Debit,
    /// Money entering the wallet.
    #[sea_orm(string_value = "credit")]
    Credit,
}

// Database enums share variant names with the ledger enums they mirror.
macro_rules! mirror_enum {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        impl From<$name> for ledger::$name {
            fn from(value: $name) -> Self {
                match value {
                    $($name::$variant => Self::$variant,)+
                }
            }
        }

        impl From<ledger::$name> for $name {
            fn from(value: ledger::$name) -> Self {
                match value {
                    $(ledger::$name::$variant => Self::$variant,)+
                }
            }
        }
    };
}

mirror_enum!(WalletType { Savings, Fixed, Miscellaneous });
mirror_enum!(TransactionType { Transfer, Payment, Withdrawal, Deposit });
mirror_enum!(TransactionStatus { Pending, Completed, Failed });
mirror_enum!(EntryType { Debit, Credit });
