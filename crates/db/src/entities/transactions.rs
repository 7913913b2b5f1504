//! `SeaORM` Entity for transactions table.
//!
//! A transaction references two wallets, so there is no single `Related`
//! impl towards `wallets`; join through `Relation::SenderWallet` or
//! `Relation::ReceiverWallet` explicitly.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::{TransactionStatus, TransactionType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub sender_wallet_id: Uuid,
    pub receiver_wallet_id: Uuid,
    #[sea_orm(column_type = "Decimal(Some((28, 8)))")]
    pub amount: Decimal,
    pub currency: String,
    pub transaction_type: TransactionType,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub status: TransactionStatus,
    #[sea_orm(unique)]
    pub idempotency_key: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::SenderWalletId",
        to = "super::wallets::Column::Id"
    )]
    SenderWallet,
    #[sea_orm(
        belongs_to = "super::wallets::Entity",
        from = "Column::ReceiverWalletId",
        to = "super::wallets::Column::Id"
    )]
    ReceiverWallet,
    #[sea_orm(has_many = "super::ledger_entries::Entity")]
    LedgerEntries,
}

impl Related<super::ledger_entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LedgerEntries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
