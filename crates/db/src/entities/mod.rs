//! `SeaORM` entities for the ledger schema.

pub mod prelude;

pub mod ledger_entries;
pub mod sea_orm_active_enums;
pub mod transactions;
pub mod users;
pub mod wallets;
