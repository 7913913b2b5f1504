//! Entity re-exports.

pub use super::ledger_entries::Entity as LedgerEntries;
pub use super::transactions::Entity as Transactions;
pub use super::users::Entity as Users;
pub use super::wallets::Entity as Wallets;
