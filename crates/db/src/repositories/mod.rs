//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod ledger_store;
pub mod transaction;
pub mod user;
pub mod wallet;

pub use ledger_store::{SeaOrmLedgerStore, SeaOrmUnit};
pub use transaction::TransactionRepository;
pub use user::UserRepository;
pub use wallet::{WalletError, WalletRepository};
