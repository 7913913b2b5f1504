//! PostgreSQL persistence for the Paycore ledger.
//!
//! This crate provides:
//! - `SeaORM` entity definitions
//! - Database migrations
//! - Repositories for users, wallets and transactions
//! - [`SeaOrmLedgerStore`], the `LedgerStore` implementation used in production

pub mod entities;
pub mod error;
pub mod migration;
pub mod repositories;

mod convert;

pub use error::{classify_db_err, classify_sqlstate};
pub use repositories::{
    SeaOrmLedgerStore, SeaOrmUnit, TransactionRepository, UserRepository, WalletError,
    WalletRepository,
};

use std::time::Duration;

use paycore_shared::config::DatabaseConfig;
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Establishes a connection pool to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(config: &DatabaseConfig) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .sqlx_logging(false);

    Database::connect(options).await
}
