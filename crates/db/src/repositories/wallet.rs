//! Wallet repository for opening and reading wallets.
//!
//! Balances are only ever changed by the ledger store inside a transfer; this
//! repository sets the opening balance and nothing else.

use paycore_core::ledger::{StoreError, Wallet, WalletType};
use paycore_shared::types::{Currency, Money, MoneyError, UserId, WalletId};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set, SqlErr,
};
use thiserror::Error;

use crate::entities::sea_orm_active_enums::WalletType as DbWalletType;
use crate::entities::{users, wallets};
use crate::error::classify_db_err;

/// Errors from wallet management.
#[derive(Debug, Error)]
pub enum WalletError {
    /// The user already owns a wallet of this type.
    #[error("User {user_id} already has a {wallet_type:?} wallet")]
    Duplicate {
        /// Owner.
        user_id: UserId,
        /// Requested wallet type.
        wallet_type: WalletType,
    },

    /// Opening balance below zero.
    #[error("Opening balance cannot be negative: {0}")]
    NegativeBalance(Decimal),

    /// Opening balance finer than the currency's minor unit.
    #[error(transparent)]
    Precision(#[from] MoneyError),

    /// Owner does not exist.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// Stored row could not be read back.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Wallet repository.
#[derive(Debug, Clone)]
pub struct WalletRepository {
    db: DatabaseConnection,
}

impl WalletRepository {
    /// Creates a new wallet repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Opens a wallet for a user with an opening balance.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The opening balance is negative
    /// - The opening balance has more decimal places than the currency allows
    /// - The user does not exist
    /// - The user already has a wallet of this type
    pub async fn open_wallet(
        &self,
        user_id: UserId,
        wallet_type: WalletType,
        currency: Currency,
        opening_balance: Decimal,
    ) -> Result<Wallet, WalletError> {
        if opening_balance < Decimal::ZERO {
            return Err(WalletError::NegativeBalance(opening_balance));
        }
        Money::new(opening_balance, currency).check_scale()?;

        if users::Entity::find_by_id(user_id.into_inner())
            .one(&self.db)
            .await?
            .is_none()
        {
            return Err(WalletError::UserNotFound(user_id));
        }

        let existing = wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id.into_inner()))
            .filter(wallets::Column::WalletType.eq(DbWalletType::from(wallet_type)))
            .one(&self.db)
            .await?;
        if existing.is_some() {
            return Err(WalletError::Duplicate {
                user_id,
                wallet_type,
            });
        }

        let now = chrono::Utc::now().into();
        let wallet = wallets::ActiveModel {
            id: Set(WalletId::new().into_inner()),
            user_id: Set(user_id.into_inner()),
            wallet_type: Set(wallet_type.into()),
            currency: Set(currency.code().to_string()),
            balance: Set(opening_balance),
            created_at: Set(now),
            updated_at: Set(now),
        };

        // A concurrent open can still win between the check and the insert.
        let model = wallet.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => WalletError::Duplicate {
                user_id,
                wallet_type,
            },
            _ => WalletError::Database(e),
        })?;

        Ok(Wallet::try_from(model)?)
    }

    /// Finds a wallet by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: WalletId) -> Result<Option<Wallet>, StoreError> {
        wallets::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(classify_db_err)?
            .map(Wallet::try_from)
            .transpose()
    }

    /// Lists the wallets of a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_user(&self, user_id: UserId) -> Result<Vec<Wallet>, StoreError> {
        wallets::Entity::find()
            .filter(wallets::Column::UserId.eq(user_id.into_inner()))
            .order_by_asc(wallets::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(classify_db_err)?
            .into_iter()
            .map(Wallet::try_from)
            .collect()
    }
}
