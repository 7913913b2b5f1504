//! Wallet records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use paycore_shared::types::{Currency, Money, UserId, WalletId};

use super::types::WalletType;

/// A single-currency balance holder owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    /// Unique identifier.
    pub id: WalletId,
    /// Owning user.
    pub user_id: UserId,
    /// Kind of wallet; unique per user.
    pub wallet_type: WalletType,
    /// Currency held; never changes.
    pub currency: Currency,
    /// Current balance; never negative.
    pub balance: Decimal,
    /// When the wallet was opened.
    pub created_at: DateTime<Utc>,
    /// When the balance last changed.
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    /// The balance with its currency.
    #[must_use]
    pub const fn money(&self) -> Money {
        Money::new(self.balance, self.currency)
    }

    /// Returns true if the balance covers `amount`.
    #[must_use]
    pub fn covers(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_covers_is_inclusive() {
        let now = Utc::now();
        let wallet = Wallet {
            id: WalletId::new(),
            user_id: UserId::new(),
            wallet_type: WalletType::Savings,
            currency: Currency::Ngn,
            balance: dec!(70.00),
            created_at: now,
            updated_at: now,
        };

        assert!(wallet.covers(dec!(70.00)));
        assert!(!wallet.covers(dec!(70.01)));
        assert_eq!(wallet.money(), Money::new(dec!(70.00), Currency::Ngn));
    }
}
