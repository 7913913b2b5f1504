//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `TransactionId` where a `WalletId` is expected.
//! All IDs are totally ordered so that multi-row locks can be requested in a fixed order.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new random ID using UUID v7 (time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Creates an ID from an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user (wallet owner).");
typed_id!(WalletId, "Unique identifier for a wallet (balance-holding account).");
typed_id!(TransactionId, "Unique identifier for a transfer transaction.");
typed_id!(LedgerEntryId, "Unique identifier for a ledger entry.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(WalletId::new(), WalletId::new());
    }

    #[test]
    fn test_id_roundtrip_through_string() {
        let id = TransactionId::new();
        let parsed = TransactionId::from_str(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
        assert!(TransactionId::from_str("not-a-uuid").is_err());
    }

    #[test]
    fn test_wallet_ids_order_by_uuid() {
        let low = WalletId::from_uuid(Uuid::from_u128(1));
        let high = WalletId::from_uuid(Uuid::from_u128(2));
        assert!(low < high);
        assert_eq!(low.max(high), high);
    }

    #[test]
    fn test_id_serializes_transparently() {
        let uuid = Uuid::from_u128(42);
        let json = serde_json::to_string(&WalletId::from_uuid(uuid)).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }
}
