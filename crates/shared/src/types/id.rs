//! Typed IDs for type-safe entity references.
//!
//! Using typed IDs prevents accidentally passing a `PairingId` where an `OrderId` is expected.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
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

typed_id!(WalletTransactionId, "Unique identifier for a ledger transaction row.");
typed_id!(PairingId, "Correlates the two legs of a transfer or direct payment.");
typed_id!(OrderId, "Unique identifier for a marketplace order.");
typed_id!(NotificationId, "Unique identifier for a persisted notification.");

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_typed_id_round_trip() {
        let uuid = Uuid::new_v4();
        let id = WalletTransactionId::from_uuid(uuid);
        assert_eq!(id.into_inner(), uuid);
        assert_eq!(WalletTransactionId::from_str(&id.to_string()).unwrap(), id);
    }

    #[test]
    fn test_typed_ids_are_unique() {
        assert_ne!(PairingId::new(), PairingId::new());
    }

    #[test]
    fn test_typed_id_rejects_garbage() {
        assert!(OrderId::from_str("not-a-uuid").is_err());
    }
}
