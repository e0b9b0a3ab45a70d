//! Core identifier types for store entities.
//!
//! Every row in the mail store is keyed by an integer primary key. These
//! newtype wrappers keep the different key spaces from being mixed up.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! integer_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

integer_id!(
    /// Unique identifier for a connected mail account.
    AccountId
);

integer_id!(
    /// Identifier of the namespace owned by an account.
    NamespaceId
);

integer_id!(
    /// Identifier of a provider folder.
    FolderId
);

integer_id!(
    /// Identifier of a canonical category.
    CategoryId
);

integer_id!(
    /// Identifier of an account label.
    LabelId
);

integer_id!(
    /// Identifier of a stored message.
    MessageId
);

integer_id!(
    /// Identifier of a provider UID record.
    UidId
);

integer_id!(
    /// Identifier of an Exchange ActiveSync device.
    DeviceId
);
