//! Account domain types.
//!
//! An account is a connected mailbox tagged with the provider that syncs it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{AccountId, DeviceId, NamespaceId};

/// A connected mail account as recorded by the sync system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier for this account.
    pub id: AccountId,
    /// Namespace that scopes this account's messages and categories.
    pub namespace_id: NamespaceId,
    /// Email address for this account.
    pub email: String,
    /// Provider discriminator.
    pub provider: ProviderType,
    /// Device identities, present for Exchange ActiveSync accounts.
    pub devices: Option<DevicePair>,
}

/// Provider discriminator stored on every account row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Generic IMAP provider.
    Imap,
    /// Gmail over IMAP with native labels.
    Gmail,
    /// Exchange ActiveSync.
    Eas,
}

impl ProviderType {
    /// Returns the discriminator string used in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imap => "imap",
            Self::Gmail => "gmail",
            Self::Eas => "eas",
        }
    }

    /// Returns the kind of UID record this provider's sync leaves behind.
    pub fn uid_kind(&self) -> UidKind {
        match self {
            Self::Imap | Self::Gmail => UidKind::Imap,
            Self::Eas => UidKind::Eas,
        }
    }
}

impl fmt::Display for ProviderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A provider discriminator the engine does not know how to migrate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown provider discriminator: {0}")]
pub struct UnknownProvider(pub String);

impl FromStr for ProviderType {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "imap" => Ok(Self::Imap),
            "gmail" => Ok(Self::Gmail),
            "eas" => Ok(Self::Eas),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

/// Kind of provider UID record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UidKind {
    /// IMAP UID, used by both generic IMAP and Gmail accounts.
    Imap,
    /// ActiveSync server id, scoped to a device.
    Eas,
}

impl UidKind {
    /// Returns the kind string used in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Imap => "imap",
            Self::Eas => "eas",
        }
    }
}

/// The two device identities an ActiveSync account syncs through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePair {
    /// Device used for the primary sync.
    pub primary: DeviceId,
    /// Device used for the secondary sync.
    pub secondary: DeviceId,
}

impl DevicePair {
    /// Devices in the order they must be categorized.
    pub fn in_order(&self) -> [DeviceId; 2] {
        [self.primary, self.secondary]
    }
}
