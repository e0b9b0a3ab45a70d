//! Message and provider UID domain types, plus derived metadata.
//!
//! A message's read/starred/draft flags are never authoritative on their
//! own: they are derived from the provider UID records the sync system
//! attached to the message. [`recompute_flags`] is that derivation.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{CategoryId, DeviceId, FolderId, MessageId, NamespaceId, UidId, UidKind};

/// Derived boolean flags stored on a message.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageFlags {
    pub is_read: bool,
    pub is_starred: bool,
    pub is_draft: bool,
}

/// A stored message, reduced to the fields the backfill touches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub namespace_id: NamespaceId,
    pub flags: MessageFlags,
}

/// Provider-specific link between a message and its folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UidRecord {
    pub id: UidId,
    pub message_id: MessageId,
    pub kind: UidKind,
    pub folder_id: FolderId,
    /// Device the record was synced through (ActiveSync only).
    pub device_id: Option<DeviceId>,
    pub is_seen: bool,
    pub is_starred: bool,
    pub is_draft: bool,
    /// Raw provider label strings (Gmail only).
    pub raw_labels: Vec<String>,
}

/// A message whose location cannot be resolved.
///
/// These are lookup misses: the message is skipped rather than failing the
/// batch it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecomputeError {
    #[error("message {0} has no provider UID records")]
    NoLocation(MessageId),

    #[error("message {message_id} references missing folder {folder_id}")]
    MissingFolder {
        message_id: MessageId,
        folder_id: FolderId,
    },
}

/// Derives a message's flags from its UID records.
///
/// `folders` holds every folder of the account; a UID pointing anywhere else
/// is a miss. Category associations are not derived here. The result depends
/// only on the inputs.
pub fn recompute_flags(
    message_id: MessageId,
    uids: &[UidRecord],
    folders: &HashMap<FolderId, Option<CategoryId>>,
) -> Result<MessageFlags, RecomputeError> {
    if uids.is_empty() {
        return Err(RecomputeError::NoLocation(message_id));
    }

    let mut flags = MessageFlags::default();

    for uid in uids {
        if !folders.contains_key(&uid.folder_id) {
            return Err(RecomputeError::MissingFolder {
                message_id,
                folder_id: uid.folder_id,
            });
        }

        flags.is_read |= uid.is_seen;
        flags.is_starred |= uid.is_starred;
        flags.is_draft |= uid.is_draft;
    }

    Ok(flags)
}
