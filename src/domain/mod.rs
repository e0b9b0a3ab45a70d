//! Domain layer types for the backfill engine.
//!
//! Accounts, folders, categories, labels, messages and provider UID records
//! as they exist in the mail store, plus the pure flag derivation.

mod account;
mod category;
mod folder;
mod label;
mod message;
mod types;

pub use account::{Account, DevicePair, ProviderType, UidKind, UnknownProvider};
pub use category::{Category, CategoryKey, CategoryKind};
pub use folder::{Folder, LABEL_NATIVE_CATEGORY_ROLES};
pub use label::{gmail_labels, Label, LabelKey};
pub use message::{recompute_flags, Message, MessageFlags, RecomputeError, UidRecord};
pub use types::{
    AccountId, CategoryId, DeviceId, FolderId, LabelId, MessageId, NamespaceId, UidId,
};
