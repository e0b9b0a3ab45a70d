//! Folder domain types.

use serde::{Deserialize, Serialize};

use super::{AccountId, CategoryId, CategoryKey, FolderId};

/// Canonical folder roles that become categories on label-native providers.
/// Every other Gmail folder is represented only as a label.
pub const LABEL_NATIVE_CATEGORY_ROLES: [&str; 3] = ["all", "spam", "trash"];

/// A provider-native mailbox container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub id: FolderId,
    pub account_id: AccountId,
    /// Provider display name, e.g. `[Gmail]/All Mail`.
    pub name: String,
    /// Canonical role such as `inbox` or `trash`.
    pub canonical_name: Option<String>,
    /// Category this folder is linked to, once reconciled.
    pub category_id: Option<CategoryId>,
}

impl Folder {
    /// Key of the category this folder maps to.
    pub fn category_key(&self) -> CategoryKey {
        match &self.canonical_name {
            Some(canonical) => CategoryKey::Canonical(canonical.clone()),
            None => CategoryKey::Display(self.name.clone()),
        }
    }

    /// Whether a label-native provider keeps this folder as a category.
    pub fn is_label_native_category(&self) -> bool {
        self.canonical_name
            .as_deref()
            .is_some_and(|role| LABEL_NATIVE_CATEGORY_ROLES.contains(&role))
    }
}
