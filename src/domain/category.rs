//! Category domain types.
//!
//! Categories are the provider-independent classification derived from
//! folders. They are unique within a namespace.

use serde::{Deserialize, Serialize};

use super::{CategoryId, NamespaceId};

/// A canonical classification scoped to a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub namespace_id: NamespaceId,
    /// Canonical name, unique per namespace when set.
    pub name: Option<String>,
    /// Name shown to users, taken from the originating folder.
    pub display_name: String,
    pub kind: CategoryKind,
}

impl Category {
    /// Key this category is unique on within its namespace.
    pub fn key(&self) -> CategoryKey {
        match &self.name {
            Some(name) => CategoryKey::Canonical(name.clone()),
            None => CategoryKey::Display(self.display_name.clone()),
        }
    }
}

/// Type tag carried by every category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Folder,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Folder => "folder",
        }
    }
}

/// Uniqueness key of a category within a namespace.
///
/// Categories with a canonical name are keyed on it. Categories without one
/// are keyed on their display name so unrelated plain folders stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CategoryKey {
    Canonical(String),
    Display(String),
}
