//! Label domain types.
//!
//! Labels are account-wide tags, independent of folder structure. A label is
//! identified by its (name, canonical name) pair.

use serde::{Deserialize, Serialize};

use super::{AccountId, LabelId};

/// An account label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Unique identifier for this label.
    pub id: LabelId,
    /// Account this label belongs to.
    pub account_id: AccountId,
    /// Provider display name.
    pub name: String,
    /// Canonical role, if the provider marks one.
    pub canonical_name: Option<String>,
}

impl Label {
    /// Returns the uniqueness key of this label.
    pub fn key(&self) -> LabelKey {
        LabelKey {
            name: self.name.clone(),
            canonical_name: self.canonical_name.clone(),
        }
    }
}

/// The (name, canonical name) pair a label is unique on within an account.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LabelKey {
    pub name: String,
    pub canonical_name: Option<String>,
}

impl LabelKey {
    /// A key for a user label with no canonical role.
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            canonical_name: None,
        }
    }

    /// A key whose canonical name equals its name.
    pub fn canonical(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            canonical_name: Some(name.clone()),
            name,
        }
    }
}

/// Reserved Gmail label strings.
pub mod gmail_labels {
    use super::LabelKey;

    pub const DRAFT: &str = "\\Draft";
    pub const STARRED: &str = "\\Starred";
    pub const INBOX: &str = "\\Inbox";
    pub const IMPORTANT: &str = "\\Important";
    pub const SENT: &str = "\\Sent";

    /// What a raw Gmail label string means for a UID.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum RawLabel {
        /// Marks the UID as a draft; no label is created.
        Draft,
        /// Marks the UID as starred; no label is created.
        Starred,
        /// An actual label to attach.
        Label(LabelKey),
    }

    /// Classifies one raw label string from a UID's label list.
    pub fn classify(raw: &str) -> RawLabel {
        match raw {
            DRAFT => RawLabel::Draft,
            STARRED => RawLabel::Starred,
            INBOX => RawLabel::Label(LabelKey::canonical("inbox")),
            IMPORTANT => RawLabel::Label(LabelKey::canonical("important")),
            SENT => RawLabel::Label(LabelKey::canonical("sent")),
            other => RawLabel::Label(LabelKey::plain(other)),
        }
    }
}
