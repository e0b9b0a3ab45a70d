//! Category and label reconciliation.
//!
//! Derives the canonical category model (and, for label-native providers,
//! account labels) from the folders and UID records the sync system left
//! behind. Every strategy is idempotent: a second run over the same store
//! finds everything it would create and writes nothing.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use rusqlite::Connection;
use serde::Serialize;

use crate::domain::gmail_labels::{self, RawLabel};
use crate::domain::{Account, DeviceId, DevicePair, Folder, LabelId, LabelKey, ProviderType, UidKind};
use crate::storage::queries::{categories, folders, labels, uids};

use super::events::{EventBuffer, MigrationEvent, UidMarker};
use super::MigrationError;

/// What one reconcile run changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub categories_created: usize,
    pub folders_linked: usize,
    pub labels_created: usize,
    pub uid_labels_attached: usize,
    pub uids_marked: usize,
    pub devices_categorized: usize,
}

impl ReconcileReport {
    /// Whether the run wrote anything.
    pub fn is_noop(&self) -> bool {
        *self == Self::default()
    }
}

/// A reconciliation strategy for one provider family.
///
/// Implementations run inside the caller's transaction and must not commit.
pub trait ReconcileCategories {
    fn reconcile_categories(
        &self,
        conn: &Connection,
        account: &Account,
        events: &mut EventBuffer,
    ) -> Result<ReconcileReport, MigrationError>;
}

/// Category reconciliation for one ActiveSync device, owned by the
/// ActiveSync subsystem.
pub trait DeviceCategorizer: Send + Sync {
    fn reconcile_device_categories(
        &self,
        conn: &Connection,
        account: &Account,
        device: DeviceId,
    ) -> Result<(), MigrationError>;
}

/// A [`DeviceCategorizer`] that only records that it was asked.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingDeviceCategorizer;

impl DeviceCategorizer for LoggingDeviceCategorizer {
    fn reconcile_device_categories(
        &self,
        _conn: &Connection,
        account: &Account,
        device: DeviceId,
    ) -> Result<(), MigrationError> {
        tracing::info!(account_id = %account.id, device_id = %device, "Device categorization requested");
        Ok(())
    }
}

/// Links a folder to the category keyed on its canonical name, creating the
/// category on first use.
fn link_folder(
    conn: &Connection,
    account: &Account,
    folder: &Folder,
    report: &mut ReconcileReport,
    events: &mut EventBuffer,
) -> Result<(), MigrationError> {
    let (category, created) = categories::find_or_create(
        conn,
        account.namespace_id,
        &folder.category_key(),
        &folder.name,
    )?;

    if created {
        report.categories_created += 1;
        events.push(MigrationEvent::CategoryCreated {
            account_id: account.id,
            category_id: category.id,
        });
    }

    if folder.category_id != Some(category.id) {
        folders::set_category(conn, folder.id, category.id)?;
        report.folders_linked += 1;
        events.push(MigrationEvent::FolderLinked {
            account_id: account.id,
            folder_id: folder.id,
            category_id: category.id,
        });
    }

    Ok(())
}

/// Every folder becomes a category.
#[derive(Debug, Default, Clone, Copy)]
pub struct GenericReconciler;

impl ReconcileCategories for GenericReconciler {
    fn reconcile_categories(
        &self,
        conn: &Connection,
        account: &Account,
        events: &mut EventBuffer,
    ) -> Result<ReconcileReport, MigrationError> {
        let mut report = ReconcileReport::default();
        for folder in folders::get_by_account(conn, account.id)? {
            link_folder(conn, account, &folder, &mut report, events)?;
        }
        Ok(report)
    }
}

/// Gmail: a few system folders become categories, every folder becomes a
/// label, and each UID's raw labels are materialized.
#[derive(Debug, Default, Clone, Copy)]
pub struct LabelNativeReconciler;

impl LabelNativeReconciler {
    fn label_id(
        conn: &Connection,
        account: &Account,
        key: &LabelKey,
        known: &mut HashMap<LabelKey, LabelId>,
        report: &mut ReconcileReport,
        events: &mut EventBuffer,
    ) -> Result<LabelId, MigrationError> {
        if let Some(id) = known.get(key) {
            return Ok(*id);
        }

        let (label, created) = labels::find_or_create(conn, account.id, key)?;
        if created {
            report.labels_created += 1;
            events.push(MigrationEvent::LabelCreated {
                account_id: account.id,
                label_id: label.id,
            });
        }
        known.insert(key.clone(), label.id);
        Ok(label.id)
    }
}

impl ReconcileCategories for LabelNativeReconciler {
    fn reconcile_categories(
        &self,
        conn: &Connection,
        account: &Account,
        events: &mut EventBuffer,
    ) -> Result<ReconcileReport, MigrationError> {
        let mut report = ReconcileReport::default();

        let mut known: HashMap<LabelKey, LabelId> = labels::get_by_account(conn, account.id)?
            .into_iter()
            .map(|label| (label.key(), label.id))
            .collect();

        for folder in folders::get_by_account(conn, account.id)? {
            if folder.is_label_native_category() {
                link_folder(conn, account, &folder, &mut report, events)?;
            }
            let key = LabelKey {
                name: folder.name.clone(),
                canonical_name: folder.canonical_name.clone(),
            };
            Self::label_id(conn, account, &key, &mut known, &mut report, events)?;
        }

        for uid in uids::get_by_account(conn, account.id, UidKind::Imap)? {
            let mut keys = BTreeSet::new();

            for raw in &uid.raw_labels {
                match gmail_labels::classify(raw) {
                    RawLabel::Draft => {
                        if uids::mark_draft(conn, uid.id)? {
                            report.uids_marked += 1;
                            events.push(MigrationEvent::UidMarked {
                                account_id: account.id,
                                uid_id: uid.id,
                                marker: UidMarker::Draft,
                            });
                        }
                    }
                    RawLabel::Starred => {
                        if uids::mark_starred(conn, uid.id)? {
                            report.uids_marked += 1;
                            events.push(MigrationEvent::UidMarked {
                                account_id: account.id,
                                uid_id: uid.id,
                                marker: UidMarker::Starred,
                            });
                        }
                    }
                    RawLabel::Label(key) => {
                        keys.insert(key);
                    }
                }
            }

            for key in &keys {
                let label_id = Self::label_id(conn, account, key, &mut known, &mut report, events)?;
                if labels::attach_to_uid(conn, uid.id, label_id)? {
                    report.uid_labels_attached += 1;
                    events.push(MigrationEvent::LabelUpdated {
                        account_id: account.id,
                        label_id,
                        uid_id: uid.id,
                    });
                }
            }
        }

        Ok(report)
    }
}

/// ActiveSync: hands each of the account's two devices to the device
/// categorizer, primary first.
#[derive(Clone)]
pub struct DevicePairedReconciler {
    categorizer: Arc<dyn DeviceCategorizer>,
}

impl DevicePairedReconciler {
    pub fn new(categorizer: Arc<dyn DeviceCategorizer>) -> Self {
        Self { categorizer }
    }
}

impl std::fmt::Debug for DevicePairedReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevicePairedReconciler").finish_non_exhaustive()
    }
}

impl ReconcileCategories for DevicePairedReconciler {
    fn reconcile_categories(
        &self,
        conn: &Connection,
        account: &Account,
        events: &mut EventBuffer,
    ) -> Result<ReconcileReport, MigrationError> {
        let pair: DevicePair = account
            .devices
            .ok_or(MigrationError::MissingDevices(account.id))?;

        let mut report = ReconcileReport::default();
        for device in pair.in_order() {
            self.categorizer
                .reconcile_device_categories(conn, account, device)?;
            report.devices_categorized += 1;
            events.push(MigrationEvent::DeviceCategorized {
                account_id: account.id,
                device_id: device,
            });
        }
        Ok(report)
    }
}

/// The reconciliation strategy for an account, chosen by provider.
#[derive(Debug, Clone)]
pub enum Reconciler {
    Generic(GenericReconciler),
    LabelNative(LabelNativeReconciler),
    DevicePaired(DevicePairedReconciler),
}

impl Reconciler {
    /// Picks the strategy for `provider`.
    pub fn for_provider(provider: ProviderType, devices: Arc<dyn DeviceCategorizer>) -> Self {
        match provider {
            ProviderType::Imap => Self::Generic(GenericReconciler),
            ProviderType::Gmail => Self::LabelNative(LabelNativeReconciler),
            ProviderType::Eas => Self::DevicePaired(DevicePairedReconciler::new(devices)),
        }
    }
}

impl ReconcileCategories for Reconciler {
    fn reconcile_categories(
        &self,
        conn: &Connection,
        account: &Account,
        events: &mut EventBuffer,
    ) -> Result<ReconcileReport, MigrationError> {
        match self {
            Self::Generic(r) => r.reconcile_categories(conn, account, events),
            Self::LabelNative(r) => r.reconcile_categories(conn, account, events),
            Self::DevicePaired(r) => r.reconcile_categories(conn, account, events),
        }
    }
}
