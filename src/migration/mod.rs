//! The migration engine.
//!
//! A worker selects its accounts with a [`Partition`], then for each account
//! runs the provider's [`Reconciler`] in one transaction and the
//! [`Backfiller`] one page per transaction. [`MigrationService`] drives both.

mod backfill;
mod driver;
mod error;
mod events;
mod partition;
mod reconcile;

#[cfg(test)]
mod test_support;

pub use backfill::{backfill_page, BackfillReport, Backfiller, PageOutcome, PAGE_SIZE};
pub use driver::{AccountReport, MigrationService, RunReport};
pub use error::{MigrationError, Phase};
pub use events::{EventBuffer, EventPublisher, MigrationEvent, UidMarker};
pub use partition::{Partition, PartitionError};
pub use reconcile::{
    DeviceCategorizer, DevicePairedReconciler, GenericReconciler, LabelNativeReconciler,
    LoggingDeviceCategorizer, ReconcileCategories, ReconcileReport, Reconciler,
};
