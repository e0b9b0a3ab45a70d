//! Per-worker migration loop.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::broadcast;

use crate::domain::{Account, AccountId};
use crate::storage::queries::accounts;
use crate::storage::Database;

use super::backfill::{BackfillReport, Backfiller};
use super::events::{EventBuffer, EventPublisher, MigrationEvent};
use super::reconcile::{DeviceCategorizer, ReconcileCategories, ReconcileReport, Reconciler};
use super::{MigrationError, Partition, Phase};

/// Outcome of migrating one account.
#[derive(Debug, Clone, Serialize)]
pub struct AccountReport {
    pub account_id: AccountId,
    pub reconcile: ReconcileReport,
    pub backfill: BackfillReport,
    pub duration_ms: u64,
}

/// Outcome of a worker run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub partition: Partition,
    pub accounts: Vec<AccountReport>,
    pub duration_ms: u64,
}

/// Drives reconcile then backfill over a worker's accounts.
#[derive(Clone)]
pub struct MigrationService {
    db: Database,
    publisher: EventPublisher,
    devices: Arc<dyn DeviceCategorizer>,
}

impl MigrationService {
    pub fn new(db: Database, devices: Arc<dyn DeviceCategorizer>) -> Self {
        Self {
            db,
            publisher: EventPublisher::default(),
            devices,
        }
    }

    /// Subscribes to migration events.
    pub fn subscribe(&self) -> broadcast::Receiver<MigrationEvent> {
        self.publisher.subscribe()
    }

    /// Every account ID in the store, ascending.
    pub async fn account_ids(&self) -> Result<Vec<AccountId>, MigrationError> {
        Ok(self.db.with_conn(|conn| Ok(accounts::list_ids(conn)?)).await?)
    }

    /// Migrates every account `partition` owns, in ascending ID order.
    ///
    /// Stops at the first failing account.
    pub async fn run(&self, partition: &Partition) -> Result<RunReport, MigrationError> {
        let started = Instant::now();
        let owned = partition.select(self.account_ids().await?);
        tracing::info!(%partition, accounts = owned.len(), "Starting migration");

        let mut reports = Vec::with_capacity(owned.len());
        for account_id in owned {
            reports.push(self.migrate_account(account_id).await?);
        }

        let report = RunReport {
            partition: *partition,
            accounts: reports,
            duration_ms: elapsed_ms(started),
        };
        tracing::info!(
            %partition,
            accounts = report.accounts.len(),
            duration_ms = report.duration_ms,
            "Migration finished"
        );
        Ok(report)
    }

    /// Reconciles then backfills one account.
    pub async fn migrate_account(&self, account_id: AccountId) -> Result<AccountReport, MigrationError> {
        let started = Instant::now();
        self.publisher
            .publish(MigrationEvent::AccountStarted { account_id });

        let result = self.migrate_phases(account_id).await;
        match result {
            Ok((reconcile, backfill)) => {
                self.publisher
                    .publish(MigrationEvent::AccountFinished { account_id });
                Ok(AccountReport {
                    account_id,
                    reconcile,
                    backfill,
                    duration_ms: elapsed_ms(started),
                })
            }
            Err(err) => {
                self.publisher.publish(MigrationEvent::AccountFailed {
                    account_id,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    async fn migrate_phases(
        &self,
        account_id: AccountId,
    ) -> Result<(ReconcileReport, BackfillReport), MigrationError> {
        let (account, reconcile) = self
            .reconcile(account_id)
            .await
            .map_err(|e| e.in_account(account_id, Phase::Reconcile))?;

        let backfill = Backfiller::new(self.db.clone(), self.publisher.clone())
            .run(&account)
            .await
            .map_err(|e| e.in_account(account_id, Phase::Backfill))?;

        Ok((reconcile, backfill))
    }

    /// Runs the provider's reconciler in one transaction and publishes its
    /// events once committed.
    async fn reconcile(
        &self,
        account_id: AccountId,
    ) -> Result<(Account, ReconcileReport), MigrationError> {
        let devices = self.devices.clone();
        let (account, report, events) = self
            .db
            .transaction(move |tx| -> Result<_, MigrationError> {
                let account = accounts::get_by_id(tx, account_id)?
                    .ok_or(MigrationError::AccountNotFound(account_id))?;
                let reconciler = Reconciler::for_provider(account.provider, devices);
                let mut events = EventBuffer::new();
                let report = reconciler.reconcile_categories(tx, &account, &mut events)?;
                Ok((account, report, events))
            })
            .await?;

        self.publisher.publish_all(events);
        tracing::debug!(%account_id, ?report, "Reconcile committed");
        Ok((account, report))
    }
}

impl std::fmt::Debug for MigrationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MigrationService")
            .field("db", &self.db)
            .finish_non_exhaustive()
    }
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}
