//! Migration error taxonomy.

use std::fmt;

use thiserror::Error;

use crate::domain::{AccountId, UnknownProvider};
use crate::storage::DatabaseError;

/// The phase of an account's migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reconcile,
    Backfill,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reconcile => f.write_str("reconcile"),
            Self::Backfill => f.write_str("backfill"),
        }
    }
}

/// Errors that abort a migration.
///
/// Per-message lookup misses are not represented here; the backfill recovers
/// from those locally.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("account {0} not found or has no namespace")]
    AccountNotFound(AccountId),

    #[error("unknown provider discriminator: {0}")]
    UnknownProvider(String),

    #[error("ActiveSync account {0} has no device pair")]
    MissingDevices(AccountId),

    #[error("Store error: {0}")]
    Store(#[from] DatabaseError),

    #[error("account {account_id} failed during {phase}: {source}")]
    Account {
        account_id: AccountId,
        phase: Phase,
        #[source]
        source: Box<MigrationError>,
    },
}

impl MigrationError {
    /// Wraps an error with the account and phase it aborted.
    pub fn in_account(self, account_id: AccountId, phase: Phase) -> Self {
        Self::Account {
            account_id,
            phase,
            source: Box::new(self),
        }
    }
}

impl From<rusqlite::Error> for MigrationError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::FromSqlConversionFailure(_, _, source) = &err {
            if let Some(unknown) = source.downcast_ref::<UnknownProvider>() {
                return Self::UnknownProvider(unknown.0.clone());
            }
        }
        Self::Store(DatabaseError::Sqlite(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::types::Type;

    #[test]
    fn unknown_provider_conversion_is_classified() {
        let err = rusqlite::Error::FromSqlConversionFailure(
            3,
            Type::Text,
            Box::new(UnknownProvider("pop3".to_string())),
        );
        assert!(matches!(
            MigrationError::from(err),
            MigrationError::UnknownProvider(p) if p == "pop3"
        ));
    }

    #[test]
    fn other_sqlite_errors_are_store_errors() {
        let err = rusqlite::Error::QueryReturnedNoRows;
        assert!(matches!(
            MigrationError::from(err),
            MigrationError::Store(DatabaseError::Sqlite(_))
        ));
    }

    #[test]
    fn account_wrapper_names_phase() {
        let err = MigrationError::MissingDevices(AccountId(4)).in_account(AccountId(4), Phase::Reconcile);
        assert_eq!(
            err.to_string(),
            "account 4 failed during reconcile: ActiveSync account 4 has no device pair"
        );
    }
}
