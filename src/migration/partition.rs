//! Deterministic account partitioning across workers.
//!
//! Worker `k` of `N` owns every account whose id satisfies `id mod N == k`.
//! For a fixed `N` every account belongs to exactly one worker, which is
//! what lets several worker processes run against the same store without
//! ever touching the same account.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::AccountId;

/// Errors from invalid worker arguments.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartitionError {
    #[error("worker count must be positive, got {0}")]
    InvalidWorkerCount(i64),

    #[error("worker index {index} is outside 0..{count}")]
    IndexOutOfRange { index: i64, count: i64 },
}

/// The slice of the account space one worker owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Partition {
    /// A single worker owns every account.
    All,
    /// Worker `index` of `count`.
    Slot { index: i64, count: i64 },
}

impl Partition {
    /// Builds a partition from optional worker index and count arguments.
    ///
    /// Without a count a single worker owns every account and any index is
    /// ignored. With a count but no index, this is worker 0.
    pub fn from_args(index: Option<i64>, count: Option<i64>) -> Result<Self, PartitionError> {
        match count {
            None => Ok(Self::All),
            Some(count) => Self::slot(index.unwrap_or(0), count),
        }
    }

    /// Worker `index` of `count`.
    pub fn slot(index: i64, count: i64) -> Result<Self, PartitionError> {
        if count <= 0 {
            return Err(PartitionError::InvalidWorkerCount(count));
        }
        if !(0..count).contains(&index) {
            return Err(PartitionError::IndexOutOfRange { index, count });
        }
        Ok(Self::Slot { index, count })
    }

    /// Whether this worker owns the account.
    pub fn owns(&self, id: AccountId) -> bool {
        match *self {
            Self::All => true,
            Self::Slot { index, count } => id.0.rem_euclid(count) == index,
        }
    }

    /// Returns the owned subset of `ids`, preserving order.
    pub fn select<I>(&self, ids: I) -> Vec<AccountId>
    where
        I: IntoIterator<Item = AccountId>,
    {
        ids.into_iter().filter(|id| self.owns(*id)).collect()
    }
}

impl std::fmt::Display for Partition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all accounts"),
            Self::Slot { index, count } => write!(f, "worker {index} of {count}"),
        }
    }
}
