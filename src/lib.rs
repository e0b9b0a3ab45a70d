//! labelsweep - one-shot category/label reconciliation and message metadata
//! backfill for a mail store.
//!
//! The engine partitions accounts across workers, derives canonical
//! categories and labels from provider folder state, and recomputes each
//! message's flags from its provider UID records in bounded transactions.

pub mod config;
pub mod domain;
pub mod migration;
pub mod storage;
