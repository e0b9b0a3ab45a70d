//! Mail store access.
//!
//! This module provides the storage layer for the backfill engine:
//!
//! - An async-safe SQLite handle run via `tokio::task::spawn_blocking`
//! - Schema setup for the tables the engine reads and writes
//! - Query functions composable inside one transaction

mod database;
pub mod queries;
pub(crate) mod schema;

pub use database::{Database, DatabaseError, Result};
