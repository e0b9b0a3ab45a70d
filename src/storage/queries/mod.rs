//! Database query modules.
//!
//! Each module provides plain functions over a `rusqlite::Connection`, so the
//! migration engine can compose them inside a single transaction.

pub mod accounts;
pub mod categories;
pub mod folders;
pub mod labels;
pub mod messages;
pub mod uids;
