//! Label database queries.
//!
//! Labels are unique per (account, name, canonical name), with a missing
//! canonical name equal to an empty one. Lookups coalesce the canonical name
//! the same way the unique index does.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::domain::{AccountId, Label, LabelId, LabelKey, UidId};

/// Inserts a new label for an account.
pub fn insert(conn: &Connection, account_id: AccountId, key: &LabelKey) -> Result<Label> {
    conn.execute(
        "INSERT INTO labels (account_id, name, canonical_name, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            account_id.0,
            key.name,
            key.canonical_name,
            Utc::now().to_rfc3339(),
        ],
    )?;

    Ok(Label {
        id: LabelId(conn.last_insert_rowid()),
        account_id,
        name: key.name.clone(),
        canonical_name: key.canonical_name.clone(),
    })
}

/// Finds a label by its key.
pub fn find_by_key(conn: &Connection, account_id: AccountId, key: &LabelKey) -> Result<Option<Label>> {
    conn.query_row(
        "SELECT id, account_id, name, canonical_name
         FROM labels
         WHERE account_id = ?1 AND name = ?2
           AND COALESCE(canonical_name, '') = COALESCE(?3, '')",
        params![account_id.0, key.name, key.canonical_name],
        row_to_label,
    )
    .optional()
}

/// Returns the label with `key`, creating it if absent.
///
/// The boolean is `true` when a new row was inserted. Lookup and insert are
/// two statements; callers must hold exclusive ownership of the account, the
/// unique index rejects a concurrent duplicate.
pub fn find_or_create(
    conn: &Connection,
    account_id: AccountId,
    key: &LabelKey,
) -> Result<(Label, bool)> {
    if let Some(existing) = find_by_key(conn, account_id, key)? {
        return Ok((existing, false));
    }
    Ok((insert(conn, account_id, key)?, true))
}

/// Gets all labels for an account.
pub fn get_by_account(conn: &Connection, account_id: AccountId) -> Result<Vec<Label>> {
    let mut stmt = conn.prepare(
        "SELECT id, account_id, name, canonical_name
         FROM labels WHERE account_id = ?1 ORDER BY id",
    )?;

    let labels = stmt.query_map(params![account_id.0], row_to_label)?;
    labels.collect()
}

/// Attaches a label to a UID record.
///
/// Returns `false` when the association already existed.
pub fn attach_to_uid(conn: &Connection, uid_id: UidId, label_id: LabelId) -> Result<bool> {
    let inserted = conn.execute(
        "INSERT OR IGNORE INTO uid_labels (uid_id, label_id) VALUES (?1, ?2)",
        params![uid_id.0, label_id.0],
    )?;
    Ok(inserted > 0)
}

/// Gets the labels attached to a UID record.
pub fn get_for_uid(conn: &Connection, uid_id: UidId) -> Result<Vec<LabelId>> {
    let mut stmt =
        conn.prepare("SELECT label_id FROM uid_labels WHERE uid_id = ?1 ORDER BY label_id")?;
    let ids = stmt.query_map(params![uid_id.0], |row| Ok(LabelId(row.get(0)?)))?;
    ids.collect()
}

/// Counts labels for an account.
pub fn count_by_account(conn: &Connection, account_id: AccountId) -> Result<u32> {
    conn.query_row(
        "SELECT COUNT(*) FROM labels WHERE account_id = ?1",
        params![account_id.0],
        |row| row.get(0),
    )
}

fn row_to_label(row: &Row<'_>) -> Result<Label> {
    Ok(Label {
        id: LabelId(row.get(0)?),
        account_id: AccountId(row.get(1)?),
        name: row.get(2)?,
        canonical_name: row.get(3)?,
    })
}
