//! Folder queries.

use std::collections::HashMap;

use rusqlite::{params, Connection, Result};

use crate::domain::{AccountId, CategoryId, Folder, FolderId};

/// Inserts a folder.
pub fn insert(conn: &Connection, folder: &Folder) -> Result<()> {
    conn.execute(
        "INSERT INTO folders (id, account_id, name, canonical_name, category_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            folder.id.0,
            folder.account_id.0,
            folder.name,
            folder.canonical_name,
            folder.category_id.map(|c| c.0),
        ],
    )?;
    Ok(())
}

/// Gets all folders for an account, in ID order.
pub fn get_by_account(conn: &Connection, account_id: AccountId) -> Result<Vec<Folder>> {
    let mut stmt = conn.prepare(
        "SELECT id, account_id, name, canonical_name, category_id
         FROM folders WHERE account_id = ?1 ORDER BY id",
    )?;

    let folders = stmt.query_map(params![account_id.0], |row| {
        Ok(Folder {
            id: FolderId(row.get(0)?),
            account_id: AccountId(row.get(1)?),
            name: row.get(2)?,
            canonical_name: row.get(3)?,
            category_id: row.get::<_, Option<i64>>(4)?.map(CategoryId),
        })
    })?;

    folders.collect()
}

/// Links a folder to a category.
pub fn set_category(conn: &Connection, id: FolderId, category_id: CategoryId) -> Result<()> {
    conn.execute(
        "UPDATE folders SET category_id = ?1 WHERE id = ?2",
        params![category_id.0, id.0],
    )?;
    Ok(())
}

/// Maps every folder of an account to the category it is linked to.
pub fn category_map(
    conn: &Connection,
    account_id: AccountId,
) -> Result<HashMap<FolderId, Option<CategoryId>>> {
    let mut stmt = conn.prepare("SELECT id, category_id FROM folders WHERE account_id = ?1")?;

    let rows = stmt.query_map(params![account_id.0], |row| {
        Ok((
            FolderId(row.get(0)?),
            row.get::<_, Option<i64>>(1)?.map(CategoryId),
        ))
    })?;

    rows.collect()
}
