//! Category queries.
//!
//! Categories are created lazily through [`find_or_create`]. The lookup and
//! the insert are not atomic with respect to other connections; the unique
//! indexes on `categories` turn a lost race into a constraint error instead
//! of a duplicate row. The migration engine never races here because each
//! account is owned by exactly one worker.

use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::domain::{Category, CategoryId, CategoryKey, CategoryKind, NamespaceId};

const SELECT_COLUMNS: &str = "SELECT id, namespace_id, name, display_name FROM categories";

/// Finds the category with the given key in a namespace.
pub fn find(
    conn: &Connection,
    namespace_id: NamespaceId,
    key: &CategoryKey,
) -> Result<Option<Category>> {
    match key {
        CategoryKey::Canonical(name) => conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE namespace_id = ?1 AND name = ?2"),
                params![namespace_id.0, name],
                row_to_category,
            )
            .optional(),
        CategoryKey::Display(display_name) => conn
            .query_row(
                &format!(
                    "{SELECT_COLUMNS} WHERE namespace_id = ?1 AND name IS NULL AND display_name = ?2"
                ),
                params![namespace_id.0, display_name],
                row_to_category,
            )
            .optional(),
    }
}

/// Inserts a new folder-type category.
pub fn insert(
    conn: &Connection,
    namespace_id: NamespaceId,
    key: &CategoryKey,
    display_name: &str,
) -> Result<Category> {
    let name = match key {
        CategoryKey::Canonical(name) => Some(name.clone()),
        CategoryKey::Display(_) => None,
    };
    let kind = CategoryKind::Folder;

    conn.execute(
        "INSERT INTO categories (namespace_id, name, display_name, type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            namespace_id.0,
            name,
            display_name,
            kind.as_str(),
            Utc::now().to_rfc3339(),
        ],
    )?;

    Ok(Category {
        id: CategoryId(conn.last_insert_rowid()),
        namespace_id,
        name,
        display_name: display_name.to_string(),
        kind,
    })
}

/// Returns the category with `key`, creating it if absent.
///
/// The boolean is `true` when a new row was inserted. An existing category
/// keeps its display name.
pub fn find_or_create(
    conn: &Connection,
    namespace_id: NamespaceId,
    key: &CategoryKey,
    display_name: &str,
) -> Result<(Category, bool)> {
    if let Some(existing) = find(conn, namespace_id, key)? {
        return Ok((existing, false));
    }
    let created = insert(conn, namespace_id, key, display_name)?;
    Ok((created, true))
}

/// Gets all categories of a namespace, in ID order.
pub fn get_by_namespace(conn: &Connection, namespace_id: NamespaceId) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE namespace_id = ?1 ORDER BY id"
    ))?;
    let categories = stmt.query_map(params![namespace_id.0], row_to_category)?;
    categories.collect()
}

fn row_to_category(row: &Row<'_>) -> Result<Category> {
    Ok(Category {
        id: CategoryId(row.get(0)?),
        namespace_id: NamespaceId(row.get(1)?),
        name: row.get(2)?,
        display_name: row.get(3)?,
        // Only folder categories exist today.
        kind: CategoryKind::Folder,
    })
}
