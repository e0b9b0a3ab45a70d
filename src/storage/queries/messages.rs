//! Message queries.
//!
//! Pages are addressed by offset over the namespace's messages in ascending
//! ID order. Only the columns the flag backfill needs are loaded.

use rusqlite::{params, Connection, OptionalExtension, Result};

use crate::domain::{Message, MessageFlags, MessageId, NamespaceId};

/// Subquery selecting the IDs of one page; binds ?1 namespace, ?2 limit, ?3 offset.
///
/// The page rows and the per-page UID lookup are both keyed on it.
pub(crate) const PAGE_IDS: &str =
    "SELECT id FROM messages WHERE namespace_id = ?1 ORDER BY id LIMIT ?2 OFFSET ?3";

/// Inserts a message.
pub fn insert(conn: &Connection, message: &Message) -> Result<()> {
    conn.execute(
        "INSERT INTO messages (id, namespace_id, is_read, is_starred, is_draft)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            message.id.0,
            message.namespace_id.0,
            message.flags.is_read,
            message.flags.is_starred,
            message.flags.is_draft,
        ],
    )?;
    Ok(())
}

/// Loads one page of a namespace's messages.
pub fn page_for_namespace(
    conn: &Connection,
    namespace_id: NamespaceId,
    offset: u64,
    limit: u64,
) -> Result<Vec<Message>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, namespace_id, is_read, is_starred, is_draft
         FROM messages WHERE id IN ({PAGE_IDS}) ORDER BY id"
    ))?;
    let rows = stmt.query_map(params![namespace_id.0, limit, offset], |row| {
        Ok(Message {
            id: MessageId(row.get(0)?),
            namespace_id: NamespaceId(row.get(1)?),
            flags: MessageFlags {
                is_read: row.get(2)?,
                is_starred: row.get(3)?,
                is_draft: row.get(4)?,
            },
        })
    })?;
    rows.collect()
}

/// Overwrites a message's derived flags.
///
/// Category associations are left alone.
pub fn set_flags(conn: &Connection, id: MessageId, flags: MessageFlags) -> Result<()> {
    conn.execute(
        "UPDATE messages SET is_read = ?1, is_starred = ?2, is_draft = ?3 WHERE id = ?4",
        params![flags.is_read, flags.is_starred, flags.is_draft, id.0],
    )?;
    Ok(())
}

/// Gets a message's current flags.
pub fn get_flags(conn: &Connection, id: MessageId) -> Result<Option<MessageFlags>> {
    conn.query_row(
        "SELECT is_read, is_starred, is_draft FROM messages WHERE id = ?1",
        params![id.0],
        |row| {
            Ok(MessageFlags {
                is_read: row.get(0)?,
                is_starred: row.get(1)?,
                is_draft: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Counts messages in a namespace.
pub fn count_by_namespace(conn: &Connection, namespace_id: NamespaceId) -> Result<u64> {
    conn.query_row(
        "SELECT COUNT(*) FROM messages WHERE namespace_id = ?1",
        params![namespace_id.0],
        |row| row.get(0),
    )
}
