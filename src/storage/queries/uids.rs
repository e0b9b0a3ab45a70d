//! Provider UID record queries.
//!
//! Raw Gmail labels are stored as a JSON array of strings.

use std::collections::HashMap;

use rusqlite::types::Type;
use rusqlite::{params, Connection, Result, Row};

use crate::domain::{AccountId, DeviceId, FolderId, MessageId, NamespaceId, UidId, UidKind, UidRecord};

use super::messages::PAGE_IDS;

const SELECT_COLUMNS: &str = "SELECT id, message_id, kind, folder_id, device_id,
    is_seen, is_starred, is_draft, raw_labels FROM provider_uids";

/// Inserts a UID record for an account.
pub fn insert(conn: &Connection, account_id: AccountId, uid: &UidRecord) -> Result<()> {
    let raw_labels = serde_json::to_string(&uid.raw_labels)
        .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

    conn.execute(
        "INSERT INTO provider_uids
            (id, account_id, message_id, kind, folder_id, device_id,
             is_seen, is_starred, is_draft, raw_labels)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            uid.id.0,
            account_id.0,
            uid.message_id.0,
            uid.kind.as_str(),
            uid.folder_id.0,
            uid.device_id.map(|d| d.0),
            uid.is_seen,
            uid.is_starred,
            uid.is_draft,
            raw_labels,
        ],
    )?;
    Ok(())
}

/// Gets every UID record of one kind on an account, in ID order.
pub fn get_by_account(conn: &Connection, account_id: AccountId, kind: UidKind) -> Result<Vec<UidRecord>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE account_id = ?1 AND kind = ?2 ORDER BY id"
    ))?;
    let uids = stmt.query_map(params![account_id.0, kind.as_str()], row_to_uid)?;
    uids.collect()
}

/// Gets the UID records of one kind for a page of a namespace's messages,
/// grouped by message.
pub fn for_message_page(
    conn: &Connection,
    namespace_id: NamespaceId,
    kind: UidKind,
    offset: u64,
    limit: u64,
) -> Result<HashMap<MessageId, Vec<UidRecord>>> {
    let mut stmt = conn.prepare(&format!(
        "{SELECT_COLUMNS} WHERE message_id IN ({PAGE_IDS}) AND kind = ?4 ORDER BY id"
    ))?;
    let uids = stmt.query_map(
        params![namespace_id.0, limit, offset, kind.as_str()],
        row_to_uid,
    )?;

    let mut by_message: HashMap<MessageId, Vec<UidRecord>> = HashMap::new();
    for uid in uids {
        let uid = uid?;
        by_message.entry(uid.message_id).or_default().push(uid);
    }
    Ok(by_message)
}

/// Sets the draft marker on a UID. Returns `true` if it changed.
pub fn mark_draft(conn: &Connection, id: UidId) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE provider_uids SET is_draft = 1 WHERE id = ?1 AND is_draft = 0",
        params![id.0],
    )?;
    Ok(changed > 0)
}

/// Sets the starred marker on a UID. Returns `true` if it changed.
pub fn mark_starred(conn: &Connection, id: UidId) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE provider_uids SET is_starred = 1 WHERE id = ?1 AND is_starred = 0",
        params![id.0],
    )?;
    Ok(changed > 0)
}

fn row_to_uid(row: &Row<'_>) -> Result<UidRecord> {
    let kind = match row.get::<_, String>(2)?.as_str() {
        "imap" => UidKind::Imap,
        "eas" => UidKind::Eas,
        other => {
            return Err(rusqlite::Error::FromSqlConversionFailure(
                2,
                Type::Text,
                format!("unknown uid kind: {other}").into(),
            ))
        }
    };
    let raw_labels: String = row.get(8)?;
    let raw_labels = serde_json::from_str(&raw_labels)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

    Ok(UidRecord {
        id: UidId(row.get(0)?),
        message_id: MessageId(row.get(1)?),
        kind,
        folder_id: FolderId(row.get(3)?),
        device_id: row.get::<_, Option<i64>>(4)?.map(DeviceId),
        is_seen: row.get(5)?,
        is_starred: row.get(6)?,
        is_draft: row.get(7)?,
        raw_labels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Account, Message, MessageFlags, ProviderType};
    use crate::storage::queries::{accounts, messages};

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for migration in super::super::super::schema::all_migrations() {
            conn.execute_batch(migration).unwrap();
        }
        accounts::insert(
            &conn,
            &Account {
                id: AccountId(1),
                namespace_id: NamespaceId(1),
                email: "g@example.com".to_string(),
                provider: ProviderType::Gmail,
                devices: None,
            },
        )
        .unwrap();
        for id in 1..=3 {
            messages::insert(
                &conn,
                &Message {
                    id: MessageId(id),
                    namespace_id: NamespaceId(1),
                    flags: MessageFlags::default(),
                },
            )
            .unwrap();
        }
        conn
    }

    fn make_uid(id: i64, message: i64, kind: UidKind) -> UidRecord {
        UidRecord {
            id: UidId(id),
            message_id: MessageId(message),
            kind,
            folder_id: FolderId(1),
            device_id: None,
            is_seen: false,
            is_starred: false,
            is_draft: false,
            raw_labels: Vec::new(),
        }
    }

    #[test]
    fn raw_labels_roundtrip() {
        let conn = setup();
        let mut uid = make_uid(1, 1, UidKind::Imap);
        uid.raw_labels = vec!["\\Draft".to_string(), "Receipts".to_string()];

        insert(&conn, AccountId(1), &uid).unwrap();
        let fetched = get_by_account(&conn, AccountId(1), UidKind::Imap).unwrap();

        assert_eq!(fetched, vec![uid]);
    }

    #[test]
    fn get_by_account_filters_kind() {
        let conn = setup();
        insert(&conn, AccountId(1), &make_uid(1, 1, UidKind::Imap)).unwrap();
        insert(&conn, AccountId(1), &make_uid(2, 1, UidKind::Eas)).unwrap();

        let imap = get_by_account(&conn, AccountId(1), UidKind::Imap).unwrap();
        assert_eq!(imap.len(), 1);
        assert_eq!(imap[0].id, UidId(1));
    }

    #[test]
    fn page_uids_are_grouped_by_message() {
        let conn = setup();
        insert(&conn, AccountId(1), &make_uid(1, 1, UidKind::Imap)).unwrap();
        insert(&conn, AccountId(1), &make_uid(2, 1, UidKind::Imap)).unwrap();
        insert(&conn, AccountId(1), &make_uid(3, 2, UidKind::Imap)).unwrap();
        insert(&conn, AccountId(1), &make_uid(4, 3, UidKind::Imap)).unwrap();

        let page = for_message_page(&conn, NamespaceId(1), UidKind::Imap, 0, 2).unwrap();

        assert_eq!(page.len(), 2);
        assert_eq!(page[&MessageId(1)].len(), 2);
        assert_eq!(page[&MessageId(2)].len(), 1);
        assert!(!page.contains_key(&MessageId(3)));
    }

    #[test]
    fn markers_only_report_changes() {
        let conn = setup();
        insert(&conn, AccountId(1), &make_uid(1, 1, UidKind::Imap)).unwrap();

        assert!(mark_draft(&conn, UidId(1)).unwrap());
        assert!(!mark_draft(&conn, UidId(1)).unwrap());
        assert!(mark_starred(&conn, UidId(1)).unwrap());
        assert!(!mark_starred(&conn, UidId(1)).unwrap());

        let uid = &get_by_account(&conn, AccountId(1), UidKind::Imap).unwrap()[0];
        assert!(uid.is_draft && uid.is_starred);
    }
}
