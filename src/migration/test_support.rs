//! Store fixtures shared by the migration unit tests.

use rusqlite::Connection;

use crate::domain::{
    Account, AccountId, Folder, FolderId, Message, MessageFlags, MessageId, NamespaceId,
    ProviderType, UidId, UidKind, UidRecord,
};
use crate::storage::queries::{accounts, folders, messages, uids};
use crate::storage::schema;

pub fn store() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    for migration in schema::all_migrations() {
        conn.execute_batch(migration).unwrap();
    }
    conn
}

/// Inserts an account whose namespace id equals its account id.
pub fn account(conn: &Connection, id: i64, provider: ProviderType) -> Account {
    let account = Account {
        id: AccountId(id),
        namespace_id: NamespaceId(id),
        email: format!("user{id}@example.com"),
        provider,
        devices: None,
    };
    accounts::insert(conn, &account).unwrap();
    account
}

pub fn folder(conn: &Connection, account: &Account, id: i64, name: &str, canonical: Option<&str>) {
    folders::insert(
        conn,
        &Folder {
            id: FolderId(id),
            account_id: account.id,
            name: name.to_string(),
            canonical_name: canonical.map(String::from),
            category_id: None,
        },
    )
    .unwrap();
}

pub fn message(conn: &Connection, account: &Account, id: i64) {
    messages::insert(
        conn,
        &Message {
            id: MessageId(id),
            namespace_id: account.namespace_id,
            flags: MessageFlags::default(),
        },
    )
    .unwrap();
}

/// Inserts a UID of the account's kind carrying `flags` as its markers.
pub fn uid(
    conn: &Connection,
    account: &Account,
    id: i64,
    message_id: i64,
    folder_id: i64,
    flags: MessageFlags,
) {
    let uid = UidRecord {
        id: UidId(id),
        message_id: MessageId(message_id),
        kind: account.provider.uid_kind(),
        folder_id: FolderId(folder_id),
        device_id: None,
        is_seen: flags.is_read,
        is_starred: flags.is_starred,
        is_draft: flags.is_draft,
        raw_labels: Vec::new(),
    };
    uids::insert(conn, account.id, &uid).unwrap();
}

pub fn gmail_uid(
    conn: &Connection,
    account: &Account,
    id: i64,
    message_id: i64,
    folder_id: i64,
    raw_labels: &[&str],
) {
    let uid = UidRecord {
        id: UidId(id),
        message_id: MessageId(message_id),
        kind: UidKind::Imap,
        folder_id: FolderId(folder_id),
        device_id: None,
        is_seen: false,
        is_starred: false,
        is_draft: false,
        raw_labels: raw_labels.iter().map(|s| s.to_string()).collect(),
    };
    uids::insert(conn, account.id, &uid).unwrap();
}
