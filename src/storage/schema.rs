//! SQL schema definitions as const strings.
//!
//! The mail-sync system owns these tables; the statements here describe the
//! subset the backfill reads and writes, and are safe to run against a store
//! that already has them.

/// SQL to create the accounts table.
pub const CREATE_ACCOUNTS: &str = r#"
CREATE TABLE IF NOT EXISTS accounts (
    id INTEGER PRIMARY KEY,
    email TEXT NOT NULL,
    provider TEXT NOT NULL,
    primary_device_id INTEGER,
    secondary_device_id INTEGER,
    created_at TEXT NOT NULL
)
"#;

/// SQL to create the namespaces table.
pub const CREATE_NAMESPACES: &str = r#"
CREATE TABLE IF NOT EXISTS namespaces (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL UNIQUE REFERENCES accounts(id)
)
"#;

/// SQL to create the categories table.
pub const CREATE_CATEGORIES: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    namespace_id INTEGER NOT NULL REFERENCES namespaces(id),
    name TEXT,
    display_name TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'folder',
    created_at TEXT NOT NULL
)
"#;

/// SQL to create the category uniqueness indexes.
///
/// Canonical categories are unique on their name; the rest on display name.
pub const CREATE_CATEGORY_INDEXES: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_canonical
    ON categories(namespace_id, name) WHERE name IS NOT NULL;
CREATE UNIQUE INDEX IF NOT EXISTS idx_categories_display
    ON categories(namespace_id, display_name) WHERE name IS NULL
"#;

/// SQL to create the folders table.
pub const CREATE_FOLDERS: &str = r#"
CREATE TABLE IF NOT EXISTS folders (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL REFERENCES accounts(id),
    name TEXT NOT NULL,
    canonical_name TEXT,
    category_id INTEGER REFERENCES categories(id)
)
"#;

/// SQL to create folder indexes.
pub const CREATE_FOLDER_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_folders_account ON folders(account_id)
"#;

/// SQL to create the labels table.
pub const CREATE_LABELS: &str = r#"
CREATE TABLE IF NOT EXISTS labels (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL REFERENCES accounts(id),
    name TEXT NOT NULL,
    canonical_name TEXT,
    created_at TEXT NOT NULL
)
"#;

/// SQL to create the label uniqueness index.
///
/// SQLite treats NULLs as distinct in unique indexes, so the canonical name is
/// coalesced to keep (name, NULL) unique too.
pub const CREATE_LABEL_INDEXES: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_labels_key
    ON labels(account_id, name, COALESCE(canonical_name, ''))
"#;

/// SQL to create the messages table.
pub const CREATE_MESSAGES: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY,
    namespace_id INTEGER NOT NULL REFERENCES namespaces(id),
    is_read INTEGER NOT NULL DEFAULT 0,
    is_starred INTEGER NOT NULL DEFAULT 0,
    is_draft INTEGER NOT NULL DEFAULT 0
)
"#;

/// SQL to create message indexes.
pub const CREATE_MESSAGE_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_messages_namespace ON messages(namespace_id, id)
"#;

/// SQL to create the message_categories association table.
pub const CREATE_MESSAGE_CATEGORIES: &str = r#"
CREATE TABLE IF NOT EXISTS message_categories (
    message_id INTEGER NOT NULL REFERENCES messages(id),
    category_id INTEGER NOT NULL REFERENCES categories(id),
    PRIMARY KEY (message_id, category_id)
)
"#;

/// SQL to create the provider_uids table.
///
/// `folder_id` carries no foreign key: the sync system deletes folders
/// without cleaning up the UIDs that point at them.
pub const CREATE_PROVIDER_UIDS: &str = r#"
CREATE TABLE IF NOT EXISTS provider_uids (
    id INTEGER PRIMARY KEY,
    account_id INTEGER NOT NULL REFERENCES accounts(id),
    message_id INTEGER NOT NULL REFERENCES messages(id),
    kind TEXT NOT NULL,
    folder_id INTEGER NOT NULL,
    device_id INTEGER,
    is_seen INTEGER NOT NULL DEFAULT 0,
    is_starred INTEGER NOT NULL DEFAULT 0,
    is_draft INTEGER NOT NULL DEFAULT 0,
    raw_labels TEXT NOT NULL DEFAULT '[]'
)
"#;

/// SQL to create provider UID indexes.
pub const CREATE_PROVIDER_UID_INDEXES: &str = r#"
CREATE INDEX IF NOT EXISTS idx_provider_uids_account ON provider_uids(account_id, kind);
CREATE INDEX IF NOT EXISTS idx_provider_uids_message ON provider_uids(message_id)
"#;

/// SQL to create the uid_labels association table.
pub const CREATE_UID_LABELS: &str = r#"
CREATE TABLE IF NOT EXISTS uid_labels (
    uid_id INTEGER NOT NULL REFERENCES provider_uids(id),
    label_id INTEGER NOT NULL REFERENCES labels(id),
    PRIMARY KEY (uid_id, label_id)
)
"#;

/// Returns all schema creation statements in order.
pub fn all_migrations() -> Vec<&'static str> {
    vec![
        CREATE_ACCOUNTS,
        CREATE_NAMESPACES,
        CREATE_CATEGORIES,
        CREATE_CATEGORY_INDEXES,
        CREATE_FOLDERS,
        CREATE_FOLDER_INDEXES,
        CREATE_LABELS,
        CREATE_LABEL_INDEXES,
        CREATE_MESSAGES,
        CREATE_MESSAGE_INDEXES,
        CREATE_MESSAGE_CATEGORIES,
        CREATE_PROVIDER_UIDS,
        CREATE_PROVIDER_UID_INDEXES,
        CREATE_UID_LABELS,
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn migrations_apply_twice() {
        let conn = Connection::open_in_memory().unwrap();
        for _ in 0..2 {
            for migration in all_migrations() {
                conn.execute_batch(migration).unwrap();
            }
        }
    }

    #[test]
    fn indexes_use_if_not_exists() {
        assert!(CREATE_CATEGORY_INDEXES.contains("IF NOT EXISTS"));
        assert!(CREATE_LABEL_INDEXES.contains("IF NOT EXISTS"));
        assert!(CREATE_PROVIDER_UID_INDEXES.contains("IF NOT EXISTS"));
    }

    #[test]
    fn label_index_rejects_duplicate_plain_labels() {
        let conn = Connection::open_in_memory().unwrap();
        for migration in all_migrations() {
            conn.execute_batch(migration).unwrap();
        }
        conn.execute(
            "INSERT INTO accounts (id, email, provider, created_at) VALUES (1, 'a@b.c', 'gmail', '')",
            [],
        )
        .unwrap();

        let insert = "INSERT INTO labels (account_id, name, canonical_name, created_at)
                      VALUES (1, 'Receipts', NULL, '')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }

    #[test]
    fn messages_hold_only_flag_columns() {
        let conn = Connection::open_in_memory().unwrap();
        for migration in all_migrations() {
            conn.execute_batch(migration).unwrap();
        }

        let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('messages')").unwrap();
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap();

        assert_eq!(
            columns,
            vec!["id", "namespace_id", "is_read", "is_starred", "is_draft"]
        );
    }
}
