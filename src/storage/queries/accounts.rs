//! Account queries.
//!
//! Reads accounts together with the namespace they own.

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::domain::{Account, AccountId, DeviceId, DevicePair, NamespaceId, ProviderType};

/// Inserts an account and its namespace.
pub fn insert(conn: &Connection, account: &Account) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let (primary, secondary) = match account.devices {
        Some(pair) => (Some(pair.primary.0), Some(pair.secondary.0)),
        None => (None, None),
    };

    conn.execute(
        "INSERT INTO accounts (id, email, provider, primary_device_id, secondary_device_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            account.id.0,
            account.email,
            account.provider.as_str(),
            primary,
            secondary,
            now,
        ],
    )?;
    conn.execute(
        "INSERT INTO namespaces (id, account_id) VALUES (?1, ?2)",
        params![account.namespace_id.0, account.id.0],
    )?;
    Ok(())
}

/// Gets an account by ID.
///
/// Returns `None` when the account does not exist or owns no namespace.
/// Fails with a conversion error wrapping [`UnknownProvider`] when the
/// discriminator is not one the engine understands.
///
/// [`UnknownProvider`]: crate::domain::UnknownProvider
pub fn get_by_id(conn: &Connection, id: AccountId) -> Result<Option<Account>> {
    conn.query_row(
        "SELECT a.id, n.id, a.email, a.provider, a.primary_device_id, a.secondary_device_id
         FROM accounts a JOIN namespaces n ON n.account_id = a.id
         WHERE a.id = ?1",
        params![id.0],
        row_to_account,
    )
    .optional()
}

/// Lists every account ID in ascending order.
pub fn list_ids(conn: &Connection) -> Result<Vec<AccountId>> {
    let mut stmt = conn.prepare("SELECT id FROM accounts ORDER BY id")?;
    let ids = stmt.query_map([], |row| Ok(AccountId(row.get(0)?)))?;
    ids.collect()
}

fn row_to_account(row: &Row<'_>) -> Result<Account> {
    let provider_str: String = row.get(3)?;
    let provider = provider_str
        .parse::<ProviderType>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, Box::new(e)))?;

    let primary: Option<i64> = row.get(4)?;
    let secondary: Option<i64> = row.get(5)?;
    let devices = match (primary, secondary) {
        (Some(primary), Some(secondary)) => Some(DevicePair {
            primary: DeviceId(primary),
            secondary: DeviceId(secondary),
        }),
        _ => None,
    };

    Ok(Account {
        id: AccountId(row.get(0)?),
        namespace_id: NamespaceId(row.get(1)?),
        email: row.get(2)?,
        provider,
        devices,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::UnknownProvider;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        for migration in super::super::super::schema::all_migrations() {
            conn.execute_batch(migration).unwrap();
        }
        conn
    }

    fn make_account(id: i64, provider: ProviderType) -> Account {
        Account {
            id: AccountId(id),
            namespace_id: NamespaceId(id * 10),
            email: format!("user{id}@example.com"),
            provider,
            devices: None,
        }
    }

    #[test]
    fn insert_and_get_account() {
        let conn = setup();
        let account = make_account(1, ProviderType::Gmail);

        insert(&conn, &account).unwrap();
        let fetched = get_by_id(&conn, account.id).unwrap().unwrap();

        assert_eq!(fetched, account);
    }

    #[test]
    fn eas_account_keeps_devices() {
        let conn = setup();
        let mut account = make_account(2, ProviderType::Eas);
        account.devices = Some(DevicePair {
            primary: DeviceId(21),
            secondary: DeviceId(22),
        });

        insert(&conn, &account).unwrap();
        let fetched = get_by_id(&conn, account.id).unwrap().unwrap();

        assert_eq!(fetched.devices, account.devices);
    }

    #[test]
    fn get_nonexistent_account_returns_none() {
        let conn = setup();
        assert!(get_by_id(&conn, AccountId(404)).unwrap().is_none());
    }

    #[test]
    fn unknown_provider_fails_conversion() {
        let conn = setup();
        insert(&conn, &make_account(3, ProviderType::Imap)).unwrap();
        conn.execute("UPDATE accounts SET provider = 'pop3' WHERE id = 3", [])
            .unwrap();

        let err = get_by_id(&conn, AccountId(3)).unwrap_err();
        match err {
            rusqlite::Error::FromSqlConversionFailure(_, _, source) => {
                assert_eq!(
                    source.downcast_ref::<UnknownProvider>(),
                    Some(&UnknownProvider("pop3".to_string()))
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn list_ids_is_ascending() {
        let conn = setup();
        for id in [5, 1, 3] {
            insert(&conn, &make_account(id, ProviderType::Imap)).unwrap();
        }

        assert_eq!(
            list_ids(&conn).unwrap(),
            vec![AccountId(1), AccountId(3), AccountId(5)]
        );
    }
}
