//! Message metadata backfill.
//!
//! Walks a namespace's messages in ascending ID order, one page per
//! transaction, and rewrites each message's flags from its provider UID
//! records. Category associations already on a message are never touched.
//!
//! Pages are addressed by offset. Only flag columns are written, so the set of message IDs does not move under the cursor during
//! a run; a sync process inserting or deleting messages concurrently could
//! shift page boundaries and make the run skip or revisit rows.

use rusqlite::Connection;
use serde::Serialize;

use crate::domain::{recompute_flags, Account};
use crate::storage::queries::{folders, messages, uids};
use crate::storage::Database;

use super::events::{EventBuffer, EventPublisher, MigrationEvent};
use super::MigrationError;

/// Messages per page, and per transaction.
pub const PAGE_SIZE: u64 = 1000;

/// What happened to one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PageOutcome {
    /// Messages the page held; zero marks the end of the namespace.
    pub messages: usize,
    pub updated: usize,
    pub skipped: usize,
}

/// Totals for one account's backfill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BackfillReport {
    pub pages_committed: usize,
    pub messages_seen: usize,
    pub messages_updated: usize,
    pub messages_skipped: usize,
}

/// Recomputes one page of an account's messages on `conn`.
///
/// Lookup misses skip the message and leave it untouched. Any other error is
/// returned and should roll back the page.
pub fn backfill_page(
    conn: &Connection,
    account: &Account,
    offset: u64,
    limit: u64,
    events: &mut EventBuffer,
) -> Result<PageOutcome, MigrationError> {
    let page = messages::page_for_namespace(conn, account.namespace_id, offset, limit)?;
    if page.is_empty() {
        return Ok(PageOutcome::default());
    }

    let mut uid_map = uids::for_message_page(
        conn,
        account.namespace_id,
        account.provider.uid_kind(),
        offset,
        limit,
    )?;
    let folder_map = folders::category_map(conn, account.id)?;

    let mut outcome = PageOutcome {
        messages: page.len(),
        ..PageOutcome::default()
    };

    for message in &page {
        let records = uid_map.remove(&message.id).unwrap_or_default();
        let flags = match recompute_flags(message.id, &records, &folder_map) {
            Ok(flags) => flags,
            Err(miss) => {
                outcome.skipped += 1;
                events.push(MigrationEvent::MessageSkipped {
                    account_id: account.id,
                    message_id: message.id,
                    reason: miss.to_string(),
                });
                continue;
            }
        };

        if flags != message.flags {
            messages::set_flags(conn, message.id, flags)?;
            outcome.updated += 1;
            events.push(MigrationEvent::MessageUpdated {
                account_id: account.id,
                message_id: message.id,
            });
        }
    }

    Ok(outcome)
}

/// Runs the page loop for an account against the store.
#[derive(Debug, Clone)]
pub struct Backfiller {
    db: Database,
    publisher: EventPublisher,
}

impl Backfiller {
    pub fn new(db: Database, publisher: EventPublisher) -> Self {
        Self { db, publisher }
    }

    /// Backfills every message in the account's namespace.
    ///
    /// Each page commits on its own. On error, earlier pages stay committed
    /// and the failing page is rolled back.
    pub async fn run(&self, account: &Account) -> Result<BackfillReport, MigrationError> {
        let namespace_id = account.namespace_id;
        let total = self
            .db
            .with_conn(move |conn| Ok(messages::count_by_namespace(conn, namespace_id)?))
            .await?;
        tracing::info!(account_id = %account.id, total, "Backfilling messages");

        let mut report = BackfillReport::default();
        let mut offset = 0;

        loop {
            let page_account = account.clone();
            let (outcome, events) = self
                .db
                .transaction(move |tx| -> Result<_, MigrationError> {
                    let mut events = EventBuffer::new();
                    let outcome = backfill_page(tx, &page_account, offset, PAGE_SIZE, &mut events)?;
                    Ok((outcome, events))
                })
                .await?;

            if outcome.messages == 0 {
                break;
            }

            self.publisher.publish_all(events);
            self.publisher.publish(MigrationEvent::PageCommitted {
                account_id: account.id,
                offset,
                messages: outcome.messages,
            });

            report.pages_committed += 1;
            report.messages_seen += outcome.messages;
            report.messages_updated += outcome.updated;
            report.messages_skipped += outcome.skipped;
            offset += PAGE_SIZE;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        CategoryKey, FolderId, MessageFlags, MessageId, ProviderType, UidId, UidKind, UidRecord,
    };
    use crate::migration::test_support::{account, folder, message, uid};
    use crate::storage::queries::categories;
    use pretty_assertions::assert_eq;

    const READ: MessageFlags = MessageFlags {
        is_read: true,
        is_starred: false,
        is_draft: false,
    };

    async fn seeded(count: i64) -> (Database, Account) {
        let db = Database::open_in_memory().await.unwrap();
        let acct = db
            .with_conn(move |conn| {
                let acct = account(conn, 1, ProviderType::Imap);
                folder(conn, &acct, 10, "INBOX", Some("inbox"));
                let (category, _) = categories::find_or_create(
                    conn,
                    acct.namespace_id,
                    &CategoryKey::Canonical("inbox".to_string()),
                    "INBOX",
                )?;
                folders::set_category(conn, FolderId(10), category.id)?;
                for id in 1..=count {
                    message(conn, &acct, id);
                    uid(conn, &acct, id, id, 10, READ);
                }
                Ok(acct)
            })
            .await
            .unwrap();
        (db, acct)
    }

    fn page_commits(receiver: &mut tokio::sync::broadcast::Receiver<MigrationEvent>) -> Vec<(u64, usize)> {
        let mut commits = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            if let MigrationEvent::PageCommitted {
                offset, messages, ..
            } = event
            {
                commits.push((offset, messages));
            }
        }
        commits
    }

    #[tokio::test]
    async fn pages_of_one_thousand() {
        let (db, acct) = seeded(2500).await;
        let publisher = EventPublisher::new(8192);
        let mut receiver = publisher.subscribe();

        let report = Backfiller::new(db.clone(), publisher).run(&acct).await.unwrap();

        assert_eq!(report.pages_committed, 3);
        assert_eq!(report.messages_seen, 2500);
        assert_eq!(report.messages_updated, 2500);
        assert_eq!(
            page_commits(&mut receiver),
            vec![(0, 1000), (1000, 1000), (2000, 500)]
        );

        let flags = db
            .with_conn(|conn| Ok(messages::get_flags(conn, MessageId(2500))?))
            .await
            .unwrap();
        assert_eq!(flags, Some(READ));
    }

    #[tokio::test]
    async fn missing_folder_skips_only_that_message() {
        let (db, acct) = seeded(1000).await;
        db.with_conn(|conn| {
            conn.execute("UPDATE provider_uids SET folder_id = 99 WHERE id = 500", [])?;
            Ok(())
        })
        .await
        .unwrap();

        let report = Backfiller::new(db.clone(), EventPublisher::default())
            .run(&acct)
            .await
            .unwrap();

        assert_eq!(report.pages_committed, 1);
        assert_eq!(report.messages_skipped, 1);
        assert_eq!(report.messages_updated, 999);

        let (skipped, updated) = db
            .with_conn(|conn| {
                Ok((
                    messages::get_flags(conn, MessageId(500))?,
                    messages::get_flags(conn, MessageId(501))?,
                ))
            })
            .await
            .unwrap();
        assert_eq!(skipped, Some(MessageFlags::default()));
        assert_eq!(updated, Some(READ));
    }

    #[tokio::test]
    async fn message_without_uids_is_skipped() {
        let (db, acct) = seeded(3).await;
        let orphan_owner = acct.clone();
        db.with_conn(move |conn| {
            message(conn, &orphan_owner, 4);
            Ok(())
        })
        .await
        .unwrap();

        let report = Backfiller::new(db, EventPublisher::default())
            .run(&acct)
            .await
            .unwrap();
        assert_eq!(report.messages_seen, 4);
        assert_eq!(report.messages_skipped, 1);
    }

    #[tokio::test]
    async fn second_run_changes_nothing() {
        let (db, acct) = seeded(1200).await;
        let backfiller = Backfiller::new(db, EventPublisher::default());

        let first = backfiller.run(&acct).await.unwrap();
        assert_eq!(first.messages_updated, 1200);

        let second = backfiller.run(&acct).await.unwrap();
        assert_eq!(second.pages_committed, 2);
        assert_eq!(second.messages_updated, 0);
    }

    fn category_count(conn: &Connection, message_id: i64) -> i64 {
        conn.query_row(
            "SELECT COUNT(*) FROM message_categories WHERE message_id = ?1",
            [message_id],
            |row| row.get(0),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn existing_categories_survive() {
        let (db, acct) = seeded(2).await;
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO categories (id, namespace_id, name, display_name, created_at)
                 VALUES (50, 1, 'archive', 'Archive', '')",
                [],
            )?;
            conn.execute(
                "INSERT INTO message_categories (message_id, category_id) VALUES (1, 50)",
                [],
            )?;
            Ok(())
        })
        .await
        .unwrap();

        let report = Backfiller::new(db.clone(), EventPublisher::default())
            .run(&acct)
            .await
            .unwrap();
        assert_eq!(report.messages_updated, 2);

        // Folder 10 is linked to the inbox category, but the backfill never
        // adds associations either.
        let counts = db
            .with_conn(|conn| Ok((category_count(conn, 1), category_count(conn, 2))))
            .await
            .unwrap();
        assert_eq!(counts, (1, 0));
    }

    #[test]
    fn device_paired_account_backfills_flags_only() {
        let conn = crate::migration::test_support::store();
        let acct = account(&conn, 3, ProviderType::Eas);
        // ActiveSync folders are never linked to a category here.
        folder(&conn, &acct, 30, "Inbox", Some("inbox"));
        conn.execute(
            "INSERT INTO categories (id, namespace_id, name, display_name, created_at)
             VALUES (70, 3, 'inbox', 'Inbox', '')",
            [],
        )
        .unwrap();
        for id in 1..=3 {
            message(&conn, &acct, id);
            conn.execute(
                "INSERT INTO message_categories (message_id, category_id) VALUES (?1, 70)",
                [id],
            )
            .unwrap();
        }
        let starred = MessageFlags {
            is_starred: true,
            ..MessageFlags::default()
        };
        uid(&conn, &acct, 1, 1, 30, READ);
        uid(&conn, &acct, 2, 2, 30, starred);
        // Message 3 only has a record of another kind, so it has no location.
        uids::insert(
            &conn,
            acct.id,
            &UidRecord {
                id: UidId(3),
                message_id: MessageId(3),
                kind: UidKind::Imap,
                folder_id: FolderId(30),
                device_id: None,
                is_seen: true,
                is_starred: false,
                is_draft: false,
                raw_labels: Vec::new(),
            },
        )
        .unwrap();

        let mut events = EventBuffer::new();
        let outcome = backfill_page(&conn, &acct, 0, PAGE_SIZE, &mut events).unwrap();

        assert_eq!(
            outcome,
            PageOutcome {
                messages: 3,
                updated: 2,
                skipped: 1,
            }
        );
        assert_eq!(messages::get_flags(&conn, MessageId(1)).unwrap(), Some(READ));
        assert_eq!(messages::get_flags(&conn, MessageId(2)).unwrap(), Some(starred));
        for id in 1..=3 {
            assert_eq!(category_count(&conn, id), 1);
        }
    }

    #[test]
    fn empty_namespace_yields_empty_page() {
        let conn = crate::migration::test_support::store();
        let acct = account(&conn, 1, ProviderType::Imap);
        let mut events = EventBuffer::new();

        let outcome = backfill_page(&conn, &acct, 0, PAGE_SIZE, &mut events).unwrap();
        assert_eq!(outcome, PageOutcome::default());
        assert!(events.is_empty());
    }
}
