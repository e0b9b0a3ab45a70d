//! Progress events.
//!
//! Work done inside a transaction records its events in an [`EventBuffer`].
//! The buffer is handed to the [`EventPublisher`] only after the transaction
//! commits, so subscribers and the log never see changes that were rolled
//! back.

use serde::Serialize;
use tokio::sync::broadcast;

use crate::domain::{AccountId, CategoryId, DeviceId, FolderId, LabelId, MessageId, UidId};

/// Something observable that happened while migrating an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MigrationEvent {
    AccountStarted {
        account_id: AccountId,
    },
    CategoryCreated {
        account_id: AccountId,
        category_id: CategoryId,
    },
    FolderLinked {
        account_id: AccountId,
        folder_id: FolderId,
        category_id: CategoryId,
    },
    LabelCreated {
        account_id: AccountId,
        label_id: LabelId,
    },
    /// A label was attached to a UID record.
    LabelUpdated {
        account_id: AccountId,
        label_id: LabelId,
        uid_id: UidId,
    },
    UidMarked {
        account_id: AccountId,
        uid_id: UidId,
        marker: UidMarker,
    },
    DeviceCategorized {
        account_id: AccountId,
        device_id: DeviceId,
    },
    MessageUpdated {
        account_id: AccountId,
        message_id: MessageId,
    },
    MessageSkipped {
        account_id: AccountId,
        message_id: MessageId,
        reason: String,
    },
    PageCommitted {
        account_id: AccountId,
        offset: u64,
        messages: usize,
    },
    AccountFinished {
        account_id: AccountId,
    },
    AccountFailed {
        account_id: AccountId,
        error: String,
    },
}

/// Marker set on a UID from its raw labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UidMarker {
    Draft,
    Starred,
}

impl MigrationEvent {
    /// Emits this event as a structured log record.
    pub fn log(&self) {
        match self {
            Self::AccountStarted { account_id } => {
                tracing::info!(%account_id, "Migrating account");
            }
            Self::CategoryCreated {
                account_id,
                category_id,
            } => {
                tracing::info!(%account_id, %category_id, "Category created");
            }
            Self::FolderLinked {
                account_id,
                folder_id,
                category_id,
            } => {
                tracing::info!(%account_id, %folder_id, %category_id, "Folder linked to category");
            }
            Self::LabelCreated {
                account_id,
                label_id,
            } => {
                tracing::info!(%account_id, %label_id, "Label created");
            }
            Self::LabelUpdated {
                account_id,
                label_id,
                uid_id,
            } => {
                tracing::info!(%account_id, %label_id, %uid_id, "Label updated");
            }
            Self::UidMarked {
                account_id,
                uid_id,
                marker,
            } => {
                tracing::info!(%account_id, %uid_id, ?marker, "UID marker set");
            }
            Self::DeviceCategorized {
                account_id,
                device_id,
            } => {
                tracing::info!(%account_id, %device_id, "Device categories reconciled");
            }
            Self::MessageUpdated {
                account_id,
                message_id,
            } => {
                tracing::info!(%account_id, %message_id, "Message updated");
            }
            Self::MessageSkipped {
                account_id,
                message_id,
                reason,
            } => {
                tracing::warn!(%account_id, %message_id, %reason, "Message skipped");
            }
            Self::PageCommitted {
                account_id,
                offset,
                messages,
            } => {
                tracing::debug!(%account_id, offset, messages, "Page committed");
            }
            Self::AccountFinished { account_id } => {
                tracing::info!(%account_id, "Account migrated");
            }
            Self::AccountFailed { account_id, error } => {
                tracing::error!(%account_id, %error, "Account migration failed");
            }
        }
    }
}

/// Events recorded during one transaction.
#[derive(Debug, Default)]
pub struct EventBuffer {
    events: Vec<MigrationEvent>,
}

impl EventBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: MigrationEvent) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

/// Logs committed events and fans them out to subscribers.
#[derive(Debug, Clone)]
pub struct EventPublisher {
    sender: broadcast::Sender<MigrationEvent>,
}

impl EventPublisher {
    /// Creates a publisher whose subscribers may lag by up to `capacity` events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribes to events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MigrationEvent> {
        self.sender.subscribe()
    }

    /// Logs and broadcasts one event.
    pub fn publish(&self, event: MigrationEvent) {
        event.log();
        // No subscribers is fine; the log record is the primary output.
        let _ = self.sender.send(event);
    }

    /// Logs and broadcasts everything in a committed buffer.
    pub fn publish_all(&self, buffer: EventBuffer) {
        for event in buffer.events {
            self.publish(event);
        }
    }
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new(1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_subscribers_in_order() {
        let publisher = EventPublisher::new(16);
        let mut receiver = publisher.subscribe();

        let mut buffer = EventBuffer::new();
        buffer.push(MigrationEvent::AccountStarted {
            account_id: AccountId(1),
        });
        buffer.push(MigrationEvent::MessageUpdated {
            account_id: AccountId(1),
            message_id: MessageId(9),
        });
        assert_eq!(buffer.len(), 2);
        publisher.publish_all(buffer);

        assert_eq!(
            receiver.try_recv().unwrap(),
            MigrationEvent::AccountStarted {
                account_id: AccountId(1)
            }
        );
        assert_eq!(
            receiver.try_recv().unwrap(),
            MigrationEvent::MessageUpdated {
                account_id: AccountId(1),
                message_id: MessageId(9)
            }
        );
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn publish_without_subscribers_is_ok() {
        let publisher = EventPublisher::default();
        publisher.publish(MigrationEvent::AccountFinished {
            account_id: AccountId(2),
        });
    }

    #[test]
    fn events_serialize_with_tag() {
        let event = MigrationEvent::LabelUpdated {
            account_id: AccountId(1),
            label_id: LabelId(2),
            uid_id: UidId(3),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert_eq!(
            json,
            r#"{"event":"label_updated","account_id":1,"label_id":2,"uid_id":3}"#
        );
    }
}
