//! Real-time event bus and notification dispatch.

use std::sync::Arc;

use sea_orm::DatabaseConnection;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use campuspay_core::wallet::{
    EventPublisher, LedgerEvent, LedgerEventKind, Notification, NotificationDispatcher,
};
use campuspay_db::NotificationRepository;

/// In-process broadcast of [`LedgerEvent`]s to WebSocket subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
    /// Creates a bus; subscribers lagging more than `capacity` events skip ahead.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Receives every event published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.sender.subscribe()
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: LedgerEvent) {
        // Err only means nobody is connected.
        if self.sender.send(event).is_err() {
            debug!("no event subscribers connected");
        }
    }
}

/// Persists notifications off the request path, then pushes them live.
#[derive(Debug, Clone)]
pub struct DbNotifier {
    repo: NotificationRepository,
    events: Arc<EventBus>,
}

impl DbNotifier {
    /// Creates a dispatcher writing through `db`.
    #[must_use]
    pub fn new(db: DatabaseConnection, events: Arc<EventBus>) -> Self {
        Self {
            repo: NotificationRepository::new(db),
            events,
        }
    }
}

impl NotificationDispatcher for DbNotifier {
    fn dispatch(&self, notification: Notification) {
        let repo = self.repo.clone();
        let events = Arc::clone(&self.events);
        tokio::spawn(async move {
            match repo.create(&notification).await {
                Ok(_) => events.publish(LedgerEvent::new(
                    notification.user_id,
                    LedgerEventKind::Notification {
                        title: notification.title,
                        body: notification.body,
                    },
                )),
                Err(e) => warn!(
                    user_id = %notification.user_id,
                    error = %e,
                    "failed to persist notification"
                ),
            }
        });
    }
}
