//! Notification creation feed
//!
//! Broadcast hub carrying every successfully inserted notification to
//! connected subscribers. Delivery is best-effort: there is no replay for
//! late subscribers and no buffering across disconnects.

use tokio::sync::broadcast;

use crate::db::schemas::NotificationRecord;

/// Default broadcast buffer size
pub const DEFAULT_FEED_CAPACITY: usize = 100;

/// Hub for fanning out notification insert events
pub struct NotificationFeed {
    sender: broadcast::Sender<NotificationRecord>,
}

impl NotificationFeed {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe to insert events
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationRecord> {
        self.sender.subscribe()
    }

    /// Publish an insert event to all connected subscribers.
    ///
    /// Send errors (no subscribers) are ignored.
    pub fn publish(&self, record: NotificationRecord) {
        let _ = self.sender.send(record);
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for NotificationFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}
