use super::notification_models::{Notification, NotificationFeed};
use std::sync::Arc;
use tokio::sync::watch;

/// In-memory cache entry for the recent-notifications feed.
///
/// `None` means nothing has been fetched or pushed yet. Writers replace or
/// patch the entry in place and every subscriber sees the new value.
#[derive(Clone)]
pub struct FeedCache {
    tx: Arc<watch::Sender<Option<NotificationFeed>>>,
}

impl FeedCache {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> Option<NotificationFeed> {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<NotificationFeed>> {
        self.tx.subscribe()
    }

    /// Overwrites the entry with a freshly fetched feed.
    pub fn replace(&self, feed: NotificationFeed) {
        self.tx.send_replace(Some(feed));
    }

    /// Patches the entry with a live push. Never touches the network.
    pub fn apply_push(&self, notification: Notification) {
        self.tx.send_modify(|entry| {
            let next = NotificationFeed::with_push(entry.as_ref(), notification);
            *entry = Some(next);
        });
    }

    pub fn mark_read(&self, id: i64) {
        self.tx.send_if_modified(|entry| match entry {
            Some(feed) => {
                feed.mark_read(id);
                true
            }
            None => false,
        });
    }

    pub fn mark_all_read(&self) {
        self.tx.send_if_modified(|entry| match entry {
            Some(feed) => {
                feed.mark_all_read();
                true
            }
            None => false,
        });
    }
}

impl Default for FeedCache {
    fn default() -> Self {
        Self::new()
    }
}
