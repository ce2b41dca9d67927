use crate::notification::{FeedCache, Notification};
use std::sync::Arc;
use super::types::{is_control_kind, CableFrame, ChannelMessage};

pub type NotificationCallback = Arc<dyn Fn(&Notification) + Send + Sync>;

/// What happened to one inbound text frame.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Control,
    Delivered(i64),
    Ignored,
}

/// Applies inbound frames to the feed cache.
#[derive(Clone)]
pub struct FrameHandler {
    cache: FeedCache,
    on_notification: Option<NotificationCallback>,
}

impl FrameHandler {
    pub fn new(cache: FeedCache, on_notification: Option<NotificationCallback>) -> Self {
        Self {
            cache,
            on_notification,
        }
    }

    pub fn handle_text(&self, text: &str) -> FrameOutcome {
        let frame: CableFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                // Keep-alives and corrupt payloads look the same from here.
                tracing::trace!("Discarding unparseable frame: {}", e);
                return FrameOutcome::Ignored;
            }
        };

        match frame {
            CableFrame { kind: Some(kind), .. } if is_control_kind(&kind) => FrameOutcome::Control,
            CableFrame { message: Some(message), .. } => self.handle_broadcast(message),
            CableFrame { kind, .. } => {
                tracing::trace!("Discarding frame of unknown type {:?}", kind);
                FrameOutcome::Ignored
            }
        }
    }

    fn handle_broadcast(&self, message: serde_json::Value) -> FrameOutcome {
        match serde_json::from_value::<ChannelMessage>(message) {
            Ok(ChannelMessage::NewNotification { notification }) => {
                let id = notification.id;
                tracing::debug!("New notification {} ({})", id, notification.notification_type);

                self.cache.apply_push(notification.clone());
                if let Some(callback) = &self.on_notification {
                    callback(&notification);
                }

                FrameOutcome::Delivered(id)
            }
            Err(e) => {
                tracing::trace!("Discarding broadcast: {}", e);
                FrameOutcome::Ignored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    fn push_frame(id: i64) -> String {
        json!({
            "identifier": "{\"channel\":\"NotificationsChannel\"}",
            "message": {
                "type": "new_notification",
                "notification": {
                    "id": id,
                    "notification_type": "goal_completed",
                    "title": "Goal reached",
                    "body": null,
                    "link": "/goals/3",
                    "read": false,
                    "created_at": "2024-03-01T12:00:00.000Z"
                }
            }
        })
        .to_string()
    }

    fn recording_handler() -> (FrameHandler, FeedCache, Arc<Mutex<Vec<i64>>>) {
        let cache = FeedCache::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: NotificationCallback = Arc::new(move |n: &Notification| {
            sink.lock().unwrap().push(n.id);
        });
        (FrameHandler::new(cache.clone(), Some(callback)), cache, seen)
    }

    #[test]
    fn test_control_frames_are_noops() {
        let (handler, cache, seen) = recording_handler();

        let frames = [
            json!({ "type": "ping", "message": 1700000000 }),
            json!({ "type": "welcome" }),
            json!({
                "type": "confirm_subscription",
                "identifier": "{\"channel\":\"NotificationsChannel\"}"
            }),
        ];
        for frame in frames {
            assert_eq!(handler.handle_text(&frame.to_string()), FrameOutcome::Control);
        }

        assert!(cache.get().is_none());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_push_patches_cache_then_calls_back() {
        let (handler, cache, seen) = recording_handler();

        assert_eq!(handler.handle_text(&push_frame(1)), FrameOutcome::Delivered(1));
        assert_eq!(handler.handle_text(&push_frame(2)), FrameOutcome::Delivered(2));

        let feed = cache.get().unwrap();
        let ids: Vec<i64> = feed.notifications.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(feed.unread_count, 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_malformed_frames_leave_cache_untouched() {
        let (handler, cache, seen) = recording_handler();
        handler.handle_text(&push_frame(1));
        let before = cache.get();

        let frame = push_frame(2);
        assert_eq!(handler.handle_text(&frame[..40]), FrameOutcome::Ignored);
        assert_eq!(handler.handle_text(""), FrameOutcome::Ignored);
        assert_eq!(
            handler.handle_text(r#"{"message":{"type":"something_else"}}"#),
            FrameOutcome::Ignored
        );
        assert_eq!(
            handler.handle_text(r#"{"message":{"type":"new_notification","notification":{"id":"x"}}}"#),
            FrameOutcome::Ignored
        );

        assert_eq!(cache.get(), before);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_works_without_callback() {
        let cache = FeedCache::new();
        let handler = FrameHandler::new(cache.clone(), None);

        assert_eq!(handler.handle_text(&push_frame(9)), FrameOutcome::Delivered(9));
        assert_eq!(cache.get().unwrap().unread_count, 1);
    }
}
