use super::notification_models::{Notification, NotificationFeed};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct NotificationListResponse {
    pub notifications: Vec<Notification>,
    #[serde(default)]
    pub unread_count: u32,
}

impl From<NotificationListResponse> for NotificationFeed {
    fn from(response: NotificationListResponse) -> Self {
        NotificationFeed {
            notifications: response.notifications,
            unread_count: response.unread_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationPreferences {
    pub notification_enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct UpdateNotificationPreferencesRequest {
    pub notification_enabled: bool,
}

impl From<&NotificationPreferences> for UpdateNotificationPreferencesRequest {
    fn from(preferences: &NotificationPreferences) -> Self {
        Self {
            notification_enabled: preferences.notification_enabled,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}
