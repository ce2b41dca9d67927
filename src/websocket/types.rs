use crate::notification::Notification;
use serde::{Deserialize, Serialize};

pub const NOTIFICATIONS_CHANNEL: &str = "NotificationsChannel";

/// Client-to-server cable command.
#[derive(Debug, Clone, Serialize)]
pub struct CableCommand {
    pub command: &'static str,
    /// The channel identifier is itself a JSON-encoded string.
    pub identifier: String,
}

#[derive(Debug, Serialize)]
struct ChannelIdentifier<'a> {
    channel: &'a str,
}

impl CableCommand {
    pub fn subscribe(channel: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            command: "subscribe",
            identifier: serde_json::to_string(&ChannelIdentifier { channel })?,
        })
    }
}

/// Server-to-client frame. Protocol frames carry a `type`; channel
/// broadcasts carry a `message`. Pings carry both.
#[derive(Debug, Clone, Deserialize)]
pub struct CableFrame {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub message: Option<serde_json::Value>,
}

/// Broadcast payloads published on the notifications channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChannelMessage {
    NewNotification { notification: Notification },
}

pub fn is_control_kind(kind: &str) -> bool {
    matches!(kind, "ping" | "welcome" | "confirm_subscription")
}
