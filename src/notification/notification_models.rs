use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum number of entries kept in the cached feed.
pub const FEED_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    pub notification_type: String,
    pub title: String,
    pub body: Option<String>,
    /// In-app route to open when the notification is clicked.
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn kind(&self) -> NotificationType {
        NotificationType::from_tag(&self.notification_type)
    }
}

/// Known notification tags. Anything the server adds later lands in `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    GoalCompleted,
    GoalReminder,
    DailyPlanReminder,
    ReviewReminder,
    BadgeEarned,
    PointsAwarded,
    LeaderboardChange,
    FamilyInvite,
    FamilyMemberJoined,
    Other,
}

impl NotificationType {
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "goal_completed" => NotificationType::GoalCompleted,
            "goal_reminder" => NotificationType::GoalReminder,
            "daily_plan_reminder" => NotificationType::DailyPlanReminder,
            "review_reminder" => NotificationType::ReviewReminder,
            "badge_earned" => NotificationType::BadgeEarned,
            "points_awarded" => NotificationType::PointsAwarded,
            "leaderboard_change" => NotificationType::LeaderboardChange,
            "family_invite" => NotificationType::FamilyInvite,
            "family_member_joined" => NotificationType::FamilyMemberJoined,
            _ => NotificationType::Other,
        }
    }

    /// Display icon name for the tag.
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationType::GoalCompleted => "check-circle",
            NotificationType::GoalReminder => "target",
            NotificationType::DailyPlanReminder => "calendar",
            NotificationType::ReviewReminder => "clipboard",
            NotificationType::BadgeEarned => "award",
            NotificationType::PointsAwarded => "star",
            NotificationType::LeaderboardChange => "trophy",
            NotificationType::FamilyInvite => "mail",
            NotificationType::FamilyMemberJoined => "users",
            NotificationType::Other => "bell",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,
    pub unread_count: u32,
}

impl NotificationFeed {
    /// Folds a live push into the feed: newest first, capped at `FEED_LIMIT`.
    pub fn with_push(previous: Option<&NotificationFeed>, notification: Notification) -> Self {
        match previous {
            None => NotificationFeed {
                notifications: vec![notification],
                unread_count: 1,
            },
            Some(feed) => {
                let mut notifications = Vec::with_capacity(FEED_LIMIT);
                notifications.push(notification);
                notifications.extend(feed.notifications.iter().take(FEED_LIMIT - 1).cloned());

                NotificationFeed {
                    notifications,
                    unread_count: feed.unread_count.saturating_add(1),
                }
            }
        }
    }

    /// Applies a server-confirmed mark-as-read of a single notification.
    pub fn mark_read(&mut self, id: i64) {
        if let Some(notification) = self.notifications.iter_mut().find(|n| n.id == id) {
            notification.read = true;
        }
        self.unread_count = self.unread_count.saturating_sub(1);
    }

    pub fn mark_all_read(&mut self) {
        for notification in &mut self.notifications {
            notification.read = true;
        }
        self.unread_count = 0;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::TimeZone;

    pub(crate) fn notification(id: i64) -> Notification {
        Notification {
            id,
            notification_type: "badge_earned".to_string(),
            title: format!("Notification {}", id),
            body: None,
            link: Some("/badges".to_string()),
            read: false,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    fn ids(feed: &NotificationFeed) -> Vec<i64> {
        feed.notifications.iter().map(|n| n.id).collect()
    }

    #[test]
    fn test_push_into_empty_cache() {
        let feed = NotificationFeed::with_push(None, notification(1));

        assert_eq!(ids(&feed), vec![1]);
        assert_eq!(feed.unread_count, 1);
    }

    #[test]
    fn test_push_prepends_and_increments() {
        let existing = NotificationFeed {
            notifications: vec![notification(1)],
            unread_count: 4,
        };
        let feed = NotificationFeed::with_push(Some(&existing), notification(2));

        assert_eq!(ids(&feed), vec![2, 1]);
        assert_eq!(feed.unread_count, 5);
    }

    #[test]
    fn test_feed_is_capped_at_ten_newest() {
        let mut feed = None;
        for id in 1..=15 {
            feed = Some(NotificationFeed::with_push(feed.as_ref(), notification(id)));
        }
        let feed = feed.unwrap();

        assert_eq!(feed.notifications.len(), FEED_LIMIT);
        assert_eq!(ids(&feed), (6..=15).rev().collect::<Vec<_>>());
        assert_eq!(feed.unread_count, 15);
    }

    #[test]
    fn test_mark_read_floors_at_zero() {
        let mut feed = NotificationFeed {
            notifications: vec![notification(1), notification(2)],
            unread_count: 1,
        };

        feed.mark_read(2);
        assert!(feed.notifications[1].read);
        assert!(!feed.notifications[0].read);
        assert_eq!(feed.unread_count, 0);

        feed.mark_read(1);
        assert_eq!(feed.unread_count, 0);
    }

    #[test]
    fn test_mark_all_read() {
        let mut feed = NotificationFeed {
            notifications: vec![notification(1), notification(2)],
            unread_count: 2,
        };

        feed.mark_all_read();
        assert!(feed.notifications.iter().all(|n| n.read));
        assert_eq!(feed.unread_count, 0);
    }

    #[test]
    fn test_icon_lookup() {
        assert_eq!(notification(1).kind().icon(), "award");
        assert_eq!(NotificationType::from_tag("goal_completed").icon(), "check-circle");
        assert_eq!(NotificationType::from_tag("something_new"), NotificationType::Other);
        assert_eq!(NotificationType::Other.icon(), "bell");
    }
}
