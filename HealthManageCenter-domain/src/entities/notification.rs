use serde::{Deserialize, Serialize};

/// Source of a notification feed item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    /// Doctor commentary addressed to the elder
    Feedback,
    /// Medication reminder definition
    Reminder,
}

/// One entry of the unified notification feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationItem {
    /// Identifier of the underlying entity (feedback id or reminder id)
    pub id: i64,

    /// Source of the item
    pub kind: NotificationKind,

    /// Short heading
    pub title: String,

    /// Body text
    pub body: String,

    /// Sort key: feedback creation time, or the reminder's next upcoming
    /// occurrence, in epoch milliseconds
    pub timestamp_millis: i64,

    /// Human-readable time string for display
    pub display_time: String,

    /// Read state. Reminder items are informational and always read;
    /// feedback items carry the persisted flag.
    pub is_read: bool,
}

/// The merged, time-descending notification feed for one elder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationFeed {
    /// Items sorted newest first
    pub items: Vec<NotificationItem>,

    /// Number of unread feedback entries
    pub unread_feedback_count: usize,
}
