//! In-app notification records.
//!
//! Notifications are prepended by the store, so the collection is always
//! newest-first by construction rather than by timestamp comparison.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::now_millis;

/// The visual/semantic category of a notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Neutral informational message.
    #[default]
    Info,
    /// A completed action (event approved, RSVP confirmed).
    Success,
    /// A failed action the user should know about.
    Error,
    /// A reminder for an upcoming event.
    Reminder,
}

/// An in-app notification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Unique notification identifier, assigned at creation.
    pub id: String,
    /// Short headline.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Semantic category.
    pub kind: NotificationKind,
    /// Whether the user has read it. Starts false; only ever flips to true.
    pub read: bool,
    /// The event this notification refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
}

/// Caller-supplied fields for a new notification.
///
/// The store assigns the id, creation timestamp, and `read = false`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationDraft {
    /// Short headline.
    pub title: String,
    /// Message body.
    pub message: String,
    /// Semantic category.
    pub kind: NotificationKind,
    /// The event this notification refers to, if any.
    pub event_id: Option<String>,
}

impl NotificationDraft {
    /// Materialize this draft into a stored [`Notification`].
    pub fn into_notification(self) -> Notification {
        Notification {
            id: Uuid::new_v4().to_string(),
            title: self.title,
            message: self.message,
            kind: self.kind,
            read: false,
            event_id: self.event_id,
            created_at: now_millis(),
        }
    }
}
