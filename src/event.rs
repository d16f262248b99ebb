//! Campus event records, drafts, and list filtering.
//!
//! An [`Event`] is a whole-record value: the store and providers replace
//! events wholesale (keyed by id) rather than patching nested fields, so a
//! reader never observes a partially-updated record.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The moderation lifecycle stage of an event.
///
/// New events start `Pending`; an admin moves them to `Approved` or
/// `Rejected`. Only approved events are joinable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationStatus {
    /// Awaiting an admin decision.
    #[default]
    Pending,
    /// Visible and joinable.
    Approved,
    /// Declined; kept for the organizer's records.
    Rejected,
}

/// A campus event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique event identifier, assigned at creation.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Longer description shown on the detail view.
    pub description: String,
    /// Open category string ("academic", "social", "sports", ...).
    pub category: String,
    /// Scheduled start, epoch milliseconds.
    pub starts_at: i64,
    /// Venue or room.
    pub location: String,
    /// Organizer display name or user id.
    pub organizer: String,
    /// Capacity ceiling.
    pub max_attendees: u32,
    /// Current RSVP count. Invariant: `attendees <= max_attendees`.
    pub attendees: u32,
    /// Whether the event is listed publicly.
    pub public: bool,
    /// Whether RSVPs are currently accepted.
    pub rsvp_open: bool,
    /// Moderation lifecycle stage.
    pub status: ModerationStatus,
    /// Free-form tags for search and filtering.
    pub tags: Vec<String>,
    /// Rejection reason, set only when `status` is `Rejected`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// Creation time, epoch milliseconds.
    pub created_at: i64,
}

impl Event {
    /// Whether a new RSVP would be accepted right now.
    ///
    /// Requires the event to be approved, open for RSVPs, and below its
    /// capacity ceiling.
    pub fn is_joinable(&self) -> bool {
        self.status == ModerationStatus::Approved
            && self.rsvp_open
            && self.attendees < self.max_attendees
    }

    /// Whether this event satisfies every populated field of `filter`.
    pub fn matches(&self, filter: &EventFilter) -> bool {
        if let Some(ref category) = filter.category {
            if !self.category.eq_ignore_ascii_case(category) {
                return false;
            }
        }
        if let Some(status) = filter.status {
            if self.status != status {
                return false;
            }
        }
        if let Some(ref search) = filter.search {
            let needle = search.to_lowercase();
            let hit = self.title.to_lowercase().contains(&needle)
                || self.description.to_lowercase().contains(&needle)
                || self.tags.iter().any(|t| t.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if let Some(day) = filter.day {
            if !same_day(self.starts_at, day) {
                return false;
            }
        }
        true
    }
}

/// Caller-supplied fields for creating a new event.
///
/// The store (or provider) assigns the id, creation timestamp, and initial
/// `Pending` moderation status; everything else comes from the draft.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventDraft {
    /// Display title.
    pub title: String,
    /// Longer description.
    pub description: String,
    /// Open category string.
    pub category: String,
    /// Scheduled start, epoch milliseconds.
    pub starts_at: i64,
    /// Venue or room.
    pub location: String,
    /// Organizer display name or user id.
    pub organizer: String,
    /// Capacity ceiling.
    pub max_attendees: u32,
    /// Whether the event is listed publicly.
    pub public: bool,
    /// Whether RSVPs are accepted.
    pub rsvp_open: bool,
    /// Free-form tags.
    pub tags: Vec<String>,
}

impl EventDraft {
    /// Materialize this draft into a stored [`Event`].
    ///
    /// Assigns a fresh UUID v4 identifier and the current time. UUIDs keep
    /// identifiers unique even for drafts materialized within the same
    /// millisecond.
    pub fn into_event(self) -> Event {
        Event {
            id: new_event_id(),
            title: self.title,
            description: self.description,
            category: self.category,
            starts_at: self.starts_at,
            location: self.location,
            organizer: self.organizer,
            max_attendees: self.max_attendees,
            attendees: 0,
            public: self.public,
            rsvp_open: self.rsvp_open,
            status: ModerationStatus::Pending,
            tags: self.tags,
            rejection_reason: None,
            created_at: now_millis(),
        }
    }
}

/// Criteria for listing events.
///
/// Every field is optional; an empty filter matches everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Exact category (case-insensitive).
    pub category: Option<String>,
    /// Exact moderation status.
    pub status: Option<ModerationStatus>,
    /// Case-insensitive substring match over title, description, and tags.
    pub search: Option<String>,
    /// Any timestamp within the same UTC calendar day as this one.
    pub day: Option<i64>,
}

/// Generate a fresh collision-resistant event identifier.
pub fn new_event_id() -> String {
    Uuid::new_v4().to_string()
}

/// Current wall-clock time as epoch milliseconds.
pub(crate) fn now_millis() -> i64 {
    SystemTime::UNIX_EPOCH
        .elapsed()
        .expect("system clock is before Unix epoch")
        .as_millis() as i64
}

/// Whether two epoch-millisecond timestamps fall on the same UTC day.
fn same_day(a: i64, b: i64) -> bool {
    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    a.div_euclid(DAY_MS) == b.div_euclid(DAY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_draft() -> EventDraft {
        EventDraft {
            title: "Robotics Demo".into(),
            description: "Live demo of the lab robots".into(),
            category: "academic".into(),
            starts_at: 1_700_000_000_000,
            location: "Engineering Hall 2".into(),
            organizer: "u-7".into(),
            max_attendees: 30,
            public: true,
            rsvp_open: true,
            tags: vec!["robotics".into(), "demo".into()],
        }
    }

    #[test]
    fn draft_materializes_with_generated_fields() {
        let event = sample_draft().into_event();
        assert!(!event.id.is_empty());
        assert!(event.created_at > 0);
        assert_eq!(event.status, ModerationStatus::Pending);
        assert_eq!(event.attendees, 0);
    }

    #[test]
    fn rapid_ids_do_not_collide() {
        // All generated within well under a millisecond.
        let ids: Vec<String> = (0..100).map(|_| new_event_id()).collect();
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn joinable_requires_approval_and_capacity() {
        let mut event = sample_draft().into_event();
        assert!(!event.is_joinable(), "pending events are not joinable");

        event.status = ModerationStatus::Approved;
        assert!(event.is_joinable());

        event.attendees = event.max_attendees;
        assert!(!event.is_joinable(), "full events are not joinable");

        event.attendees = 0;
        event.rsvp_open = false;
        assert!(!event.is_joinable(), "closed events are not joinable");
    }

    #[test]
    fn empty_filter_matches_everything() {
        let event = sample_draft().into_event();
        assert!(event.matches(&EventFilter::default()));
    }

    #[test]
    fn filter_by_category_is_case_insensitive() {
        let event = sample_draft().into_event();
        let filter = EventFilter {
            category: Some("Academic".into()),
            ..Default::default()
        };
        assert!(event.matches(&filter));

        let filter = EventFilter {
            category: Some("sports".into()),
            ..Default::default()
        };
        assert!(!event.matches(&filter));
    }

    #[test]
    fn filter_search_covers_title_description_and_tags() {
        let event = sample_draft().into_event();
        for needle in ["robotics", "LIVE DEMO", "demo"] {
            let filter = EventFilter {
                search: Some(needle.into()),
                ..Default::default()
            };
            assert!(event.matches(&filter), "search {needle:?} should match");
        }

        let filter = EventFilter {
            search: Some("chess".into()),
            ..Default::default()
        };
        assert!(!event.matches(&filter));
    }

    #[test]
    fn filter_by_status() {
        let mut event = sample_draft().into_event();
        event.status = ModerationStatus::Approved;

        let filter = EventFilter {
            status: Some(ModerationStatus::Approved),
            ..Default::default()
        };
        assert!(event.matches(&filter));

        let filter = EventFilter {
            status: Some(ModerationStatus::Pending),
            ..Default::default()
        };
        assert!(!event.matches(&filter));
    }

    #[test]
    fn filter_by_day_uses_utc_day_boundaries() {
        const DAY_MS: i64 = 24 * 60 * 60 * 1000;
        let mut event = sample_draft().into_event();
        event.starts_at = 5 * DAY_MS + 1; // just after midnight on day 5

        let filter = EventFilter {
            day: Some(5 * DAY_MS + 20_000_000), // later the same day
            ..Default::default()
        };
        assert!(event.matches(&filter));

        let filter = EventFilter {
            day: Some(6 * DAY_MS),
            ..Default::default()
        };
        assert!(!event.matches(&filter));
    }

    #[test]
    fn event_serde_roundtrip() {
        let event = sample_draft().into_event();
        let json = serde_json::to_string(&event).expect("serialization should succeed");
        let back: Event = serde_json::from_str(&json).expect("deserialization should succeed");
        assert_eq!(back, event);
    }
}
