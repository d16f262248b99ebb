//! Event-data provider seam: listing, creation, moderation, RSVP, check-in.
//!
//! The store only depends on the [`EventProvider`] trait. The bundled
//! [`FixtureEventProvider`] serves a canned in-memory collection and is what
//! the bootstrap seeds from; a real HTTP-backed implementation would satisfy
//! the same contract.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::event::{Event, EventDraft, EventFilter, ModerationStatus};

/// Errors the event provider can return.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// No event exists with the given id.
    #[error("event not found: {0}")]
    NotFound(String),

    /// The event has reached its capacity ceiling.
    #[error("event is full: {0}")]
    EventFull(String),

    /// The event is not accepting RSVPs.
    #[error("RSVPs are closed for event {0}")]
    RsvpClosed(String),

    /// The event has not been approved by a moderator.
    #[error("event is not approved: {0}")]
    NotApproved(String),

    /// The user already holds an RSVP for this event.
    #[error("user {user_id} already responded to event {event_id}")]
    AlreadyResponded {
        /// The user that already responded.
        user_id: String,
        /// The event in question.
        event_id: String,
    },

    /// The user already checked in to this event.
    #[error("user {user_id} already checked in to event {event_id}")]
    AlreadyCheckedIn {
        /// The user that already checked in.
        user_id: String,
        /// The event in question.
        event_id: String,
    },

    /// The provider itself failed (network, backend outage).
    #[error("event provider unavailable: {0}")]
    Unavailable(String),
}

/// Event collection contract consumed by the store and its callers.
#[async_trait]
pub trait EventProvider: Send + Sync {
    /// List events matching `filter`, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Unavailable`] if the backend cannot be
    /// reached.
    async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>, ProviderError>;

    /// Fetch a single event by id.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] on a miss.
    async fn get_by_id(&self, id: &str) -> Result<Event, ProviderError>;

    /// Create an event from a draft; the stored record (with generated id,
    /// timestamp, and `Pending` status) is returned.
    async fn create(&self, draft: EventDraft) -> Result<Event, ProviderError>;

    /// Approve a pending event.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] on a miss.
    async fn approve(&self, id: &str) -> Result<Event, ProviderError>;

    /// Reject a pending event with a reason.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] on a miss.
    async fn reject(&self, id: &str, reason: &str) -> Result<Event, ProviderError>;

    /// RSVP a user to an event, incrementing the attendee count.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotApproved`], [`ProviderError::RsvpClosed`],
    /// [`ProviderError::EventFull`], or [`ProviderError::AlreadyResponded`]
    /// when the capacity rules reject the RSVP.
    async fn rsvp(&self, event_id: &str, user_id: &str) -> Result<Event, ProviderError>;

    /// Record a check-in for a user who scanned the event QR code.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::NotFound`] on a miss or
    /// [`ProviderError::AlreadyCheckedIn`] for a duplicate scan.
    async fn check_in(&self, event_id: &str, user_id: &str) -> Result<Event, ProviderError>;
}

/// Mutable fixture state behind one lock: the event list plus the RSVP and
/// check-in registries keyed by `(event_id, user_id)`.
#[derive(Debug, Default)]
struct FixtureState {
    events: Vec<Event>,
    rsvps: HashSet<(String, String)>,
    check_ins: HashSet<(String, String)>,
}

/// In-memory [`EventProvider`] backed by a `Vec<Event>`.
#[derive(Debug, Default)]
pub struct FixtureEventProvider {
    state: Mutex<FixtureState>,
}

impl FixtureEventProvider {
    /// Create a provider with no events.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider pre-loaded with a small campus program.
    ///
    /// The sample set deliberately mixes moderation statuses so list
    /// filtering and the moderation flow have something to chew on.
    pub fn with_sample_events() -> Self {
        let provider = Self::new();
        {
            let mut state = provider.state();
            state.events = sample_events();
        }
        provider
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FixtureState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the event with a matching id, applying `mutate` to a copy.
    ///
    /// Whole-record replacement: the closure edits a clone and the clone is
    /// swapped in, so concurrent readers never see a half-edited record.
    fn update_where<F>(&self, id: &str, mutate: F) -> Result<Event, ProviderError>
    where
        F: FnOnce(&mut Event) -> Result<(), ProviderError>,
    {
        let mut state = self.state();
        let slot = state
            .events
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| ProviderError::NotFound(id.to_owned()))?;
        let mut updated = slot.clone();
        mutate(&mut updated)?;
        *slot = updated.clone();
        Ok(updated)
    }
}

#[async_trait]
impl EventProvider for FixtureEventProvider {
    async fn list(&self, filter: &EventFilter) -> Result<Vec<Event>, ProviderError> {
        let state = self.state();
        Ok(state
            .events
            .iter()
            .filter(|e| e.matches(filter))
            .cloned()
            .collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Event, ProviderError> {
        let state = self.state();
        state
            .events
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(id.to_owned()))
    }

    async fn create(&self, draft: EventDraft) -> Result<Event, ProviderError> {
        let event = draft.into_event();
        tracing::debug!(event_id = %event.id, title = %event.title, "fixture event created");
        self.state().events.push(event.clone());
        Ok(event)
    }

    async fn approve(&self, id: &str) -> Result<Event, ProviderError> {
        self.update_where(id, |event| {
            event.status = ModerationStatus::Approved;
            event.rejection_reason = None;
            Ok(())
        })
    }

    async fn reject(&self, id: &str, reason: &str) -> Result<Event, ProviderError> {
        self.update_where(id, |event| {
            event.status = ModerationStatus::Rejected;
            event.rejection_reason = Some(reason.to_owned());
            Ok(())
        })
    }

    async fn rsvp(&self, event_id: &str, user_id: &str) -> Result<Event, ProviderError> {
        let mut state = self.state();
        if state
            .rsvps
            .contains(&(event_id.to_owned(), user_id.to_owned()))
        {
            return Err(ProviderError::AlreadyResponded {
                user_id: user_id.to_owned(),
                event_id: event_id.to_owned(),
            });
        }

        let slot = state
            .events
            .iter_mut()
            .find(|e| e.id == event_id)
            .ok_or_else(|| ProviderError::NotFound(event_id.to_owned()))?;

        if slot.status != ModerationStatus::Approved {
            return Err(ProviderError::NotApproved(event_id.to_owned()));
        }
        if !slot.rsvp_open {
            return Err(ProviderError::RsvpClosed(event_id.to_owned()));
        }
        if slot.attendees >= slot.max_attendees {
            return Err(ProviderError::EventFull(event_id.to_owned()));
        }

        let mut updated = slot.clone();
        updated.attendees += 1;
        *slot = updated.clone();
        state.rsvps.insert((event_id.to_owned(), user_id.to_owned()));
        Ok(updated)
    }

    async fn check_in(&self, event_id: &str, user_id: &str) -> Result<Event, ProviderError> {
        let mut state = self.state();
        if state
            .check_ins
            .contains(&(event_id.to_owned(), user_id.to_owned()))
        {
            return Err(ProviderError::AlreadyCheckedIn {
                user_id: user_id.to_owned(),
                event_id: event_id.to_owned(),
            });
        }

        let event = state
            .events
            .iter()
            .find(|e| e.id == event_id)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(event_id.to_owned()))?;

        state
            .check_ins
            .insert((event_id.to_owned(), user_id.to_owned()));
        tracing::debug!(event_id = %event_id, user_id = %user_id, "check-in recorded");
        Ok(event)
    }
}

/// The canned fixture set: three events across categories and statuses.
fn sample_events() -> Vec<Event> {
    let mut welcome = EventDraft {
        title: "Welcome Week Mixer".into(),
        description: "Meet your class and the student council".into(),
        category: "social".into(),
        starts_at: 1_757_000_000_000,
        location: "Main Quad".into(),
        organizer: "Student Council".into(),
        max_attendees: 200,
        public: true,
        rsvp_open: true,
        tags: vec!["welcome".into(), "freshers".into()],
    }
    .into_event();
    welcome.status = ModerationStatus::Approved;

    let mut colloquium = EventDraft {
        title: "Physics Colloquium".into(),
        description: "Guest lecture on gravitational waves".into(),
        category: "academic".into(),
        starts_at: 1_757_400_000_000,
        location: "Lecture Hall B".into(),
        organizer: "Physics Society".into(),
        max_attendees: 80,
        public: true,
        rsvp_open: true,
        tags: vec!["physics".into(), "lecture".into()],
    }
    .into_event();
    colloquium.status = ModerationStatus::Approved;

    let midnight_run = EventDraft {
        title: "Midnight Fun Run".into(),
        description: "5k around campus, glow sticks provided".into(),
        category: "sports".into(),
        starts_at: 1_757_800_000_000,
        location: "Stadium Gate 3".into(),
        organizer: "u-2".into(),
        max_attendees: 50,
        public: true,
        rsvp_open: false,
        tags: vec!["running".into()],
    }
    .into_event(); // stays Pending

    vec![welcome, colloquium, midnight_run]
}
