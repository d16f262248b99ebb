//! Client-side application state store for campus event management.
//!
//! The [`AppStore`] is the single source of truth for the session, the
//! events and notifications collections, and the global loading/error
//! flags. It is an explicit handle (cheap to clone, safe to share) rather
//! than an ambient context: collaborators -- the key-value persistence
//! layer, the auth provider, and the event-data provider -- are injected
//! through [`AppStoreBuilder`], and fixture implementations of each are
//! bundled for running without a backend.

mod auth;
pub use auth::{AuthError, AuthProvider, AuthResponse, FixtureAuthProvider, Registration};
mod checkin;
pub use checkin::{CheckinError, QrPayload, decode_payload};
mod error;
pub use error::StoreError;
mod event;
pub use event::{Event, EventDraft, EventFilter, ModerationStatus, new_event_id};
mod notification;
pub use notification::{Notification, NotificationDraft, NotificationKind};
mod observer;
pub use observer::{SESSION_KEY, SessionPersistor, StateChange, StateObserver};
mod provider;
pub use provider::{EventProvider, FixtureEventProvider, ProviderError};
mod session;
pub use session::{Role, Session, User};
mod storage;
pub use storage::{FileKv, KeyValueStore, MemoryKv};
mod store;
pub use store::{AppState, AppStore, AppStoreBuilder};
