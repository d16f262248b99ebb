//! The application state store: single source of truth for session, events,
//! notifications, and the global loading/error flags.
//!
//! The store is opened via [`AppStoreBuilder`], which injects the key-value
//! layer, auth provider, event provider, and any extra commit observers,
//! then runs the bootstrap (session restore + event seeding). All mutations
//! go through named actions; each action commits atomically under one write
//! lock and then invokes the registered observers outside the lock.

use std::sync::{Arc, RwLock, RwLockWriteGuard};

use crate::auth::{AuthProvider, FixtureAuthProvider, Registration};
use crate::error::StoreError;
use crate::event::{Event, EventDraft, EventFilter};
use crate::notification::{Notification, NotificationDraft};
use crate::observer::{SESSION_KEY, SessionPersistor, StateChange, StateObserver};
use crate::provider::{EventProvider, FixtureEventProvider};
use crate::session::{Session, User};
use crate::storage::{KeyValueStore, MemoryKv};

/// The complete client-side application state.
///
/// `events` is insertion-ordered; `notifications` is newest-first by
/// construction. Both are always present (possibly empty), never null.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// The current authentication context.
    pub session: Session,
    /// All known events, in insertion order.
    pub events: Vec<Event>,
    /// All notifications, newest first.
    pub notifications: Vec<Notification>,
    /// Whether a suspending operation is in flight.
    pub loading: bool,
    /// The last user-visible error message, if any.
    pub error: Option<String>,
}

/// Shared innards behind the cheap-to-clone [`AppStore`] handle.
struct StoreInner {
    state: RwLock<AppState>,
    auth: Arc<dyn AuthProvider>,
    provider: Arc<dyn EventProvider>,
    kv: Arc<dyn KeyValueStore>,
    observers: Vec<Arc<dyn StateObserver>>,
}

/// Handle to the application state store.
///
/// `Clone` is cheap -- all internal state is `Arc`-wrapped, so every clone
/// observes and mutates the same state. Mutations are applied atomically
/// and sequentially relative to each other; the suspending operations
/// (`sign_in`, `register`, `logout`, the bootstrap) await their provider
/// outside the state lock, so overlapping calls race last-write-wins on
/// whichever commits last.
#[derive(Clone)]
pub struct AppStore {
    inner: Arc<StoreInner>,
}

// Manual `Debug` because the provider trait objects are not `Debug`.
impl std::fmt::Debug for AppStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStore")
            .field("state", &self.state())
            .finish()
    }
}

impl AppStore {
    /// Start configuring a store.
    pub fn builder() -> AppStoreBuilder {
        AppStoreBuilder::new()
    }

    /// A snapshot of the current state.
    pub fn state(&self) -> AppState {
        self.read().clone()
    }

    /// The current session.
    pub fn session(&self) -> Session {
        self.read().session.clone()
    }

    /// Whether a suspending operation is in flight.
    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    /// The last user-visible error message, if any.
    pub fn error(&self) -> Option<String> {
        self.read().error.clone()
    }

    // --- Synchronous actions ------------------------------------------------
    //
    // Total over valid-shaped input: lookups that miss are silent no-ops,
    // never errors.

    /// Replace the loading flag.
    pub fn set_loading(&self, loading: bool) {
        self.commit(StateChange::Flags, |state| state.loading = loading);
    }

    /// Replace the error field.
    ///
    /// Also forces `loading` to false: an error ends whatever operation was
    /// in flight. This coupling is part of the contract, not incidental.
    pub fn set_error(&self, message: Option<String>) {
        self.commit(StateChange::Flags, |state| {
            state.error = message;
            state.loading = false;
        });
    }

    /// Replace the events collection wholesale (used after a fetch).
    pub fn set_events(&self, events: Vec<Event>) {
        self.commit(StateChange::Events, |state| state.events = events);
    }

    /// Materialize a draft and append it to the events collection.
    ///
    /// Returns the stored record, including the generated id and creation
    /// timestamp.
    pub fn add_event(&self, draft: EventDraft) -> Event {
        let event = draft.into_event();
        tracing::debug!(event_id = %event.id, title = %event.title, "event added");
        self.commit(StateChange::Events, |state| {
            state.events.push(event.clone());
        });
        event
    }

    /// Replace the event whose id matches `event.id`.
    ///
    /// Whole-record replacement; a silent no-op if no event matches.
    pub fn update_event(&self, event: Event) {
        self.commit(StateChange::Events, |state| {
            if let Some(slot) = state.events.iter_mut().find(|e| e.id == event.id) {
                *slot = event;
            }
        });
    }

    /// Remove the event with the matching id; a no-op if absent.
    pub fn delete_event(&self, id: &str) {
        self.commit(StateChange::Events, |state| {
            state.events.retain(|e| e.id != id);
        });
    }

    /// Materialize a draft and prepend it to the notifications collection.
    ///
    /// Newest-first ordering is maintained by construction: the new item is
    /// always at index 0.
    pub fn add_notification(&self, draft: NotificationDraft) -> Notification {
        let notification = draft.into_notification();
        self.commit(StateChange::Notifications, |state| {
            state.notifications.insert(0, notification.clone());
        });
        notification
    }

    /// Flip `read` to true on the matching notification; a no-op if absent.
    pub fn mark_notification_read(&self, id: &str) {
        self.commit(StateChange::Notifications, |state| {
            if let Some(n) = state.notifications.iter_mut().find(|n| n.id == id) {
                n.read = true;
            }
        });
    }

    /// Empty the notifications collection.
    pub fn clear_notifications(&self) {
        self.commit(StateChange::Notifications, |state| {
            state.notifications.clear();
        });
    }

    // --- Suspending actions -------------------------------------------------

    /// Transition the session to `Authenticated(user)`.
    ///
    /// Clears the error field and the loading flag on completion. Session
    /// persistence happens through the commit observers, best-effort. The
    /// transition itself cannot fail; failures from the credential exchange
    /// surface through [`sign_in`](AppStore::sign_in) and
    /// [`register`](AppStore::register), which route through here.
    pub async fn login(&self, user: User) -> Result<(), StoreError> {
        tracing::debug!(user_id = %user.id, "session authenticated");
        self.commit(StateChange::Session, |state| {
            state.session = Session::Authenticated(user);
            state.error = None;
            state.loading = false;
        });
        Ok(())
    }

    /// Exchange credentials for a profile via the auth provider, then log
    /// the returned user in.
    ///
    /// While the exchange is in flight the loading flag is true. On failure
    /// the error field is set to the provider's message, loading is cleared,
    /// and the failure is returned -- never panicked across the boundary.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, StoreError> {
        self.set_loading(true);
        match self.inner.auth.login(email, password).await {
            Ok(response) => {
                self.login(response.user.clone()).await?;
                Ok(response.user)
            }
            Err(e) => {
                tracing::debug!(error = %e, "sign-in failed");
                self.set_error(Some(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Create an account via the auth provider, then log the new user in.
    ///
    /// Same loading/error behavior as [`sign_in`](AppStore::sign_in).
    pub async fn register(&self, registration: Registration) -> Result<User, StoreError> {
        self.set_loading(true);
        match self.inner.auth.register(registration).await {
            Ok(response) => {
                self.login(response.user.clone()).await?;
                Ok(response.user)
            }
            Err(e) => {
                tracing::debug!(error = %e, "registration failed");
                self.set_error(Some(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Sign out: reset session, events, notifications, and both flags.
    ///
    /// The session commit triggers the persistence observer, which deletes
    /// the stored session key; a failure there is logged and swallowed, so
    /// logout itself never fails.
    pub async fn logout(&self) {
        tracing::debug!("session cleared");
        self.commit(StateChange::Session, |state| *state = AppState::default());
    }

    // --- Provider-backed operations ----------------------------------------
    //
    // Each fetches through the event provider and folds the result back
    // into local state. Failures set the error field (so a screen can show
    // the message) and are also returned as structured results.

    /// Re-fetch the events collection from the provider.
    pub async fn refresh_events(&self, filter: &EventFilter) -> Result<(), StoreError> {
        self.set_loading(true);
        match self.inner.provider.list(filter).await {
            Ok(events) => {
                self.commit(StateChange::Events, |state| {
                    state.events = events;
                    state.loading = false;
                });
                Ok(())
            }
            Err(e) => {
                self.set_error(Some(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Create an event through the provider and append the stored record.
    pub async fn create_event(&self, draft: EventDraft) -> Result<Event, StoreError> {
        match self.inner.provider.create(draft).await {
            Ok(event) => {
                self.commit(StateChange::Events, |state| {
                    state.events.push(event.clone());
                });
                Ok(event)
            }
            Err(e) => {
                self.set_error(Some(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Approve a pending event and fold the updated record into state.
    pub async fn approve_event(&self, id: &str) -> Result<Event, StoreError> {
        match self.inner.provider.approve(id).await {
            Ok(event) => {
                self.update_event(event.clone());
                Ok(event)
            }
            Err(e) => {
                self.set_error(Some(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Reject a pending event and fold the updated record into state.
    pub async fn reject_event(&self, id: &str, reason: &str) -> Result<Event, StoreError> {
        match self.inner.provider.reject(id, reason).await {
            Ok(event) => {
                self.update_event(event.clone());
                Ok(event)
            }
            Err(e) => {
                self.set_error(Some(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// RSVP the given user to an event and fold the updated record into
    /// state.
    pub async fn rsvp(&self, event_id: &str, user_id: &str) -> Result<Event, StoreError> {
        match self.inner.provider.rsvp(event_id, user_id).await {
            Ok(event) => {
                self.update_event(event.clone());
                Ok(event)
            }
            Err(e) => {
                tracing::debug!(event_id = %event_id, error = %e, "RSVP rejected");
                self.set_error(Some(e.to_string()));
                Err(e.into())
            }
        }
    }

    /// Record a check-in for a user who scanned an event QR code.
    pub async fn check_in(&self, event_id: &str, user_id: &str) -> Result<Event, StoreError> {
        match self.inner.provider.check_in(event_id, user_id).await {
            Ok(event) => Ok(event),
            Err(e) => {
                self.set_error(Some(e.to_string()));
                Err(e.into())
            }
        }
    }

    // --- Internals ----------------------------------------------------------

    /// Apply a mutation under the write lock, then notify observers with a
    /// snapshot of the committed state.
    ///
    /// Observers run outside the lock so a slow observer cannot block
    /// readers, and best-effort: nothing they do is observed by the caller.
    fn commit(&self, change: StateChange, mutate: impl FnOnce(&mut AppState)) {
        let snapshot = {
            let mut state = self.write();
            mutate(&mut state);
            state.clone()
        };
        for observer in &self.inner.observers {
            observer.state_committed(change, &snapshot);
        }
    }

    /// Read lock, recovering from poisoning.
    ///
    /// Every mutation replaces whole records, so state is structurally
    /// valid even if a panicking thread held the lock.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, AppState> {
        self.inner.state.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Write lock, recovering from poisoning.
    fn write(&self) -> RwLockWriteGuard<'_, AppState> {
        self.inner.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// The bootstrap: restore a persisted session and seed events.
    ///
    /// Loading is true for the duration and false afterwards regardless of
    /// outcome. Every failure in here is logged, never surfaced -- the
    /// store simply starts with defaults.
    async fn bootstrap(&self) {
        self.set_loading(true);

        // Restore the persisted session, if any. Stored data is trusted:
        // no signature or expiry check. Corrupt data is a warning, not an
        // error; the session stays Unauthenticated.
        match self.inner.kv.get(SESSION_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<User>(&raw) {
                Ok(user) => {
                    tracing::debug!(user_id = %user.id, "restored persisted session");
                    self.commit(StateChange::Session, |state| {
                        state.session = Session::Authenticated(user);
                    });
                }
                Err(e) => {
                    tracing::warn!(
                        key = SESSION_KEY,
                        error = %e,
                        "persisted session is unparseable; starting unauthenticated"
                    );
                }
            },
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key = SESSION_KEY, error = %e, "failed to read persisted session");
            }
        }

        // Seed the events collection from the configured provider.
        match self.inner.provider.list(&EventFilter::default()).await {
            Ok(events) => {
                self.commit(StateChange::Events, |state| state.events = events);
            }
            Err(e) => {
                tracing::warn!(error = %e, "initial event load failed; starting empty");
            }
        }

        self.set_loading(false);
    }
}

/// Builder for configuring and opening an [`AppStore`].
///
/// Collaborators not supplied fall back to fixtures: an in-memory key-value
/// layer, the sample auth roster, and the sample event set. The session
/// persistor is always registered over the configured key-value layer;
/// extra observers are appended after it.
///
/// # Examples
///
/// ```
/// use campusconnect_core::AppStore;
///
/// # async fn example() {
/// let store = AppStore::builder().open().await;
/// assert!(!store.session().is_authenticated());
/// # }
/// ```
pub struct AppStoreBuilder {
    auth: Option<Arc<dyn AuthProvider>>,
    provider: Option<Arc<dyn EventProvider>>,
    kv: Option<Arc<dyn KeyValueStore>>,
    observers: Vec<Arc<dyn StateObserver>>,
}

impl AppStoreBuilder {
    /// Create a new builder with no configuration.
    pub fn new() -> Self {
        Self {
            auth: None,
            provider: None,
            kv: None,
            observers: Vec::new(),
        }
    }

    /// Set the auth provider used by `sign_in` and `register`.
    pub fn auth_provider(mut self, auth: Arc<dyn AuthProvider>) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Set the event-data provider used by the bootstrap and the
    /// provider-backed operations.
    pub fn event_provider(mut self, provider: Arc<dyn EventProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the key-value layer used for session persistence.
    ///
    /// Pass a [`crate::storage::FileKv`] to survive process restarts; the
    /// default is in-memory.
    pub fn key_value(mut self, kv: Arc<dyn KeyValueStore>) -> Self {
        self.kv = Some(kv);
        self
    }

    /// Register an additional commit observer.
    ///
    /// Observers are invoked in registration order, after the built-in
    /// session persistor.
    pub fn observer(mut self, observer: Arc<dyn StateObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Build the store and run the bootstrap.
    ///
    /// Bootstrap failures (unreadable or corrupt persisted session, event
    /// seed failure) are logged and never surfaced, so opening itself
    /// cannot fail.
    pub async fn open(self) -> AppStore {
        let kv: Arc<dyn KeyValueStore> = self.kv.unwrap_or_else(|| Arc::new(MemoryKv::new()));
        let auth: Arc<dyn AuthProvider> = self
            .auth
            .unwrap_or_else(|| Arc::new(FixtureAuthProvider::with_sample_users()));
        let provider: Arc<dyn EventProvider> = self
            .provider
            .unwrap_or_else(|| Arc::new(FixtureEventProvider::with_sample_events()));

        let mut observers: Vec<Arc<dyn StateObserver>> =
            vec![Arc::new(SessionPersistor::new(kv.clone()))];
        observers.extend(self.observers);

        let store = AppStore {
            inner: Arc::new(StoreInner {
                state: RwLock::new(AppState::default()),
                auth,
                provider,
                kv,
                observers,
            }),
        };
        store.bootstrap().await;
        store
    }
}

impl Default for AppStoreBuilder {
    fn default() -> Self {
        Self::new()
    }
}
