//! Commit observers: synchronous hooks invoked after every store mutation.
//!
//! The store commits to in-memory state first, then calls each registered
//! observer with the slice of state that changed and a snapshot of the new
//! state. Observer effects are best-effort relative to the commit: the
//! bundled [`SessionPersistor`] logs and swallows storage failures rather
//! than surfacing them to the caller.

use std::sync::Arc;

use crate::session::Session;
use crate::storage::KeyValueStore;
use crate::store::AppState;

/// Fixed key under which the authenticated user is persisted.
pub const SESSION_KEY: &str = "campusconnect.session.user";

/// Which slice of state a committed mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateChange {
    /// The session transitioned (login, logout, restore).
    Session,
    /// The events collection changed.
    Events,
    /// The notifications collection changed.
    Notifications,
    /// Only the loading/error flags changed.
    Flags,
}

/// A hook invoked synchronously after each committed mutation.
///
/// Observers run outside the state lock and must not panic; they receive an
/// immutable snapshot and cannot veto or amend the commit.
pub trait StateObserver: Send + Sync {
    /// Called once per committed mutation.
    fn state_committed(&self, change: StateChange, state: &AppState);
}

/// Persists the authenticated user to the key-value layer on every session
/// transition.
///
/// Authenticated sessions serialize the user as JSON under [`SESSION_KEY`];
/// unauthenticated sessions delete the key. Non-session commits are ignored,
/// so event and notification churn never rewrites the stored session.
pub struct SessionPersistor {
    kv: Arc<dyn KeyValueStore>,
}

impl SessionPersistor {
    /// Create a persistor writing through the given key-value layer.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }
}

impl StateObserver for SessionPersistor {
    fn state_committed(&self, change: StateChange, state: &AppState) {
        if change != StateChange::Session {
            return;
        }

        let result = match &state.session {
            Session::Authenticated(user) => match serde_json::to_string(user) {
                Ok(json) => self.kv.set(SESSION_KEY, &json),
                Err(e) => {
                    tracing::warn!(error = %e, "failed to serialize session user");
                    return;
                }
            },
            Session::Unauthenticated => self.kv.delete(SESSION_KEY),
        };

        if let Err(e) = result {
            tracing::warn!(
                key = SESSION_KEY,
                error = %e,
                "session persistence failed; in-memory state is already committed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{Role, User};
    use crate::storage::MemoryKv;

    fn state_with_session(session: Session) -> AppState {
        AppState {
            session,
            ..Default::default()
        }
    }

    fn sample_user() -> User {
        User {
            id: "u-1".into(),
            name: "Alice".into(),
            role: Role::Student,
            department: "Physics".into(),
            email: "alice@campus.edu".into(),
            phone: None,
        }
    }

    #[test]
    fn session_commit_writes_key() {
        let kv = Arc::new(MemoryKv::new());
        let persistor = SessionPersistor::new(kv.clone());

        let state = state_with_session(Session::Authenticated(sample_user()));
        persistor.state_committed(StateChange::Session, &state);

        let stored = kv
            .get(SESSION_KEY)
            .expect("get should succeed")
            .expect("session key should be written");
        let user: User = serde_json::from_str(&stored).expect("stored value should be JSON");
        assert_eq!(user.id, "u-1");
    }

    #[test]
    fn logout_commit_deletes_key() {
        let kv = Arc::new(MemoryKv::new());
        kv.set(SESSION_KEY, "{}").expect("set should succeed");
        let persistor = SessionPersistor::new(kv.clone());

        let state = state_with_session(Session::Unauthenticated);
        persistor.state_committed(StateChange::Session, &state);

        assert_eq!(kv.get(SESSION_KEY).expect("get should succeed"), None);
    }

    #[test]
    fn non_session_commits_are_ignored() {
        let kv = Arc::new(MemoryKv::new());
        let persistor = SessionPersistor::new(kv.clone());

        let state = state_with_session(Session::Authenticated(sample_user()));
        persistor.state_committed(StateChange::Events, &state);
        persistor.state_committed(StateChange::Notifications, &state);
        persistor.state_committed(StateChange::Flags, &state);

        assert_eq!(
            kv.get(SESSION_KEY).expect("get should succeed"),
            None,
            "only Session commits should touch the key"
        );
    }

    #[test]
    fn storage_failure_is_swallowed() {
        /// A key-value layer whose writes always fail.
        struct FailingKv;
        impl KeyValueStore for FailingKv {
            fn get(&self, _key: &str) -> std::io::Result<Option<String>> {
                Err(std::io::Error::other("disk on fire"))
            }
            fn set(&self, _key: &str, _value: &str) -> std::io::Result<()> {
                Err(std::io::Error::other("disk on fire"))
            }
            fn delete(&self, _key: &str) -> std::io::Result<()> {
                Err(std::io::Error::other("disk on fire"))
            }
        }

        let persistor = SessionPersistor::new(Arc::new(FailingKv));
        let state = state_with_session(Session::Authenticated(sample_user()));
        // Must not panic; the failure is logged and dropped.
        persistor.state_committed(StateChange::Session, &state);
    }
}
