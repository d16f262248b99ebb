//! Session state machine and user records.
//!
//! A session is either `Unauthenticated` (the initial state) or
//! `Authenticated` with exactly one [`User`]. Transitions happen through
//! the store's `login`/`logout` actions or the bootstrap restore path;
//! nothing else mutates the session.

use serde::{Deserialize, Serialize};

/// The role a user holds on campus.
///
/// Serialized in snake_case so stored sessions remain readable
/// (`"class_representative"`, not `"ClassRepresentative"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// A regular student: can browse, RSVP, and check in.
    #[default]
    Student,
    /// A class representative: can additionally create events.
    ClassRepresentative,
    /// An administrator: can additionally approve or reject events.
    Admin,
}

/// A user profile as returned by the auth provider and held in the session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Campus role.
    pub role: Role,
    /// Department or faculty the user belongs to.
    pub department: String,
    /// Contact email address.
    pub email: String,
    /// Contact phone number, if provided.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// The current authentication context.
///
/// At most one session is active at a time; the store owns the session
/// exclusively and replaces it wholesale on every transition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", content = "user", rename_all = "snake_case")]
pub enum Session {
    /// No user is signed in.
    #[default]
    Unauthenticated,
    /// A user is signed in.
    Authenticated(User),
}

impl Session {
    /// Whether a user is currently signed in.
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Session::Authenticated(_))
    }

    /// The signed-in user, if any.
    pub fn user(&self) -> Option<&User> {
        match self {
            Session::Authenticated(user) => Some(user),
            Session::Unauthenticated => None,
        }
    }
}
