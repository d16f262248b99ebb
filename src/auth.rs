//! Auth provider seam: credential exchange for a session token and profile.
//!
//! The store only depends on the [`AuthProvider`] trait. The bundled
//! [`FixtureAuthProvider`] keeps an in-memory credential table and stands in
//! for a real HTTP-backed implementation (method, path, bearer header) that
//! would satisfy the same contract.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::session::{Role, User};

/// A successful credential exchange: the user profile plus an opaque bearer
/// token for subsequent API calls.
#[derive(Debug, Clone)]
pub struct AuthResponse {
    /// The authenticated user's profile.
    pub user: User,
    /// Opaque bearer token.
    pub token: String,
}

/// Errors the auth provider can return.
///
/// Every variant is a user-initiated action failure: surfaced to the caller
/// as a structured result, never panicked across the store boundary.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Email/password pair did not match a known account.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// Registration attempted with an email that already has an account.
    #[error("an account already exists for {0}")]
    EmailTaken(String),

    /// The submitted form fields failed validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The provider itself failed (network, backend outage).
    #[error("auth provider unavailable: {0}")]
    Unavailable(String),
}

/// Profile fields submitted at registration time.
#[derive(Debug, Clone, Default)]
pub struct Registration {
    /// Display name.
    pub name: String,
    /// Email address, used as the login identifier.
    pub email: String,
    /// Chosen password.
    pub password: String,
    /// Campus role.
    pub role: Role,
    /// Department or faculty.
    pub department: String,
}

/// Credential exchange contract consumed by the store.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Exchange an email/password pair for a profile and token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] on a mismatch and
    /// [`AuthError::InvalidInput`] for malformed fields.
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError>;

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::EmailTaken`] for a duplicate email and
    /// [`AuthError::InvalidInput`] for malformed fields.
    async fn register(&self, registration: Registration) -> Result<AuthResponse, AuthError>;
}

/// Validate login/registration form fields.
///
/// The checks mirror what a signup form enforces client-side: a non-empty
/// email containing `@`, and a password of at least 6 characters.
fn validate_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    if email.trim().is_empty() {
        return Err(AuthError::InvalidInput("email must not be empty".into()));
    }
    if !email.contains('@') {
        return Err(AuthError::InvalidInput(format!(
            "{email:?} is not a valid email address"
        )));
    }
    if password.len() < 6 {
        return Err(AuthError::InvalidInput(
            "password must be at least 6 characters".into(),
        ));
    }
    Ok(())
}

/// One account row in the fixture table.
#[derive(Debug, Clone)]
struct Account {
    user: User,
    password: String,
}

/// In-memory [`AuthProvider`] backed by a fixed credential table.
#[derive(Debug, Default)]
pub struct FixtureAuthProvider {
    accounts: Mutex<HashMap<String, Account>>,
    latency: Option<Duration>,
}

impl FixtureAuthProvider {
    /// Create a provider with no accounts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate network latency: every exchange suspends for `delay` before
    /// touching the credential table.
    pub fn with_latency(mut self, delay: Duration) -> Self {
        self.latency = Some(delay);
        self
    }

    /// Suspend for the configured latency, if any.
    async fn simulate_latency(&self) {
        if let Some(delay) = self.latency {
            tokio::time::sleep(delay).await;
        }
    }

    /// Create a provider pre-loaded with a small campus roster.
    ///
    /// All sample accounts use the password `"password123"`.
    pub fn with_sample_users() -> Self {
        let provider = Self::new();
        let roster = [
            ("u-1", "Alice Chen", Role::Student, "Physics", "alice@campus.edu"),
            (
                "u-2",
                "Ben Okafor",
                Role::ClassRepresentative,
                "Computer Science",
                "ben@campus.edu",
            ),
            ("u-3", "Prof. Diaz", Role::Admin, "Student Affairs", "diaz@campus.edu"),
        ];
        for (id, name, role, department, email) in roster {
            provider.add_account(
                User {
                    id: id.into(),
                    name: name.into(),
                    role,
                    department: department.into(),
                    email: email.into(),
                    phone: None,
                },
                "password123",
            );
        }
        provider
    }

    /// Insert an account directly, keyed by its email.
    pub fn add_account(&self, user: User, password: &str) {
        self.accounts().insert(
            user.email.clone(),
            Account {
                user,
                password: password.to_owned(),
            },
        );
    }

    fn accounts(&self) -> std::sync::MutexGuard<'_, HashMap<String, Account>> {
        self.accounts.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AuthProvider for FixtureAuthProvider {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        self.simulate_latency().await;
        validate_credentials(email, password)?;

        let accounts = self.accounts();
        let account = accounts.get(email).ok_or(AuthError::InvalidCredentials)?;
        if account.password != password {
            return Err(AuthError::InvalidCredentials);
        }

        tracing::debug!(user_id = %account.user.id, "fixture login succeeded");
        Ok(AuthResponse {
            user: account.user.clone(),
            token: Uuid::new_v4().to_string(),
        })
    }

    async fn register(&self, registration: Registration) -> Result<AuthResponse, AuthError> {
        self.simulate_latency().await;
        validate_credentials(&registration.email, &registration.password)?;
        if registration.name.trim().is_empty() {
            return Err(AuthError::InvalidInput("name must not be empty".into()));
        }

        let mut accounts = self.accounts();
        if accounts.contains_key(&registration.email) {
            return Err(AuthError::EmailTaken(registration.email));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: registration.name,
            role: registration.role,
            department: registration.department,
            email: registration.email.clone(),
            phone: None,
        };
        accounts.insert(
            registration.email,
            Account {
                user: user.clone(),
                password: registration.password,
            },
        );

        tracing::debug!(user_id = %user.id, "fixture registration succeeded");
        Ok(AuthResponse {
            user,
            token: Uuid::new_v4().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sample_login_succeeds() {
        let provider = FixtureAuthProvider::with_sample_users();
        let response = provider
            .login("alice@campus.edu", "password123")
            .await
            .expect("login should succeed");
        assert_eq!(response.user.id, "u-1");
        assert!(!response.token.is_empty());
    }

    #[tokio::test]
    async fn wrong_password_rejected() {
        let provider = FixtureAuthProvider::with_sample_users();
        let err = provider
            .login("alice@campus.edu", "wrong-pass")
            .await
            .expect_err("login should fail");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn unknown_email_rejected() {
        let provider = FixtureAuthProvider::with_sample_users();
        let err = provider
            .login("nobody@campus.edu", "password123")
            .await
            .expect_err("login should fail");
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn malformed_email_rejected_before_lookup() {
        let provider = FixtureAuthProvider::new();
        let err = provider
            .login("not-an-email", "password123")
            .await
            .expect_err("login should fail");
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn short_password_rejected() {
        let provider = FixtureAuthProvider::new();
        let err = provider
            .login("alice@campus.edu", "abc")
            .await
            .expect_err("login should fail");
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn latency_is_applied_before_the_exchange() {
        let provider =
            FixtureAuthProvider::with_sample_users().with_latency(Duration::from_millis(20));
        let start = std::time::Instant::now();
        provider
            .login("alice@campus.edu", "password123")
            .await
            .expect("login should succeed");
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn register_then_login_roundtrip() {
        let provider = FixtureAuthProvider::new();
        let response = provider
            .register(Registration {
                name: "Dana".into(),
                email: "dana@campus.edu".into(),
                password: "hunter22".into(),
                role: Role::Student,
                department: "History".into(),
            })
            .await
            .expect("registration should succeed");
        assert!(!response.user.id.is_empty());

        let again = provider
            .login("dana@campus.edu", "hunter22")
            .await
            .expect("login after registration should succeed");
        assert_eq!(again.user.id, response.user.id);
    }

    #[tokio::test]
    async fn duplicate_registration_rejected() {
        let provider = FixtureAuthProvider::with_sample_users();
        let err = provider
            .register(Registration {
                name: "Impostor".into(),
                email: "alice@campus.edu".into(),
                password: "secret99".into(),
                role: Role::Student,
                department: "Physics".into(),
            })
            .await
            .expect_err("duplicate registration should fail");
        assert!(matches!(err, AuthError::EmailTaken(_)));
    }

    #[tokio::test]
    async fn empty_name_rejected_on_registration() {
        let provider = FixtureAuthProvider::new();
        let err = provider
            .register(Registration {
                name: "  ".into(),
                email: "x@campus.edu".into(),
                password: "secret99".into(),
                role: Role::Student,
                department: "History".into(),
            })
            .await
            .expect_err("registration should fail");
        assert!(matches!(err, AuthError::InvalidInput(_)));
    }
}
