//! Crate-level error type for suspending store operations.

use crate::auth::AuthError;
use crate::provider::ProviderError;

/// Error returned by the store's suspending operations (`sign_in`,
/// `register`, provider-backed refreshes).
///
/// Synchronous actions are total and have no failure mode; this type only
/// carries the caller-visible failures. Before a `StoreError` is returned,
/// the store has already recorded the message in its `error` field and
/// cleared the loading flag.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Credential exchange failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The event-data provider rejected or could not serve the operation.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Persistence-layer I/O failure surfaced from a caller-initiated path.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_displays_inner() {
        let err = StoreError::from(AuthError::InvalidCredentials);
        assert_eq!(err.to_string(), "invalid email or password");
    }

    #[test]
    fn provider_error_displays_inner() {
        let err = StoreError::from(ProviderError::NotFound("e-1".into()));
        assert_eq!(err.to_string(), "event not found: e-1");
    }

    #[test]
    fn io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = StoreError::from(io_err);
        assert!(err.to_string().contains("access denied"));
    }

    // Verify `Send + Sync` bounds are satisfied so errors can cross thread
    // boundaries, which is required for use with `tokio` tasks.
    const _: () = {
        #[allow(dead_code)]
        fn assert_send_sync<T: Send + Sync>() {}

        #[allow(dead_code)]
        fn check() {
            assert_send_sync::<StoreError>();
        }
    };
}
