//! Error types for authentication, state persistence, and profile fetches
//!
//! Network and protocol failures are never swallowed by the core; they
//! propagate as typed errors and the embedding layer maps each kind to its
//! user-facing message.

/// Errors from OAuth/OIDC protocol operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthenticationError {
    #[error("authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    #[error("no refresh token available")]
    NoRefreshToken,

    #[error("discovery failed: {0}")]
    DiscoveryFailed(String),

    /// Persistence failure inside a protocol operation. Kept transparent so
    /// callers can still match on [`StorageError`].
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("authentication error: {0}")]
    Unknown(String),
}

/// Errors from persisted-state handling.
///
/// A corrupted stored record surfaces as `DecodeFailed` rather than reading
/// as "not authenticated". The caller decides the recovery policy
/// (typically clear and re-login).
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("no storage backend configured")]
    NotConfigured,

    #[error("failed to decode stored auth state: {0}")]
    DecodeFailed(String),

    #[error("storage backend error: {0}")]
    Backend(#[from] storage::Error),
}

/// Errors from the userinfo fetch, split so callers can message connection
/// problems ("check your connection") and malformed responses ("unexpected
/// response") differently.
#[derive(Debug, thiserror::Error)]
pub enum UserInfoError {
    #[error("userinfo request failed: {0}")]
    Network(String),

    #[error("userinfo response could not be decoded: {0}")]
    Decode(String),

    #[error(transparent)]
    Authentication(#[from] AuthenticationError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors from configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Invalid(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result alias for protocol operations.
pub type Result<T, E = AuthenticationError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_context() {
        let err = AuthenticationError::TokenExchange("endpoint returned 400".into());
        assert_eq!(err.to_string(), "token exchange failed: endpoint returned 400");

        let err = StorageError::DecodeFailed("unexpected end of input".into());
        assert_eq!(
            err.to_string(),
            "failed to decode stored auth state: unexpected end of input"
        );
    }

    #[test]
    fn storage_error_stays_matchable_through_authentication_error() {
        let err = AuthenticationError::from(StorageError::NotConfigured);
        assert!(matches!(
            err,
            AuthenticationError::Storage(StorageError::NotConfigured)
        ));
        // Transparent wrapping: the message is the storage error's own
        assert_eq!(err.to_string(), "no storage backend configured");
    }
}
