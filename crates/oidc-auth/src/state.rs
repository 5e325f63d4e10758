//! The persisted authentication state
//!
//! `AuthState` is an immutable value: every update replaces the stored
//! record wholesale, never mutates it in place. It is created by the
//! token-exchange step of redirect handling or by a refresh response,
//! persisted immediately after creation, and destroyed on logout or on an
//! unrecoverable decode failure.

use std::fmt;

/// The persisted record of current authentication.
///
/// A non-null `access_token` means "currently authenticated"; a missing
/// `refresh_token` means refresh is impossible and expiry forces re-login.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct AuthState {
    pub access_token: Option<String>,
    /// Absolute expiration as unix timestamp in milliseconds.
    pub access_token_expiration_time: Option<u64>,
    /// Signed JWT carrying identity claims; only its `email`/`given_name`
    /// claims are consumed here, and it feeds the end-session hint.
    pub id_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl AuthState {
    /// Whether the access token is expired at `now_millis`.
    ///
    /// A state without an expiration timestamp reads as NOT expired: the
    /// provider issued an opaque or non-expiring token. Deliberate policy,
    /// preserved from the original SDK behavior.
    pub fn is_access_token_expired_at(&self, now_millis: u64) -> bool {
        match self.access_token_expiration_time {
            Some(expires) => expires < now_millis,
            None => false,
        }
    }
}

// Token values are redacted; presence is what matters when debugging.
impl fmt::Debug for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthState")
            .field("access_token", &self.access_token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "access_token_expiration_time",
                &self.access_token_expiration_time,
            )
            .field("id_token", &self.id_token.as_ref().map(|_| "[REDACTED]"))
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Current unix time in milliseconds.
pub(crate) fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
