//! Transport policy
//!
//! Decides whether certificate-validation bypass is permitted and builds
//! the HTTP clients used by every other component. Pure policy lookup with
//! no retries and no state transitions. Timeouts are left at the transport's
//! defaults; they are the embedder's concern.

use crate::error::AuthenticationError;

/// Transport policy fixed at configuration time.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionPolicy {
    allow_unsecure: bool,
}

impl ConnectionPolicy {
    pub fn new(allow_unsecure: bool) -> Self {
        Self { allow_unsecure }
    }

    /// Whether unsecure (certificate-validation-bypassing) transport is
    /// permitted.
    pub fn allows_unsecure(&self) -> bool {
        self.allow_unsecure
    }

    /// The shared client for discovery and token-endpoint requests.
    pub fn connector(&self) -> Result<reqwest::Client, AuthenticationError> {
        self.builder()
            .build()
            .map_err(|e| AuthenticationError::Unknown(format!("building HTTP client: {e}")))
    }

    /// The userinfo client: same policy, redirects disabled.
    pub fn userinfo_connector(&self) -> Result<reqwest::Client, AuthenticationError> {
        self.builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| AuthenticationError::Unknown(format!("building HTTP client: {e}")))
    }

    fn builder(&self) -> reqwest::ClientBuilder {
        let builder = reqwest::Client::builder();
        if self.allow_unsecure {
            builder.danger_accept_invalid_certs(true)
        } else {
            builder
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_is_fixed_at_construction() {
        assert!(!ConnectionPolicy::new(false).allows_unsecure());
        assert!(ConnectionPolicy::new(true).allows_unsecure());
    }

    #[test]
    fn both_connectors_build() {
        let policy = ConnectionPolicy::new(false);
        assert!(policy.connector().is_ok());
        assert!(policy.userinfo_connector().is_ok());

        let unsecure = ConnectionPolicy::new(true);
        assert!(unsecure.connector().is_ok());
    }
}
