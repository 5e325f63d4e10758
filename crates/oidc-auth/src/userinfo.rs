//! Authenticated userinfo fetch
//!
//! Resolves the userinfo endpoint from the discovery document and issues a
//! Bearer-authenticated GET with redirects disabled. Absence of state or of
//! an advertised endpoint is "nothing to fetch", not an error.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::discovery::DiscoveryCache;
use crate::error::UserInfoError;
use crate::store::TokenStore;

/// Profile claims returned by the userinfo endpoint. Claims beyond the
/// ones modelled here are ignored. Fetched fresh each session start, never
/// persisted.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct UserInfo {
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Fetches the authenticated user's profile from the provider.
pub struct UserInfoFetcher {
    discovery: Arc<DiscoveryCache>,
    tokens: Arc<TokenStore>,
    client: reqwest::Client,
}

impl UserInfoFetcher {
    pub(crate) fn new(
        discovery: Arc<DiscoveryCache>,
        tokens: Arc<TokenStore>,
        client: reqwest::Client,
    ) -> Self {
        Self {
            discovery,
            tokens,
            client,
        }
    }

    /// Fetch the user's profile.
    ///
    /// Returns `Ok(None)`, with no network call, when no AuthState is
    /// stored, when the stored state has no access token, or when the
    /// provider advertises no userinfo endpoint. Transport failures
    /// surface as [`UserInfoError::Network`], malformed bodies as
    /// [`UserInfoError::Decode`].
    pub async fn get_user_info(&self) -> Result<Option<UserInfo>, UserInfoError> {
        let Some(auth_state) = self.tokens.get_auth_state().await? else {
            return Ok(None);
        };
        let Some(access_token) = auth_state.access_token.as_deref() else {
            return Ok(None);
        };

        let provider = self.discovery.get_configuration(false).await?;
        let Some(endpoint) = provider.userinfo_endpoint.as_deref() else {
            debug!("provider advertises no userinfo endpoint");
            return Ok(None);
        };

        let response = self
            .client
            .get(endpoint)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| UserInfoError::Network(format!("userinfo request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(UserInfoError::Network(format!(
                "userinfo endpoint returned {status}"
            )));
        }

        let info = response
            .json::<UserInfo>()
            .await
            .map_err(|e| UserInfoError::Decode(format!("invalid userinfo response: {e}")))?;
        Ok(Some(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn userinfo_deserializes_and_ignores_unknown_claims() {
        let json = r#"{
            "sub": "user-1",
            "given_name": "Dev",
            "email": "dev@example.com",
            "email_verified": true
        }"#;
        let info: UserInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.given_name.as_deref(), Some("Dev"));
        assert_eq!(info.email.as_deref(), Some("dev@example.com"));
    }

    #[test]
    fn userinfo_deserializes_empty_object() {
        let info: UserInfo = serde_json::from_str("{}").unwrap();
        assert_eq!(info, UserInfo::default());
    }
}
