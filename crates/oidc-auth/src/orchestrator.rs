//! OAuth/OIDC protocol orchestration
//!
//! Drives the protocol operations (authorize, redirect handling,
//! access-token refresh, end-session) against the discovery cache, the
//! identity provider's endpoints, and the token store.
//!
//! The persisted AuthState is the only mutable shared resource. Every write
//! goes through a single-writer gate held across the full read-modify-write
//! sequence, so two concurrent refreshes cannot interleave partial fields;
//! last-completed-write-wins. Dropping an in-flight future abandons its
//! HTTP request without persisting partial state: persistence happens
//! strictly after a fully decoded success response.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use zeroize::Zeroize;

use crate::browser::{BrowserFlow, FlowCompleter, RedirectPayload, browser_flow};
use crate::config::AuthConfig;
use crate::connection::ConnectionPolicy;
use crate::constants::REDIRECT_URI;
use crate::discovery::DiscoveryCache;
use crate::error::{AuthenticationError, Result, StorageError};
use crate::pkce;
use crate::state::{AuthState, now_millis};
use crate::store::TokenStore;
use crate::userinfo::UserInfoFetcher;

/// Response from the token endpoint for both code exchange and refresh.
///
/// `expires_in` is a delta in seconds from the response time; it is
/// converted to an absolute unix millisecond timestamp at storage time.
#[derive(Debug, Deserialize)]
struct TokenEndpointResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// The in-flight authorization request: the `state` echo the provider must
/// return and the PKCE verifier proving this SDK initiated the flow.
struct PendingAuthorization {
    state: String,
    verifier: String,
}

// The verifier is a live secret until the exchange completes; wipe it.
impl Drop for PendingAuthorization {
    fn drop(&mut self) {
        self.verifier.zeroize();
    }
}

/// The protocol core. Explicitly constructed and owned by the embedder;
/// one instance per configured provider.
pub struct AuthOrchestrator {
    config: AuthConfig,
    policy: ConnectionPolicy,
    discovery: Arc<DiscoveryCache>,
    tokens: Arc<TokenStore>,
    client: reqwest::Client,
    pending: Mutex<Option<PendingAuthorization>>,
    /// Serializes every write to the persisted AuthState.
    write_gate: Mutex<()>,
}

impl AuthOrchestrator {
    /// Build an orchestrator from a configuration and a token store.
    ///
    /// Validates the configuration and constructs the HTTP client per the
    /// connection policy.
    pub fn new(config: AuthConfig, tokens: Arc<TokenStore>) -> Result<Self> {
        config
            .validate()
            .map_err(|e| AuthenticationError::Unknown(e.to_string()))?;
        let policy = ConnectionPolicy::new(config.allow_unsecure_connection);
        let client = policy.connector()?;
        let discovery = Arc::new(DiscoveryCache::new(&config, client.clone()));
        Ok(Self {
            config,
            policy,
            discovery,
            tokens,
            client,
            pending: Mutex::new(None),
            write_gate: Mutex::new(()),
        })
    }

    /// The discovery cache backing this orchestrator. Exposed so embedders
    /// can force a refetch after a provider migration.
    pub fn discovery(&self) -> &DiscoveryCache {
        &self.discovery
    }

    /// Build a userinfo fetcher sharing this orchestrator's discovery cache
    /// and token store.
    pub fn userinfo_fetcher(&self) -> Result<UserInfoFetcher> {
        Ok(UserInfoFetcher::new(
            self.discovery.clone(),
            self.tokens.clone(),
            self.policy.userinfo_connector()?,
        ))
    }

    /// Start an authorization flow.
    ///
    /// Builds the authorization request (PKCE challenge, `openid
    /// offline_access` scope, code response type, fixed redirect URI)
    /// against the cached or freshly fetched provider configuration and
    /// returns the browser hand-off pair. The redirect payload delivered
    /// through the completer is then passed to
    /// [`handle_redirect`](Self::handle_redirect).
    pub async fn authorize(&self) -> Result<(BrowserFlow, FlowCompleter)> {
        let provider = self.discovery.get_configuration(false).await?;

        let verifier = pkce::generate_verifier();
        let challenge = pkce::compute_challenge(&verifier);
        let state = pkce::generate_state();
        let url =
            pkce::build_authorization_url(&provider, &self.config.client_id, &state, &challenge);

        *self.pending.lock().await = Some(PendingAuthorization { state, verifier });
        debug!("authorization request dispatched");
        Ok(browser_flow(url))
    }

    /// Exchange the redirect payload for tokens and persist the result.
    ///
    /// The returned AuthState has been written to the token store before
    /// this method returns; callers may assume durability on success.
    pub async fn handle_redirect(&self, payload: RedirectPayload) -> Result<AuthState> {
        if let Some(error) = payload.error.as_deref() {
            let cause = payload
                .error_description
                .as_deref()
                .unwrap_or("no description");
            return Err(AuthenticationError::AuthorizationDenied(format!(
                "{error}: {cause}"
            )));
        }
        let Some(code) = payload.code.as_deref() else {
            return Err(AuthenticationError::Unknown(
                "authorization response carries neither code nor error".into(),
            ));
        };

        let pending = self.pending.lock().await.take().ok_or_else(|| {
            AuthenticationError::AuthorizationDenied(
                "redirect does not match any authorization request in flight".into(),
            )
        })?;
        if payload.state.as_deref() != Some(pending.state.as_str()) {
            return Err(AuthenticationError::AuthorizationDenied(
                "state parameter does not match the authorization request".into(),
            ));
        }

        let provider = self.discovery.get_configuration(false).await?;
        let response = self
            .client
            .post(&provider.token_endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", REDIRECT_URI),
                ("client_id", self.config.client_id.as_str()),
                ("code_verifier", pending.verifier.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                AuthenticationError::TokenExchange(format!("token exchange request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(AuthenticationError::TokenExchange(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token = response.json::<TokenEndpointResponse>().await.map_err(|e| {
            AuthenticationError::TokenExchange(format!("invalid token response: {e}"))
        })?;

        let auth_state = auth_state_from(token, None);

        let _gate = self.write_gate.lock().await;
        self.tokens.save_auth_state(&auth_state).await?;
        info!("authorization code exchanged, auth state persisted");
        Ok(auth_state)
    }

    /// Whether a persisted AuthState with an access token exists.
    ///
    /// Corrupted stored state surfaces as `StorageError::DecodeFailed`
    /// rather than reading as "not authenticated".
    pub async fn is_authenticated(&self) -> Result<bool, StorageError> {
        Ok(self
            .tokens
            .get_auth_state()
            .await?
            .map(|state| state.access_token.is_some())
            .unwrap_or(false))
    }

    /// Whether the persisted access token is past its expiration time.
    ///
    /// A state without an expiration timestamp, and likewise no state at
    /// all, reads as not expired; see
    /// [`AuthState::is_access_token_expired_at`].
    pub async fn is_access_token_expired(&self) -> Result<bool, StorageError> {
        Ok(self
            .tokens
            .get_auth_state()
            .await?
            .map(|state| state.is_access_token_expired_at(now_millis()))
            .unwrap_or(false))
    }

    /// Obtain a fresh access token via the refresh grant and persist the
    /// updated state.
    ///
    /// Fails with `NoRefreshToken`, before any network I/O, when the
    /// stored state has no refresh token. On any later failure the stored
    /// state is left untouched. A refresh response that omits the refresh
    /// token (or id token) never downgrades one already held.
    ///
    /// Holds the write gate for the whole read-refresh-write sequence.
    pub async fn fresh_access_token(&self) -> Result<String> {
        let _gate = self.write_gate.lock().await;

        let Some(current) = self.tokens.get_auth_state().await? else {
            return Err(AuthenticationError::NoRefreshToken);
        };
        let Some(refresh_token) = current.refresh_token.clone() else {
            return Err(AuthenticationError::NoRefreshToken);
        };

        let provider = self.discovery.get_configuration(false).await?;
        let response = self
            .client
            .post(&provider.token_endpoint)
            .form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                AuthenticationError::RefreshFailed(format!("token refresh request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("<no body>"));
            return Err(AuthenticationError::RefreshFailed(format!(
                "token endpoint returned {status}: {body}"
            )));
        }

        let token = response.json::<TokenEndpointResponse>().await.map_err(|e| {
            AuthenticationError::RefreshFailed(format!("invalid refresh response: {e}"))
        })?;

        let access_token = token.access_token.clone();
        let new_state = auth_state_from(token, Some(&current));
        self.tokens.save_auth_state(&new_state).await?;
        info!("access token refreshed");
        Ok(access_token)
    }

    /// End the provider session.
    ///
    /// Local state is cleared BEFORE the end-session request is dispatched:
    /// it must not outlive the attempt to also end the server session.
    /// Returns `Ok(None)` when nothing is stored (nothing to end). The
    /// id-token hint is included when the stored state carries one.
    pub async fn logout(&self) -> Result<Option<(BrowserFlow, FlowCompleter)>> {
        let Some(auth_state) = self.tokens.get_auth_state().await? else {
            return Ok(None);
        };

        {
            let _gate = self.write_gate.lock().await;
            self.tokens.clear_auth_state().await?;
        }

        let provider = self.discovery.get_configuration(false).await?;
        let Some(end_session) = provider.end_session_endpoint.as_deref() else {
            return Err(AuthenticationError::DiscoveryFailed(
                "provider advertises no end_session_endpoint".into(),
            ));
        };

        let url = pkce::build_end_session_url(end_session, auth_state.id_token.as_deref());
        info!("local auth state cleared, end-session request dispatched");
        Ok(Some(browser_flow(url)))
    }

    /// Unconditionally clear the persisted AuthState. Never fails: clearing
    /// an empty or unconfigured store is a success.
    pub async fn clear_state(&self) {
        let _gate = self.write_gate.lock().await;
        if let Err(e) = self.tokens.clear_auth_state().await {
            debug!(error = %e, "clear_state: nothing cleared");
        }
    }

    /// Release held protocol resources: the pending authorization, if any,
    /// and the cached discovery document. Idempotent. Pooled connections
    /// are released when the orchestrator itself is dropped.
    pub async fn dispose(&self) {
        *self.pending.lock().await = None;
        self.discovery.invalidate().await;
        debug!("orchestrator disposed");
    }
}

/// Build the new AuthState from a token response.
///
/// `previous` supplies the carry-over values: a refresh token (or id token)
/// missing from the response must never downgrade one already held.
fn auth_state_from(response: TokenEndpointResponse, previous: Option<&AuthState>) -> AuthState {
    let expiration = response
        .expires_in
        .map(|seconds| now_millis() + seconds * 1000);
    AuthState {
        access_token: Some(response.access_token),
        access_token_expiration_time: expiration,
        id_token: response
            .id_token
            .or_else(|| previous.and_then(|p| p.id_token.clone())),
        refresh_token: response
            .refresh_token
            .or_else(|| previous.and_then(|p| p.refresh_token.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(
        access: &str,
        refresh: Option<&str>,
        id: Option<&str>,
        expires_in: Option<u64>,
    ) -> TokenEndpointResponse {
        TokenEndpointResponse {
            access_token: access.into(),
            expires_in,
            id_token: id.map(Into::into),
            refresh_token: refresh.map(Into::into),
        }
    }

    #[test]
    fn exchange_response_maps_all_fields() {
        let state = auth_state_from(response("AT1", Some("RT1"), Some("IT1"), Some(3600)), None);
        assert_eq!(state.access_token.as_deref(), Some("AT1"));
        assert_eq!(state.refresh_token.as_deref(), Some("RT1"));
        assert_eq!(state.id_token.as_deref(), Some("IT1"));
        let expires = state.access_token_expiration_time.unwrap();
        assert!(expires > now_millis(), "expiry must be in the future");
    }

    #[test]
    fn missing_expires_in_yields_no_expiration() {
        let state = auth_state_from(response("AT1", None, None, None), None);
        assert_eq!(state.access_token_expiration_time, None);
        assert!(!state.is_access_token_expired_at(u64::MAX));
    }

    #[test]
    fn refresh_never_downgrades_refresh_token() {
        let previous = AuthState {
            access_token: Some("AT_old".into()),
            refresh_token: Some("RT_original".into()),
            id_token: Some("IT_original".into()),
            ..Default::default()
        };
        let state = auth_state_from(response("AT_new", None, None, Some(60)), Some(&previous));
        assert_eq!(state.access_token.as_deref(), Some("AT_new"));
        assert_eq!(state.refresh_token.as_deref(), Some("RT_original"));
        assert_eq!(state.id_token.as_deref(), Some("IT_original"));
    }

    #[test]
    fn refresh_response_tokens_replace_previous() {
        let previous = AuthState {
            refresh_token: Some("RT_old".into()),
            id_token: Some("IT_old".into()),
            ..Default::default()
        };
        let state = auth_state_from(
            response("AT_new", Some("RT_new"), Some("IT_new"), Some(60)),
            Some(&previous),
        );
        assert_eq!(state.refresh_token.as_deref(), Some("RT_new"));
        assert_eq!(state.id_token.as_deref(), Some("IT_new"));
    }

    #[test]
    fn token_response_deserializes_with_optional_fields_absent() {
        let json = r#"{"access_token":"AT1"}"#;
        let token: TokenEndpointResponse = serde_json::from_str(json).unwrap();
        assert_eq!(token.access_token, "AT1");
        assert_eq!(token.expires_in, None);
        assert_eq!(token.refresh_token, None);
        assert_eq!(token.id_token, None);
    }
}
