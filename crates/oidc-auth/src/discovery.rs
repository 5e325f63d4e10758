//! OIDC provider discovery
//!
//! Fetches and memoizes the provider's `.well-known/openid-configuration`
//! document, keyed by provider URL plus the optional tenant segment. At most
//! one fetch per instance unless a refresh is forced. A failed fetch is not
//! cached; the next call retries from scratch, and retry pacing is the
//! caller's concern.

use std::sync::Arc;

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::config::AuthConfig;
use crate::constants::WELL_KNOWN_PATH;
use crate::error::AuthenticationError;

/// Provider configuration from `.well-known/openid-configuration`.
/// Fields beyond the ones modelled here are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    #[serde(default)]
    pub end_session_endpoint: Option<String>,
    #[serde(default)]
    pub userinfo_endpoint: Option<String>,
    #[serde(default)]
    pub jwks_uri: Option<String>,
}

/// Per-orchestrator cache of the discovery document.
///
/// The cached reference is safe for concurrent reads; cache population is
/// an atomic replace. Staleness is immaterial once any valid document is
/// cached, so there is no single-flight: concurrent callers before the
/// first successful fetch each issue their own request and the last writer
/// wins.
pub struct DiscoveryCache {
    discovery_url: String,
    client: reqwest::Client,
    cached: RwLock<Option<Arc<DiscoveryConfig>>>,
}

impl DiscoveryCache {
    pub fn new(config: &AuthConfig, client: reqwest::Client) -> Self {
        Self {
            discovery_url: discovery_url(config),
            client,
            cached: RwLock::new(None),
        }
    }

    /// The well-known URL this cache fetches from.
    pub fn discovery_url(&self) -> &str {
        &self.discovery_url
    }

    /// Return the provider configuration, fetching it on first use.
    ///
    /// Without `force_refresh`, a cached document is returned with no
    /// network call.
    pub async fn get_configuration(
        &self,
        force_refresh: bool,
    ) -> Result<Arc<DiscoveryConfig>, AuthenticationError> {
        if !force_refresh {
            if let Some(config) = self.cached.read().await.clone() {
                return Ok(config);
            }
        }

        debug!(url = %self.discovery_url, "fetching provider configuration");
        let response = self
            .client
            .get(&self.discovery_url)
            .send()
            .await
            .map_err(|e| {
                AuthenticationError::DiscoveryFailed(format!("discovery request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AuthenticationError::DiscoveryFailed(format!(
                "discovery endpoint returned {status}"
            )));
        }

        let config: DiscoveryConfig = response.json().await.map_err(|e| {
            AuthenticationError::DiscoveryFailed(format!("invalid discovery document: {e}"))
        })?;

        let config = Arc::new(config);
        *self.cached.write().await = Some(config.clone());
        info!(issuer = %config.issuer, "provider configuration cached");
        Ok(config)
    }

    /// Drop the cached document; the next call fetches again.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }
}

/// `providerBaseUrl[/tenantId]/.well-known/openid-configuration`
fn discovery_url(config: &AuthConfig) -> String {
    let base = config.provider_base();
    match config.tenant_id.as_deref() {
        Some(tenant) => format!("{base}/{tenant}/{WELL_KNOWN_PATH}"),
        None => format!("{base}/{WELL_KNOWN_PATH}"),
    }
}
