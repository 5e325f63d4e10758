//! SDK configuration
//!
//! Immutable for the lifetime of an orchestrator; re-initialization replaces
//! it wholesale. Hosts either construct the config in code or load it from a
//! TOML file. Validation runs in both paths.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;

/// Configuration supplied by the embedding application.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// OAuth client ID registered with the identity provider.
    pub client_id: String,

    /// Base URL of the identity provider, no trailing slash assumed.
    pub provider_base_url: String,

    /// Optional tenant path segment inserted before the well-known path.
    #[serde(default)]
    pub tenant_id: Option<String>,

    /// Allow connections that bypass certificate validation. Testing only.
    #[serde(default)]
    pub allow_unsecure_connection: bool,
}

impl AuthConfig {
    pub fn new(client_id: impl Into<String>, provider_base_url: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            provider_base_url: provider_base_url.into(),
            tenant_id: None,
            allow_unsecure_connection: false,
        }
    }

    /// Set the tenant path segment.
    pub fn with_tenant(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Allow unsecure connections. This disables certificate validation.
    pub fn with_unsecure_connection(mut self, allow: bool) -> Self {
        self.allow_unsecure_connection = allow;
        self
    }

    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AuthConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate field contents. Warns when certificate validation has been
    /// disabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_id.trim().is_empty() {
            return Err(ConfigError::Invalid("client_id must not be empty".into()));
        }
        if !self.provider_base_url.starts_with("http://")
            && !self.provider_base_url.starts_with("https://")
        {
            return Err(ConfigError::Invalid(format!(
                "provider_base_url must start with http:// or https://, got: {}",
                self.provider_base_url
            )));
        }
        if let Some(tenant) = &self.tenant_id {
            if tenant.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "tenant_id must not be empty when set".into(),
                ));
            }
        }
        if self.allow_unsecure_connection {
            warn!("unsecure connections disable certificate validation; use only for testing");
        }
        Ok(())
    }

    /// Provider base URL with any trailing slash removed.
    pub(crate) fn provider_base(&self) -> &str {
        self.provider_base_url.trim_end_matches('/')
    }
}
