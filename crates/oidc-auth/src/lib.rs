//! Mobile OIDC authentication SDK core
//!
//! Performs the OAuth2/OIDC authorization-code-with-PKCE flow against an
//! identity provider, persists the resulting token state through a
//! pluggable storage backend, and refreshes expired access tokens.
//!
//! Flow:
//! 1. The host constructs an [`AuthOrchestrator`] from an [`AuthConfig`]
//!    and a [`TokenStore`] backed by the platform's durable storage
//! 2. [`AuthOrchestrator::authorize`] returns a [`BrowserFlow`] whose URL
//!    the external authorization surface opens
//! 3. The surface fires the [`FlowCompleter`]; the redirect payload goes to
//!    [`AuthOrchestrator::handle_redirect`], which exchanges the code and
//!    persists the [`AuthState`]
//! 4. [`AuthOrchestrator::fresh_access_token`] refreshes on expiry
//! 5. [`AuthOrchestrator::logout`] clears local state, then ends the
//!    provider session

pub mod browser;
pub mod codec;
pub mod config;
pub mod connection;
pub mod constants;
pub mod discovery;
pub mod error;
pub mod idtoken;
pub mod orchestrator;
pub mod pkce;
pub mod state;
pub mod store;
pub mod userinfo;

pub use browser::{BrowserFlow, FlowCompleter, FlowOutcome, RedirectPayload};
pub use config::AuthConfig;
pub use connection::ConnectionPolicy;
pub use discovery::{DiscoveryCache, DiscoveryConfig};
pub use error::{AuthenticationError, ConfigError, Result, StorageError, UserInfoError};
pub use idtoken::{IdTokenClaims, decode_unverified};
pub use orchestrator::AuthOrchestrator;
pub use state::AuthState;
pub use store::TokenStore;
pub use userinfo::{UserInfo, UserInfoFetcher};
