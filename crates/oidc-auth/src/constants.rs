//! Fixed OAuth protocol values
//!
//! These values identify the public client flow and are not secrets.
//! The actual secrets (access/refresh tokens) live in the token store.

/// Scope requested on every authorization: identity claims plus a refresh
/// token (`offline_access`).
pub const DEFAULT_SCOPE: &str = "openid offline_access";

/// Fixed redirect URI registered for the mobile client. Also used as the
/// `post_logout_redirect_uri` on end-session requests.
pub const REDIRECT_URI: &str = "io.oidc.app:/oauth2redirect";

/// Well-known path of the OIDC discovery document, appended to the provider
/// base URL (and tenant segment, when configured).
pub const WELL_KNOWN_PATH: &str = ".well-known/openid-configuration";

/// Storage key under which the encoded AuthState record is persisted.
pub const AUTH_STATE_KEY: &str = "authState";
