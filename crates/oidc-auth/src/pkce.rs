//! PKCE (Proof Key for Code Exchange) per RFC 7636, plus browser URL building
//!
//! Generates the code verifier and S256 challenge used during the
//! authorization flow, and builds the authorization / end-session URLs
//! handed to the external browser surface. The verifier stays inside the
//! orchestrator and is sent during token exchange; the challenge goes into
//! the authorization URL so the provider can verify the exchange request
//! came from the same party that initiated the flow.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngExt;
use sha2::{Digest, Sha256};

use crate::constants::{DEFAULT_SCOPE, REDIRECT_URI};
use crate::discovery::DiscoveryConfig;

/// Generate a cryptographically random PKCE code verifier.
///
/// Produces a 128-byte random value encoded as URL-safe base64 (no padding).
/// RFC 7636 requires 43-128 characters; the output is 171 characters, within
/// the spec range.
pub fn generate_verifier() -> String {
    let mut bytes = [0u8; 128];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Compute the S256 code challenge from a verifier.
///
/// `challenge = BASE64URL(SHA256(verifier))`
pub fn compute_challenge(verifier: &str) -> String {
    let hash = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hash)
}

/// Generate the opaque `state` value echoed back by the provider in the
/// redirect. Ties the redirect to the request that produced it.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build the full authorization URL with all required OAuth parameters.
pub fn build_authorization_url(
    provider: &DiscoveryConfig,
    client_id: &str,
    state: &str,
    challenge: &str,
) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&code_challenge={}&code_challenge_method=S256&state={}",
        provider.authorization_endpoint,
        client_id,
        urlencoded(REDIRECT_URI),
        urlencoded(DEFAULT_SCOPE),
        challenge,
        state,
    )
}

/// Build the end-session URL. The id-token hint is included when available
/// so the provider can identify the session to terminate.
pub fn build_end_session_url(end_session_endpoint: &str, id_token_hint: Option<&str>) -> String {
    match id_token_hint {
        Some(hint) => format!(
            "{}?id_token_hint={}&post_logout_redirect_uri={}",
            end_session_endpoint,
            hint,
            urlencoded(REDIRECT_URI),
        ),
        None => format!(
            "{}?post_logout_redirect_uri={}",
            end_session_endpoint,
            urlencoded(REDIRECT_URI),
        ),
    }
}

/// Minimal URL encoding for parameter values.
/// Only encodes characters that would break URL parameter parsing.
fn urlencoded(s: &str) -> String {
    s.replace(' ', "%20")
        .replace(':', "%3A")
        .replace('/', "%2F")
}
