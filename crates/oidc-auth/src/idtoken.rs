//! Unverified id-token claim extraction
//!
//! The id token arrives over TLS directly from the token endpoint, so the
//! core reads its claims without signature verification. Verifying against
//! the provider's JWKS is the embedder's concern if tokens are forwarded
//! elsewhere.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Deserialize;
use tracing::debug;

/// Claims read from the id-token payload. Unknown claims are ignored.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct IdTokenClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    /// Expiration time as unix seconds.
    #[serde(default)]
    pub exp: Option<u64>,
}

/// Decode the payload segment of a JWT without verifying its signature.
///
/// Returns `None` for anything that is not a three-segment JWT with a
/// base64url JSON payload. The claims are a convenience surface, not an
/// authentication input.
pub fn decode_unverified(token: &str) -> Option<IdTokenClaims> {
    let mut segments = token.split('.');
    let _header = segments.next()?;
    let payload = segments.next()?;
    segments.next()?; // signature segment must exist even though it is not checked
    if segments.next().is_some() {
        return None;
    }

    let bytes = match URL_SAFE_NO_PAD.decode(payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(error = %e, "id token payload is not base64url");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(claims) => Some(claims),
        Err(e) => {
            debug!(error = %e, "id token payload is not valid JSON");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Build an unsigned test JWT around the given payload JSON.
    fn test_jwt(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{header}.{body}.unchecked-signature")
    }

    #[test]
    fn decodes_known_claims() {
        let token = test_jwt(&serde_json::json!({
            "sub": "user-1",
            "email": "dev@example.com",
            "given_name": "Dev",
            "exp": 1_735_500_000u64,
            "aud": "ignored-claim",
        }));

        let claims = decode_unverified(&token).unwrap();
        assert_eq!(claims.sub.as_deref(), Some("user-1"));
        assert_eq!(claims.email.as_deref(), Some("dev@example.com"));
        assert_eq!(claims.given_name.as_deref(), Some("Dev"));
        assert_eq!(claims.exp, Some(1_735_500_000));
    }

    #[test]
    fn missing_claims_decode_as_none() {
        let token = test_jwt(&serde_json::json!({"sub": "user-1"}));
        let claims = decode_unverified(&token).unwrap();
        assert_eq!(claims.email, None);
        assert_eq!(claims.given_name, None);
    }

    #[test]
    fn rejects_non_jwt_input() {
        assert_eq!(decode_unverified("not-a-jwt"), None);
        assert_eq!(decode_unverified("two.segments"), None);
        assert_eq!(decode_unverified("a.b.c.d"), None);
        assert_eq!(decode_unverified(""), None);
    }

    #[test]
    fn rejects_non_base64_payload() {
        assert_eq!(decode_unverified("header.!!!not-base64!!!.sig"), None);
    }

    #[test]
    fn rejects_non_json_payload() {
        let payload = URL_SAFE_NO_PAD.encode(b"plain text");
        assert_eq!(decode_unverified(&format!("h.{payload}.s")), None);
    }
}
