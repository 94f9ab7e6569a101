//! Signed QR token codec.
//!
//! A token binds a check-in attempt to one event. It is an HMAC-signed
//! (HS256) compact payload carrying the event id and its issuance time,
//! valid for a bounded window (24 hours by default). The string is
//! opaque to everything outside this module; callers only ever pass it
//! back in for verification.
//!
//! Verification failures are ordinary outcomes, not exceptions: a bad
//! signature, an expired token and a malformed payload all collapse to
//! `None`, and the caller reports "invalid or expired code" to the user.

use crate::config::TokenConfig;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Claims embedded in every signed QR token.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    /// Event the token was issued for.
    event_id: i64,
    /// Issued-at (Unix timestamp, seconds).
    iat: i64,
    /// Expiry (Unix timestamp, seconds).
    exp: i64,
}

/// Decoded payload of a valid token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrToken {
    /// Event the token was issued for.
    pub event_id: i64,
    /// When the token was issued.
    pub issued_at: DateTime<Utc>,
}

/// Token signing failure.
///
/// Verification never errors; it returns `None`.
#[derive(Debug, Error)]
#[error("Failed to sign token: {0}")]
pub struct SignError(#[from] jsonwebtoken::errors::Error);

/// Signs and verifies QR tokens with a shared HMAC secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Keys are secret material; show only the TTL.
        f.debug_struct("TokenCodec").field("ttl", &self.ttl).finish()
    }
}

impl TokenCodec {
    /// Create a codec from a token configuration.
    #[must_use]
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            ttl: config.ttl,
        }
    }

    /// Issue a signed token for `event_id`, valid from now until the
    /// configured TTL elapses.
    ///
    /// # Errors
    ///
    /// Returns [`SignError`] if the claims cannot be signed.
    pub fn issue(&self, event_id: i64) -> Result<String, SignError> {
        self.issue_at(event_id, Utc::now())
    }

    fn issue_at(&self, event_id: i64, now: DateTime<Utc>) -> Result<String, SignError> {
        let claims = Claims {
            event_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Verify a token and decode its payload.
    ///
    /// Returns `None` for any signature mismatch, expired token or
    /// malformed payload. Callers treat `None` as the normal "invalid or
    /// expired code" outcome.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<QrToken> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding_key, &validation).ok()?;
        let issued_at = DateTime::from_timestamp(data.claims.iat, 0)?;

        Some(QrToken {
            event_id: data.claims.event_id,
            issued_at,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn codec_with_ttl(ttl: Duration) -> TokenCodec {
        TokenCodec::new(&TokenConfig::new("test-secret".to_string()).with_ttl(ttl))
    }

    #[test]
    fn issue_then_verify_round_trips() {
        let codec = codec_with_ttl(Duration::hours(24));
        let issued = Utc::now();

        let token = codec.issue(5).unwrap();
        let decoded = codec.verify(&token).unwrap();

        assert_eq!(decoded.event_id, 5);
        // Claims carry second precision.
        assert!((decoded.issued_at - issued).num_seconds().abs() <= 1);
    }

    #[test]
    fn expired_token_is_invalid() {
        let codec = codec_with_ttl(Duration::hours(24));

        // Issued 25 hours ago with a 24-hour TTL: expired one hour ago.
        let token = codec
            .issue_at(5, Utc::now() - Duration::hours(25))
            .unwrap();

        assert_eq!(codec.verify(&token), None);
    }

    #[test]
    fn tampered_token_is_invalid() {
        let codec = codec_with_ttl(Duration::hours(24));
        let token = codec.issue(5).unwrap();

        // Flip a character in the signature segment.
        let mut tampered = token.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == 'A' { 'B' } else { 'A' });

        assert_eq!(codec.verify(&tampered), None);
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let codec = codec_with_ttl(Duration::hours(24));
        let other =
            TokenCodec::new(&TokenConfig::new("other-secret".to_string()));

        let token = other.issue(5).unwrap();
        assert_eq!(codec.verify(&token), None);
    }

    #[test]
    fn garbage_is_invalid() {
        let codec = codec_with_ttl(Duration::hours(24));
        assert_eq!(codec.verify("not-a-token"), None);
        assert_eq!(codec.verify(""), None);
    }
}
