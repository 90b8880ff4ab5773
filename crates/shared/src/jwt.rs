//! JWT bearer token validation.
//!
//! Tokens are HMAC-signed; any well-formed, unexpired token signed with the
//! configured secret authorizes a request.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT claims carried by access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (caller identity).
    pub sub: String,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

/// Errors that can occur during JWT operations.
#[derive(Debug, Error)]
pub enum JwtError {
    /// No secret is configured, so no token can be verified.
    #[error("no HMAC secret configured")]
    MissingSecret,

    /// Token encoding failed.
    #[error("failed to encode token: {0}")]
    EncodingError(String),

    /// Token decoding failed.
    #[error("failed to decode token: {0}")]
    DecodingError(String),

    /// Token has expired.
    #[error("token has expired")]
    Expired,
}

/// JWT service for token operations.
#[derive(Clone)]
pub struct JwtService {
    secret_configured: bool,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for JwtService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtService")
            .field("secret_configured", &self.secret_configured)
            .field("encoding_key", &"[hidden]")
            .field("decoding_key", &"[hidden]")
            .finish()
    }
}

impl JwtService {
    /// Creates a new JWT service from an HMAC secret.
    #[must_use]
    pub fn new(secret: &str) -> Self {
        Self {
            secret_configured: !secret.is_empty(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issues a token for `subject` that expires after `ttl`.
    ///
    /// Used by operators and tests; the service itself only validates.
    pub fn issue_token(&self, subject: &str, ttl: Duration) -> Result<String, JwtError> {
        if !self.secret_configured {
            return Err(JwtError::MissingSecret);
        }
        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingError(e.to_string()))
    }

    /// Validates and decodes a token.
    ///
    /// Only HMAC algorithms are accepted.
    pub fn validate_token(&self, token: &str) -> Result<Claims, JwtError> {
        if !self.secret_configured {
            return Err(JwtError::MissingSecret);
        }
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::DecodingError(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new("test-secret-key-for-testing")
    }

    #[test]
    fn test_issue_and_validate() {
        let service = create_test_service();
        let token = service.issue_token("ops", Duration::minutes(5)).unwrap();

        let claims = service.validate_token(&token).unwrap();
        assert_eq!(claims.sub, "ops");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token() {
        let service = create_test_service();
        let token = service.issue_token("ops", Duration::hours(-2)).unwrap();

        assert!(matches!(
            service.validate_token(&token),
            Err(JwtError::Expired)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = create_test_service()
            .issue_token("ops", Duration::minutes(5))
            .unwrap();

        let other = JwtService::new("another-secret");
        assert!(matches!(
            other.validate_token(&token),
            Err(JwtError::DecodingError(_))
        ));
    }

    #[test]
    fn test_empty_secret_rejects_everything() {
        let service = JwtService::new("");
        assert!(matches!(
            service.validate_token("a.b.c"),
            Err(JwtError::MissingSecret)
        ));
    }

    #[test]
    fn test_malformed_token() {
        let service = create_test_service();
        assert!(service.validate_token("invalid.token.here").is_err());
    }
}
