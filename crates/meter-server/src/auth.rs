//! Bearer token issuance and validation.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while issuing or validating bearer tokens.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token signing failed.
    #[error("failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    /// The presented token did not decode or has expired.
    #[error("invalid authentication token")]
    InvalidToken,
}

/// Claims carried by issued tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Authenticated username.
    pub sub: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiration, unix seconds.
    pub exp: i64,
}

/// A freshly signed token together with its expiration.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// The signed compact JWT.
    pub token: String,
    /// When the token stops being accepted.
    pub expires_at: DateTime<Utc>,
}

/// Issues and validates HS256 bearer tokens over a shared secret.
pub struct JwtTokenService {
    secret: String,
    token_lifetime: Duration,
}

impl JwtTokenService {
    /// Token service over `secret`, issuing tokens valid for
    /// `token_lifetime_secs`.
    pub fn new(secret: &str, token_lifetime_secs: i64) -> Self {
        Self {
            secret: secret.to_string(),
            token_lifetime: Duration::seconds(token_lifetime_secs),
        }
    }

    /// Sign a token for the authenticated subject.
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        let now = Utc::now();
        let expires_at = now + self.token_lifetime;
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(AuthError::Sign)?;

        Ok(IssuedToken { token, expires_at })
    }

    /// Decode and validate a presented token, including its expiration.
    pub fn validate(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|_| AuthError::InvalidToken)
    }
}

/// Decides whether a username/password pair identifies a known client.
///
/// Credential storage belongs to the host application; the service only
/// consumes the accept/reject decision.
pub trait CredentialVerifier: Send + Sync + 'static {
    /// True when the pair identifies a known client.
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// Verifier backed by a single configured identity.
pub struct StaticCredentialVerifier {
    username: String,
    password: String,
}

impl StaticCredentialVerifier {
    /// Verifier accepting exactly this username/password pair.
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }
}

impl CredentialVerifier for StaticCredentialVerifier {
    fn verify(&self, username: &str, password: &str) -> bool {
        username == self.username && password == self.password
    }
}

/// Extract the token from a `Bearer <token>` authorization header value.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates() {
        let tokens = JwtTokenService::new("test-secret", 3600);
        let issued = tokens.issue("acme").unwrap();

        let claims = tokens.validate(&issued.token).unwrap();
        assert_eq!(claims.sub, "acme");
        assert!(issued.expires_at > Utc::now());
    }

    #[test]
    fn expired_token_is_rejected() {
        // Lifetime far enough in the past to defeat the default decode leeway.
        let tokens = JwtTokenService::new("test-secret", -3600);
        let issued = tokens.issue("acme").unwrap();

        assert!(tokens.validate(&issued.token).is_err());
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let issuer = JwtTokenService::new("secret-a", 3600);
        let verifier = JwtTokenService::new("secret-b", 3600);
        let issued = issuer.issue("acme").unwrap();

        assert!(verifier.validate(&issued.token).is_err());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let tokens = JwtTokenService::new("test-secret", 3600);
        assert!(tokens.validate("not-a-jwt").is_err());
    }

    #[test]
    fn static_verifier_accepts_configured_identity() {
        let verifier = StaticCredentialVerifier::new("acme", "reading-rocks");
        assert!(verifier.verify("acme", "reading-rocks"));
        assert!(!verifier.verify("acme", "wrong"));
        assert!(!verifier.verify("other", "reading-rocks"));
    }

    #[test]
    fn bearer_extraction() {
        assert_eq!(extract_bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("bearer abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("abc"), None);
    }
}
