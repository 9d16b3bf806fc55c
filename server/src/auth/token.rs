//! Token issuance and verification.
//!
//! Produces the two credentials of the session protocol: signed HS256
//! access tokens and opaque random refresh-token records. Verification is
//! the single step that turns a bearer token back into identity claims;
//! resource handlers never parse tokens themselves.
//!
//! # Pre-conditions
//! - The signing secret must be non-empty (checked at construction; a
//!   missing secret is a configuration error, not a runtime condition).
//!
//! # Post-conditions
//! - On success, verification returns the subject id and username claims.
//! - On failure, returns a descriptive error indicating what went wrong.
//!
//! # Invariants
//! - Verification is stateless and does not modify any external state.
//! - Issuance is deterministic given the injected clock, up to the random
//!   token string.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::Rng as _;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::model::{RefreshToken, User};
use crate::time::TimeSource;

/// Claims embedded in an access token.
///
/// The 'sub' (subject) claim carries the user id; 'name' carries the
/// username so handlers can echo it without a directory lookup.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String,
    name: String,
    iss: String,
    aud: String,
    iat: i64,
    exp: i64,
}

/// The verified identity extracted from an access token.
///
/// This is the only shape resource handlers ever see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// The authenticated user's id (the 'sub' claim).
    pub subject: Uuid,
    /// The authenticated user's username (the 'name' claim).
    pub name: String,
}

/// Error returned when token issuance or verification fails.
#[derive(Debug)]
pub enum TokenError {
    /// The configured signing secret is empty.
    EmptySecret,
    /// Signing the token failed.
    Signing(String),
    /// The token signature is invalid.
    InvalidSignature,
    /// The token has expired.
    TokenExpired,
    /// The token is malformed or cannot be parsed.
    MalformedToken,
    /// A claim is missing or does not match the expected value.
    ClaimRejected(String),
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptySecret => write!(f, "signing secret must not be empty"),
            Self::Signing(reason) => write!(f, "failed to sign token: {reason}"),
            Self::InvalidSignature => write!(f, "invalid token signature"),
            Self::TokenExpired => write!(f, "token has expired"),
            Self::MalformedToken => write!(f, "malformed token"),
            Self::ClaimRejected(reason) => write!(f, "rejected claim: {reason}"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Issues and verifies the session protocol's credentials.
///
/// Holds the derived signing/verification keys and the validation rules
/// (signature, expiry, issuer, audience). Time comes from the injected
/// `TimeSource` so expiry behavior is testable.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    issuer: String,
    audience: String,
    access_token_minutes: i64,
    refresh_token_days: i64,
    clock: Arc<dyn TimeSource>,
}

impl TokenIssuer {
    /// Create an issuer from the server configuration.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::EmptySecret` if the configured secret is empty.
    pub fn new(config: &ServerConfig, clock: Arc<dyn TimeSource>) -> Result<Self, TokenError> {
        if config.jwt_secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_issuer(&[&config.jwt_issuer]);
        validation.set_audience(&[&config.jwt_audience]);

        Ok(Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            validation,
            issuer: config.jwt_issuer.clone(),
            audience: config.jwt_audience.clone(),
            access_token_minutes: config.access_token_minutes,
            refresh_token_days: config.refresh_token_days,
            clock,
        })
    }

    /// Issue a signed access token for the given user.
    ///
    /// Encodes `{sub, name, iss, aud, iat, exp}` where `exp` is the
    /// configured number of minutes after the injected clock's now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Signing` if encoding fails.
    pub fn issue_access_token(&self, user: &User) -> Result<String, TokenError> {
        let now = self.clock.now();
        let claims = Claims {
            sub: user.id.to_string(),
            name: user.username.clone(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.access_token_minutes)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Mint a refresh-token record for the given user.
    ///
    /// The token string is 32 hex characters from 16 cryptographically
    /// random bytes. No side effects; the caller persists the record.
    #[must_use]
    pub fn issue_refresh_token(&self, user: &User, origin_ip: &str) -> RefreshToken {
        let now = self.clock.now();
        RefreshToken {
            id: Uuid::new_v4(),
            user_id: user.id,
            token: random_token_string(),
            created: now,
            created_by_ip: origin_ip.to_string(),
            expires: now + Duration::days(self.refresh_token_days),
            revoked: None,
            revoked_by_ip: None,
            replaced_by_token: None,
        }
    }

    /// Verify an access token and extract its identity claims.
    ///
    /// Checks signature, expiry, issuer, and audience.
    ///
    /// # Errors
    ///
    /// Returns `TokenError` if verification fails for any reason.
    pub fn verify_access_token(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(map_jwt_error)?;

        let subject = Uuid::parse_str(&token_data.claims.sub)
            .map_err(|_| TokenError::ClaimRejected("'sub' is not a valid user id".to_string()))?;

        Ok(AccessClaims {
            subject,
            name: token_data.claims.name,
        })
    }
}

/// Generate an opaque refresh-token string: 16 random bytes as lowercase hex.
fn random_token_string() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes[..]);

    let mut out = String::with_capacity(32);
    for byte in &bytes {
        let _ = write!(&mut out, "{byte:02x}");
    }
    out
}

/// Maps jsonwebtoken errors to our `TokenError` type.
fn map_jwt_error(error: jsonwebtoken::errors::Error) -> TokenError {
    use jsonwebtoken::errors::ErrorKind;

    match error.kind() {
        ErrorKind::InvalidSignature => TokenError::InvalidSignature,
        ErrorKind::ExpiredSignature => TokenError::TokenExpired,
        ErrorKind::InvalidIssuer => TokenError::ClaimRejected("issuer mismatch".to_string()),
        ErrorKind::InvalidAudience => TokenError::ClaimRejected("audience mismatch".to_string()),
        ErrorKind::MissingRequiredClaim(claim) => {
            TokenError::ClaimRejected(format!("missing claim '{claim}'"))
        }
        ErrorKind::InvalidToken
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::Base64(_)
        | ErrorKind::Json(_)
        | ErrorKind::Utf8(_) => TokenError::MalformedToken,
        _ => TokenError::MalformedToken,
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::time::{ManualTimeSource, SystemTimeSource};

    fn test_config(secret: &str) -> ServerConfig {
        ServerConfig {
            jwt_secret: secret.to_string(),
            jwt_issuer: "quill".to_string(),
            jwt_audience: "quill-clients".to_string(),
            access_token_minutes: 15,
            refresh_token_days: 7,
            allowed_origin: "http://localhost:4200".to_string(),
            listen_port: 3000,
        }
    }

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: "$argon2id$...".to_string(),
        }
    }

    fn system_issuer(secret: &str) -> TokenIssuer {
        TokenIssuer::new(&test_config(secret), Arc::new(SystemTimeSource)).expect("valid config")
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let issuer = system_issuer("test-secret-key-that-is-long-enough");
        let user = test_user();

        let token = issuer.issue_access_token(&user).expect("token issued");
        let claims = issuer.verify_access_token(&token).expect("token verifies");

        assert_eq!(claims.subject, user.id);
        assert_eq!(claims.name, "alice");
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let issuer = system_issuer("test-secret-key-that-is-long-enough");
        let other = system_issuer("a-completely-different-secret-key");
        let token = issuer.issue_access_token(&test_user()).expect("token issued");

        let result = other.verify_access_token(&token);
        assert!(matches!(result, Err(TokenError::InvalidSignature)));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        // Issue from a clock two hours in the past so exp is already gone.
        let past = Utc::now() - Duration::hours(2);
        let clock = Arc::new(ManualTimeSource::new(past));
        let issuer = TokenIssuer::new(
            &test_config("test-secret-key-that-is-long-enough"),
            clock,
        )
        .expect("valid config");

        let token = issuer.issue_access_token(&test_user()).expect("token issued");
        let result = issuer.verify_access_token(&token);
        assert!(matches!(result, Err(TokenError::TokenExpired)));
    }

    #[test]
    fn test_verify_rejects_wrong_audience() {
        let issuer = system_issuer("test-secret-key-that-is-long-enough");

        let mut other_config = test_config("test-secret-key-that-is-long-enough");
        other_config.jwt_audience = "someone-else".to_string();
        let other =
            TokenIssuer::new(&other_config, Arc::new(SystemTimeSource)).expect("valid config");

        let token = issuer.issue_access_token(&test_user()).expect("token issued");
        let result = other.verify_access_token(&token);
        assert!(matches!(result, Err(TokenError::ClaimRejected(_))));
    }

    #[test]
    fn test_verify_rejects_wrong_issuer() {
        let issuer = system_issuer("test-secret-key-that-is-long-enough");

        let mut other_config = test_config("test-secret-key-that-is-long-enough");
        other_config.jwt_issuer = "impostor".to_string();
        let other =
            TokenIssuer::new(&other_config, Arc::new(SystemTimeSource)).expect("valid config");

        let token = issuer.issue_access_token(&test_user()).expect("token issued");
        let result = other.verify_access_token(&token);
        assert!(matches!(result, Err(TokenError::ClaimRejected(_))));
    }

    #[test]
    fn test_verify_rejects_malformed_token() {
        let issuer = system_issuer("test-secret-key-that-is-long-enough");
        let result = issuer.verify_access_token("not-a-valid-jwt");
        assert!(matches!(result, Err(TokenError::MalformedToken)));
    }

    #[test]
    fn test_verify_rejects_non_uuid_subject() {
        let issuer = system_issuer("test-secret-key-that-is-long-enough");
        let now = Utc::now();
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            name: "alice".to_string(),
            iss: "quill".to_string(),
            aud: "quill-clients".to_string(),
            iat: now.timestamp(),
            exp: (now + Duration::minutes(5)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-secret-key-that-is-long-enough"),
        )
        .expect("token encodes");

        let result = issuer.verify_access_token(&token);
        assert!(matches!(result, Err(TokenError::ClaimRejected(_))));
    }

    #[test]
    fn test_empty_secret_rejected_at_construction() {
        let result = TokenIssuer::new(&test_config(""), Arc::new(SystemTimeSource));
        assert!(matches!(result, Err(TokenError::EmptySecret)));
    }

    #[test]
    fn test_refresh_token_fields() {
        let start = Utc::now();
        let clock = Arc::new(ManualTimeSource::new(start));
        let issuer = TokenIssuer::new(
            &test_config("test-secret-key-that-is-long-enough"),
            clock,
        )
        .expect("valid config");
        let user = test_user();

        let refresh = issuer.issue_refresh_token(&user, "10.0.0.7");

        assert_eq!(refresh.user_id, user.id);
        assert_eq!(refresh.created, start);
        assert_eq!(refresh.expires, start + Duration::days(7));
        assert_eq!(refresh.created_by_ip, "10.0.0.7");
        assert!(refresh.revoked.is_none());
        assert!(refresh.replaced_by_token.is_none());
        assert_eq!(refresh.token.len(), 32);
        assert!(refresh.token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let issuer = system_issuer("test-secret-key-that-is-long-enough");
        let user = test_user();

        let first = issuer.issue_refresh_token(&user, "10.0.0.7");
        let second = issuer.issue_refresh_token(&user, "10.0.0.7");
        assert_ne!(first.token, second.token);
    }

    #[test]
    fn test_token_error_display() {
        assert_eq!(
            TokenError::InvalidSignature.to_string(),
            "invalid token signature"
        );
        assert_eq!(TokenError::TokenExpired.to_string(), "token has expired");
        assert_eq!(TokenError::MalformedToken.to_string(), "malformed token");
        assert_eq!(
            TokenError::EmptySecret.to_string(),
            "signing secret must not be empty"
        );
        assert_eq!(
            TokenError::ClaimRejected("audience mismatch".to_string()).to_string(),
            "rejected claim: audience mismatch"
        );
    }
}
