//! services/api/src/web/tokens.rs
//!
//! JWT issuance and verification for the access/refresh token pair.
//!
//! Both tokens carry the same claims (`sub` = user id, `exp` = epoch expiry)
//! but are signed with two independent HS256 secrets and lifetimes, so an
//! access token can never be replayed as a refresh token or vice versa.
//! Tokens are stateless: nothing is stored server-side and there is no
//! revocation list.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{Config, ACCESS_TOKEN_EXPIRE_MINUTES};

/// Why a token failed verification. Callers surface `Expired` and `Invalid`
/// with distinct messages but the same unauthorized status.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token")]
    Invalid,
}

/// Claims embedded in every token we mint.
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Subject - user ID (UUID string).
    sub: String,
    /// Expiration (Unix timestamp).
    exp: i64,
}

/// The two signing secrets and the configurable refresh lifetime.
#[derive(Clone)]
pub struct TokenConfig {
    access_secret: String,
    refresh_secret: String,
    refresh_ttl_minutes: i64,
}

impl TokenConfig {
    pub fn new(access_secret: String, refresh_secret: String, refresh_ttl_minutes: i64) -> Self {
        Self {
            access_secret,
            refresh_secret,
            refresh_ttl_minutes,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.access_token_secret.clone(),
            config.refresh_token_secret.clone(),
            config.refresh_token_expire_minutes,
        )
    }

    /// Issue a signed access token for `user_id`.
    pub fn issue_access(&self, user_id: Uuid) -> Result<String, TokenError> {
        issue(user_id, &self.access_secret, ACCESS_TOKEN_EXPIRE_MINUTES)
    }

    /// Issue a signed refresh token for `user_id`.
    pub fn issue_refresh(&self, user_id: Uuid) -> Result<String, TokenError> {
        issue(user_id, &self.refresh_secret, self.refresh_ttl_minutes)
    }

    /// Verify an access token and return the subject it asserts.
    pub fn verify_access(&self, token: &str) -> Result<Uuid, TokenError> {
        verify(token, &self.access_secret)
    }

    /// Verify a refresh token and return the subject it asserts.
    pub fn verify_refresh(&self, token: &str) -> Result<Uuid, TokenError> {
        verify(token, &self.refresh_secret)
    }
}

fn issue(user_id: Uuid, secret: &str, ttl_minutes: i64) -> Result<String, TokenError> {
    let expire = Utc::now() + Duration::minutes(ttl_minutes);
    let claims = Claims {
        sub: user_id.to_string(),
        exp: expire.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| TokenError::Invalid)
}

fn verify(token: &str, secret: &str) -> Result<Uuid, TokenError> {
    // Pin the algorithm: a token signed with anything but HS256 must be
    // rejected outright.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_required_spec_claims(&["sub", "exp"]);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid,
    })?;

    Uuid::parse_str(&data.claims.sub).map_err(|_| TokenError::Invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> TokenConfig {
        TokenConfig::new(
            "test-access-secret".to_string(),
            "test-refresh-secret".to_string(),
            43200,
        )
    }

    #[test]
    fn access_token_roundtrip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = config.issue_access(user_id).unwrap();
        assert_eq!(config.verify_access(&token).unwrap(), user_id);
    }

    #[test]
    fn refresh_token_roundtrip() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let token = config.issue_refresh(user_id).unwrap();
        assert_eq!(config.verify_refresh(&token).unwrap(), user_id);
    }

    #[test]
    fn access_and_refresh_tokens_are_not_interchangeable() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        let access = config.issue_access(user_id).unwrap();
        let refresh = config.issue_refresh(user_id).unwrap();

        assert_eq!(config.verify_refresh(&access), Err(TokenError::Invalid));
        assert_eq!(config.verify_access(&refresh), Err(TokenError::Invalid));
    }

    #[test]
    fn expired_token_is_distinguished_from_invalid() {
        let config = test_config();
        let user_id = Uuid::new_v4();

        // Craft a token whose expiry is an hour in the past, signed with the
        // real access secret.
        let claims = Claims {
            sub: user_id.to_string(),
            exp: (Utc::now() - Duration::hours(1)).timestamp(),
        };
        let stale = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-access-secret".as_bytes()),
        )
        .unwrap();

        assert_eq!(config.verify_access(&stale), Err(TokenError::Expired));
        assert_eq!(
            config.verify_access("not-even-a-jwt"),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn token_with_wrong_secret_is_invalid() {
        let config = test_config();
        let other = TokenConfig::new(
            "some-other-secret".to_string(),
            "another-secret".to_string(),
            43200,
        );
        let token = other.issue_access(Uuid::new_v4()).unwrap();

        assert_eq!(config.verify_access(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn token_with_non_uuid_subject_is_invalid() {
        let config = test_config();
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret("test-access-secret".as_bytes()),
        )
        .unwrap();

        assert_eq!(config.verify_access(&token), Err(TokenError::Invalid));
    }
}
