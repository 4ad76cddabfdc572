//! Access and refresh tokens (HS256 JWTs).

use crate::config::TokenConfig;
use crate::domain::models::User;
use crate::error::AppError;
use bson::oid::ObjectId;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid or expired token: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("token subject is not a valid id")]
    Subject,
}

impl From<TokenError> for AppError {
    fn from(_: TokenError) -> Self {
        AppError::unauthorized("Invalid or expired token")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    #[serde(rename = "_id")]
    pub sub: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub iat: u64,
    pub exp: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(rename = "_id")]
    pub sub: String,
    /// Makes every issued refresh token distinct, so a rotated one never matches again.
    pub jti: String,
    pub iat: u64,
    pub exp: u64,
}

impl AccessClaims {
    pub fn user_id(&self) -> Result<ObjectId, TokenError> {
        ObjectId::parse_str(&self.sub).map_err(|_| TokenError::Subject)
    }
}

impl RefreshClaims {
    pub fn user_id(&self) -> Result<ObjectId, TokenError> {
        ObjectId::parse_str(&self.sub).map_err(|_| TokenError::Subject)
    }
}

#[derive(Clone)]
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn from_secret(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

#[derive(Clone)]
pub struct TokenService {
    access: Keys,
    refresh: Keys,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(config: &TokenConfig) -> Self {
        Self {
            access: Keys::from_secret(&config.access_secret),
            refresh: Keys::from_secret(&config.refresh_secret),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
        }
    }

    pub fn issue_access(&self, user: &User) -> Result<String, TokenError> {
        let iat = jsonwebtoken::get_current_timestamp();
        let claims = AccessClaims {
            sub: user.id.to_hex(),
            email: user.email.clone(),
            username: user.username.clone(),
            full_name: user.full_name.clone(),
            iat,
            exp: iat + self.access_ttl.as_secs(),
        };
        Ok(encode(&Header::default(), &claims, &self.access.encoding)?)
    }

    pub fn issue_refresh(&self, user_id: ObjectId) -> Result<String, TokenError> {
        let iat = jsonwebtoken::get_current_timestamp();
        let claims = RefreshClaims {
            sub: user_id.to_hex(),
            jti: uuid::Uuid::new_v4().to_string(),
            iat,
            exp: iat + self.refresh_ttl.as_secs(),
        };
        Ok(encode(&Header::default(), &claims, &self.refresh.encoding)?)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        let data = decode::<AccessClaims>(token, &self.access.decoding, &validation())?;
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        let data = decode::<RefreshClaims>(token, &self.refresh.decoding, &validation())?;
        Ok(data.claims)
    }
}

fn validation() -> Validation {
    Validation::new(Algorithm::HS256)
}

/// Parse `12h`, `20d`, `15m` style lifetimes.
pub fn parse_expiry(raw: &str) -> Result<Duration, humantime::DurationError> {
    humantime::parse_duration(raw.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::MediaAsset;
    use bson::DateTime;

    fn config() -> TokenConfig {
        TokenConfig {
            access_secret: "access-secret".into(),
            access_ttl: Duration::from_secs(3600),
            refresh_secret: "refresh-secret".into(),
            refresh_ttl: Duration::from_secs(86400),
        }
    }

    fn user() -> User {
        let now = DateTime::now();
        User {
            id: ObjectId::new(),
            username: "chai".into(),
            email: "chai@example.com".into(),
            full_name: "Chai Code".into(),
            avatar: MediaAsset {
                url: "u".into(),
                public_id: "p".into(),
            },
            cover_image: None,
            watch_history: vec![],
            password: "hash".into(),
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_access_token_carries_profile_claims() {
        let tokens = TokenService::new(&config());
        let user = user();
        let token = tokens.issue_access(&user).unwrap();
        let claims = tokens.verify_access(&token).unwrap();
        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.username, "chai");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_refresh_tokens_are_unique() {
        let tokens = TokenService::new(&config());
        let id = ObjectId::new();
        let first = tokens.issue_refresh(id).unwrap();
        let second = tokens.issue_refresh(id).unwrap();
        assert_ne!(first, second);
        assert_eq!(tokens.verify_refresh(&second).unwrap().user_id().unwrap(), id);
    }

    #[test]
    fn test_tokens_are_not_interchangeable() {
        let tokens = TokenService::new(&config());
        let refresh = tokens.issue_refresh(ObjectId::new()).unwrap();
        assert!(tokens.verify_access(&refresh).is_err());
        let access = tokens.issue_access(&user()).unwrap();
        assert!(tokens.verify_refresh(&access).is_err());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let tokens = TokenService::new(&config());
        let past = jsonwebtoken::get_current_timestamp() - 7200;
        let claims = AccessClaims {
            sub: ObjectId::new().to_hex(),
            email: "e".into(),
            username: "u".into(),
            full_name: "f".into(),
            iat: past - 3600,
            exp: past,
        };
        let token = encode(&Header::default(), &claims, &tokens.access.encoding).unwrap();
        assert!(tokens.verify_access(&token).is_err());
    }

    #[test]
    fn test_expiry_parsing() {
        assert_eq!(parse_expiry("12h").unwrap(), Duration::from_secs(12 * 3600));
        assert_eq!(parse_expiry("20d").unwrap(), Duration::from_secs(20 * 86400));
        assert!(parse_expiry("soon").is_err());
    }
}
