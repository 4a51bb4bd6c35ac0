pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::{SecurityConfig, MAX_JWT_EXPIRY_HOURS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id of the token holder
    pub sub: Uuid,
    pub exp: i64,
    pub iat: i64,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("JWT secret not configured")]
    MissingSecret,

    #[error("JWT generation error: {0}")]
    Generation(#[source] jsonwebtoken::errors::Error),

    #[error("Invalid JWT token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Issues and verifies the HS256 bearer tokens that identify a user.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::MissingSecret);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
            ttl,
        })
    }

    /// Lifetimes beyond `MAX_JWT_EXPIRY_HOURS` are capped; `validate` rejects them up front.
    pub fn from_config(config: &SecurityConfig) -> Result<Self, TokenError> {
        let hours = config.jwt_expiry_hours.min(MAX_JWT_EXPIRY_HOURS) as i64;
        Self::new(&config.jwt_secret, Duration::hours(hours))
    }

    /// Sign a token for `user_id` that expires after the configured lifetime.
    pub fn issue(&self, user_id: Uuid) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            exp: (now + self.ttl).timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(TokenError::Generation)
    }

    /// Check signature and expiry, returning the embedded claims.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Invalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, Duration::hours(1)).unwrap()
    }

    #[test]
    fn issued_token_round_trips_subject() {
        let tokens = service("secret");
        let user_id = Uuid::new_v4();
        let claims = tokens.verify(&tokens.issue(user_id).unwrap()).unwrap();
        assert_eq!(claims.sub, user_id);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn rejects_token_signed_with_other_secret() {
        let token = service("one").issue(Uuid::new_v4()).unwrap();
        assert!(matches!(service("two").verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn oversized_configured_lifetime_is_capped() {
        let config = SecurityConfig {
            jwt_secret: "secret".to_string(),
            jwt_expiry_hours: u64::MAX,
            cors_origins: Vec::new(),
        };
        let tokens = TokenService::from_config(&config).unwrap();
        let claims = tokens.verify(&tokens.issue(Uuid::new_v4()).unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_JWT_EXPIRY_HOURS as i64 * 3600);
    }

    #[test]
    fn rejects_expired_token() {
        let expired = TokenService::new("secret", Duration::hours(-2)).unwrap();
        let token = expired.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(service("secret").verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn rejects_garbage() {
        assert!(service("secret").verify("not.a.jwt").is_err());
    }

    #[test]
    fn requires_secret() {
        assert!(matches!(
            TokenService::new("", Duration::hours(1)),
            Err(TokenError::MissingSecret)
        ));
    }
}
