//! Session tokens and password hashing.

pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::SecurityConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error("Hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the session owner.
    pub sub: String,
    pub iss: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn new(username: impl Into<String>, security: &SecurityConfig) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(security.token_expiry_hours)).timestamp();

        Self {
            sub: username.into(),
            iss: security.token_issuer.clone(),
            iat: now.timestamp(),
            exp,
        }
    }
}

pub fn issue_token(username: &str, security: &SecurityConfig) -> Result<String, AuthError> {
    let claims = Claims::new(username, security);
    let key = EncodingKey::from_secret(security.auth_secret_key.as_bytes());
    Ok(encode(&Header::new(Algorithm::HS256), &claims, &key)?)
}

/// Check signature, algorithm, issuer and expiry.
pub fn verify_token(token: &str, security: &SecurityConfig) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(security.auth_secret_key.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[security.token_issuer.as_str()]);

    let data = decode::<Claims>(token, &key, &validation)?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn security() -> SecurityConfig {
        let mut config = AppConfig::development();
        config.security.auth_secret_key = "0123456789abcdef0123456789abcdef".to_string();
        config.security
    }

    #[test]
    fn test_token_round_trip() {
        let security = security();
        let token = issue_token("alice", &security).unwrap();
        let claims = verify_token(&token, &security).unwrap();
        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.iss, "agora-api");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let security = security();
        let token = issue_token("alice", &security).unwrap();

        let mut other = security.clone();
        other.auth_secret_key = "ffffffffffffffffffffffffffffffff".to_string();
        assert!(matches!(verify_token(&token, &other), Err(AuthError::Token(_))));
    }

    #[test]
    fn test_wrong_issuer_rejected() {
        let security = security();
        let token = issue_token("alice", &security).unwrap();

        let mut other = security.clone();
        other.token_issuer = "someone-else".to_string();
        assert!(verify_token(&token, &other).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let mut security = security();
        security.token_expiry_hours = -2;
        let token = issue_token("alice", &security).unwrap();
        assert!(verify_token(&token, &security).is_err());
    }
}
