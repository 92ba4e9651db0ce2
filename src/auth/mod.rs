use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::SecurityConfig;

/// Account kind carried in the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Professional,
    Patient,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: i64,
    pub role: Role,
    pub login: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

impl Claims {
    pub fn new(user_id: i64, role: Role, login: String, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id.to_string(),
            user_id,
            role,
            login,
            exp,
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT secret not configured")]
    InvalidSecret,

    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

pub fn generate_jwt(claims: &Claims, security: &SecurityConfig) -> Result<String, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(security.jwt_secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key).map_err(|e| AuthError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str, security: &SecurityConfig) -> Result<Claims, AuthError> {
    if security.jwt_secret.is_empty() {
        return Err(AuthError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(security.jwt_secret.as_bytes());
    decode::<Claims>(token, &decoding_key, &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

/// bcrypt is CPU-bound, so both helpers run on the blocking pool.
pub async fn hash_password(password: String, cost: u32) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

pub async fn verify_password(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}
