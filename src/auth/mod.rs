pub mod capability;
pub mod nonce;
pub mod password;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;

pub use capability::{Capability, Role};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: Uuid, username: String, role: Role) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            username,
            role,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Invalid JWT secret")]
    InvalidSecret,

    #[error("JWT generation error: {0}")]
    TokenGeneration(String),

    #[error("{0}")]
    Invalid(String),

    #[error("Token is too old to refresh, please log in again")]
    RefreshWindowExpired,
}

fn secret() -> Result<&'static str, JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }
    Ok(secret)
}

pub fn generate_jwt(claims: Claims) -> Result<String, JwtError> {
    let encoding_key = EncodingKey::from_secret(secret()?.as_bytes());
    let header = Header::default();

    encode(&header, &claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Decode and validate a bearer token, including expiry
pub fn decode_jwt(token: &str) -> Result<Claims, JwtError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Invalid("Token has expired".to_string()),
            _ => JwtError::Invalid("Invalid token".to_string()),
        })
}

/// Decode a token for refresh: the signature must be valid, and an expired
/// token is accepted until `refresh_grace_hours` past its expiry.
pub fn decode_for_refresh(token: &str) -> Result<Claims, JwtError> {
    let decoding_key = DecodingKey::from_secret(secret()?.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;

    let claims = decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|_| JwtError::Invalid("Invalid token".to_string()))?;

    let grace = Duration::hours(config::config().security.refresh_grace_hours as i64).num_seconds();
    if Utc::now().timestamp() > claims.exp + grace {
        return Err(JwtError::RefreshWindowExpired);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_claims() {
        let id = Uuid::new_v4();
        let token = generate_jwt(Claims::new(id, "jdoe".into(), Role::HrManager)).unwrap();
        let claims = decode_jwt(&token).unwrap();
        assert_eq!(claims.sub, id);
        assert_eq!(claims.role, Role::HrManager);
    }

    #[test]
    fn expired_token_is_rejected_but_refreshable_within_grace() {
        let mut claims = Claims::new(Uuid::new_v4(), "jdoe".into(), Role::Employee);
        claims.iat -= 7200;
        claims.exp = Utc::now().timestamp() - 3600;
        let token = generate_jwt(claims).unwrap();

        assert!(matches!(decode_jwt(&token), Err(JwtError::Invalid(_))));
        assert!(decode_for_refresh(&token).is_ok());
    }

    #[test]
    fn token_past_grace_cannot_refresh() {
        let grace = config::config().security.refresh_grace_hours as i64;
        let mut claims = Claims::new(Uuid::new_v4(), "jdoe".into(), Role::Employee);
        claims.exp = Utc::now().timestamp() - (grace + 1) * 3600;
        let token = generate_jwt(claims).unwrap();

        assert!(matches!(decode_for_refresh(&token), Err(JwtError::RefreshWindowExpired)));
    }

    #[test]
    fn tampered_token_is_rejected() {
        let token = generate_jwt(Claims::new(Uuid::new_v4(), "jdoe".into(), Role::Employee)).unwrap();
        let tampered = format!("{}x", token);
        assert!(decode_jwt(&tampered).is_err());
        assert!(decode_for_refresh(&tampered).is_err());
    }
}
