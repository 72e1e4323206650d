//! Bearer-token validation.
//!
//! Atelier does not manage accounts or sessions — tokens are issued by the
//! surrounding identity provider. This module only validates them and
//! extracts the claims the API and gateway need.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims embedded in access tokens.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Display name
    pub name: String,
    /// Issued at
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Validate and decode a JWT token.
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(token_data.claims)
}

/// Mint an access token. Used by local tooling and tests; production tokens
/// come from the identity provider with the same claims layout.
pub fn generate_access_token(
    user_id: Uuid,
    name: &str,
    secret: &str,
    ttl_secs: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: user_id.to_string(),
        name: name.to_string(),
        iat: now.timestamp(),
        exp: (now + Duration::seconds(ttl_secs as i64)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_claims() {
        let uid = Uuid::now_v7();
        let token = generate_access_token(uid, "alice", "test-secret", 60).unwrap();
        let claims = validate_token(&token, "test-secret").unwrap();
        assert_eq!(claims.sub, uid.to_string());
        assert_eq!(claims.name, "alice");
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = generate_access_token(Uuid::now_v7(), "alice", "secret-a", 60).unwrap();
        assert!(validate_token(&token, "secret-b").is_err());
    }
}
