use std::time::{SystemTime, UNIX_EPOCH};

use crate::models::{Claims, TokenType};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

fn now() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

pub struct TokenIdentity {
    pub user_id: u64,
    pub username: String,
    pub role: u8,
    pub organization_id: u64,
    pub employee_id: Option<u64>,
}

pub fn generate_access_token(identity: &TokenIdentity, secret: &str, ttl: usize) -> String {
    let claims = Claims {
        user_id: identity.user_id,
        sub: identity.username.clone(),
        role: identity.role,
        organization_id: identity.organization_id,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type: TokenType::Access,
        employee_id: identity.employee_id,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

pub fn generate_refresh_token(
    identity: &TokenIdentity,
    secret: &str,
    ttl: usize,
) -> (String, Claims) {
    let claims = Claims {
        user_id: identity.user_id,
        sub: identity.username.clone(),
        role: identity.role,
        organization_id: identity.organization_id,
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type: TokenType::Refresh,
        employee_id: identity.employee_id,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap();

    (token, claims)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> TokenIdentity {
        TokenIdentity {
            user_id: 42,
            username: "jdoe".into(),
            role: 3,
            organization_id: 1,
            employee_id: Some(1001),
        }
    }

    #[test]
    fn access_token_round_trips() {
        let token = generate_access_token(&identity(), "secret", 900);
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.user_id, 42);
        assert_eq!(claims.sub, "jdoe");
        assert_eq!(claims.organization_id, 1);
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(claims.employee_id, Some(1001));
    }

    #[test]
    fn refresh_token_carries_refresh_type_and_jti() {
        let (token, issued) = generate_refresh_token(&identity(), "secret", 604_800);
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.token_type, TokenType::Refresh);
        assert_eq!(claims.jti, issued.jti);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(&identity(), "secret", 900);
        assert!(verify_token(&token, "other-secret").is_err());
    }
}
