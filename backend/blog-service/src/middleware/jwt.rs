//! Bearer token issuing and validation (HS256).

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Author;
use crate::error::{AppError, Result};

/// JWT claims carried by author tokens.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Author id
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn author_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }
}

/// Sign a token for `author` valid for `ttl_hours`.
pub fn issue_token(author: &Author, secret: &str, ttl_hours: i64) -> Result<String> {
    let now = Utc::now();
    let claims = Claims {
        sub: author.id.to_string(),
        username: author.username.clone(),
        iat: now.timestamp(),
        exp: (now + Duration::hours(ttl_hours)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign token: {}", e)))
}

/// Verify signature and expiry.
pub fn decode_token(
    token: &str,
    secret: &str,
) -> std::result::Result<Claims, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn leo() -> Author {
        Author {
            id: Uuid::new_v4(),
            username: "leo".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            date_joined: Utc::now(),
        }
    }

    #[test]
    fn issued_token_decodes() {
        let author = leo();
        let token = issue_token(&author, SECRET, 1).unwrap();
        let claims = decode_token(&token, SECRET).unwrap();

        assert_eq!(claims.author_id(), Some(author.id));
        assert_eq!(claims.username, "leo");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = issue_token(&leo(), SECRET, 1).unwrap();
        assert!(decode_token(&token, "some-other-secret-of-decent-length!!").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = issue_token(&leo(), SECRET, -2).unwrap();
        assert!(decode_token(&token, SECRET).is_err());
    }
}
