//! Bearer tokens: HS256 JWTs carrying `{id, username, iat, exp}`

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,
    #[error("invalid token signature")]
    BadSignature,
    #[error("token expired")]
    Expired,
    #[error("failed to sign token: {0}")]
    Encode(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::BadSignature,
            _ => Self::Malformed,
        }
    }
}

/// Issue a signed token valid for `ttl_hours`
pub fn issue(secret: &str, id: &str, username: &str, ttl_hours: u64) -> Result<String, TokenError> {
    let iat = Utc::now().timestamp();
    let claims = Claims {
        id: id.to_string(),
        username: username.to_string(),
        iat,
        exp: iat + (ttl_hours as i64) * 3600,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Encode(e.to_string()))
}

/// Verify signature and expiry, returning the claims
pub fn verify(secret: &str, token: &str) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)?;
    Ok(data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    #[test]
    fn test_issue_and_verify() {
        let token = issue("secret", "u1", "alice", 1).unwrap();
        let claims = verify("secret", &token).unwrap();

        assert_eq!(claims.id, "u1");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_wrong_secret() {
        let token = issue("secret", "u1", "alice", 1).unwrap();
        assert_eq!(verify("other", &token), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_tampered_payload() {
        let token = issue("secret", "u1", "alice", 1).unwrap();
        let parts: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(r#"{"id":"u2","username":"mallory","iat":0,"exp":9999999999}"#);
        let tampered = format!("{}.{}.{}", parts[0], forged, parts[2]);
        assert_eq!(verify("secret", &tampered), Err(TokenError::BadSignature));
    }

    #[test]
    fn test_expired() {
        let now = Utc::now().timestamp();
        let claims = Claims {
            id: "u1".to_string(),
            username: "alice".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"secret")).unwrap();
        assert_eq!(verify("secret", &token), Err(TokenError::Expired));
    }

    #[test]
    fn test_rejects_other_algorithms() {
        let claims = Claims {
            id: "u1".to_string(),
            username: "alice".to_string(),
            iat: 0,
            exp: Utc::now().timestamp() + 3600,
        };
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(verify("secret", &token).is_err());
    }

    #[test]
    fn test_malformed() {
        assert_eq!(verify("secret", "abc"), Err(TokenError::Malformed));
        assert_eq!(verify("secret", "a.b.c.d"), Err(TokenError::Malformed));
        assert_eq!(verify("secret", "!!.!!.!!"), Err(TokenError::Malformed));
    }
}
