//! Session management with JWT bearer tokens.
//!
//! A session binds a token to one user identity; every `/friend` route
//! derives the acting user from the token's claims.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use kinship_domain::UserId;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Session management error
#[derive(Debug, Error)]
pub enum SessionError {
    /// JWT encoding failed
    #[error("Failed to encode JWT: {0}")]
    JwtEncode(#[from] jsonwebtoken::errors::Error),

    /// System clock is before the Unix epoch
    #[error("System clock error: {0}")]
    Clock(String),

    /// Authorization header missing or not a bearer token
    #[error("Missing bearer token")]
    MissingToken,

    /// Token expired
    #[error("Session token expired")]
    TokenExpired,

    /// Invalid token
    #[error("Invalid session token")]
    InvalidToken,
}

/// JWT claims for session tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// User identity (hyphenated UUID)
    pub user_id: String,

    /// Token expiration timestamp (Unix epoch)
    pub exp: u64,

    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
}

impl SessionClaims {
    /// The user identity carried by the token
    pub fn user(&self) -> Result<UserId, SessionError> {
        UserId::from_string(&self.user_id).map_err(|_| SessionError::InvalidToken)
    }
}

/// Session response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    /// JWT session token
    pub token: String,

    /// User the token was issued for
    pub user_id: String,

    /// Seconds until the token expires
    pub expires_in: u64,
}

/// Session manager handles JWT token generation and validation
pub struct SessionManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_expiry_secs: u64,
}

fn now_secs() -> Result<u64, SessionError> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .map_err(|e| SessionError::Clock(e.to_string()))
}

impl SessionManager {
    /// Create a new session manager with the given JWT secret and expiry
    pub fn new(jwt_secret: &str, token_expiry_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            token_expiry_secs,
        }
    }

    /// Generate a new session token for the given user
    pub fn generate_token(&self, user_id: UserId) -> Result<String, SessionError> {
        let now = now_secs()?;

        let claims = SessionClaims {
            user_id: user_id.to_string(),
            exp: now + self.token_expiry_secs,
            iat: now,
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)?;
        Ok(token)
    }

    /// Build the response for a freshly issued token
    pub fn establish(&self, user_id: UserId) -> Result<SessionResponse, SessionError> {
        Ok(SessionResponse {
            token: self.generate_token(user_id)?,
            user_id: user_id.to_string(),
            expires_in: self.token_expiry_secs,
        })
    }

    /// Validate a session token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let validation = Validation::default();
        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => SessionError::TokenExpired,
                _ => SessionError::InvalidToken,
            })?;

        Ok(token_data.claims)
    }

    /// Resolve the acting user from an `Authorization` header value
    pub fn authenticate(&self, authorization: Option<&str>) -> Result<UserId, SessionError> {
        let token = authorization
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(SessionError::MissingToken)?;

        self.validate_token(token)?.user()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_validate_token() {
        let manager = SessionManager::new("test-secret", 3600);
        let user = UserId::new();
        let token = manager.generate_token(user).unwrap();

        let claims = manager.validate_token(&token).unwrap();
        assert_eq!(claims.user_id, user.to_string());
        assert_eq!(claims.user().unwrap(), user);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expired_token() {
        let manager = SessionManager::new("test-secret", 3600);
        let now = now_secs().unwrap();

        let claims = SessionClaims {
            user_id: UserId::new().to_string(),
            exp: now - 100,
            iat: now - 200,
        };

        let token = encode(&Header::default(), &claims, &manager.encoding_key).unwrap();

        let result = manager.validate_token(&token);
        assert!(matches!(result, Err(SessionError::TokenExpired)));
    }

    #[test]
    fn test_invalid_token() {
        let manager = SessionManager::new("test-secret", 3600);
        let result = manager.validate_token("invalid-token");
        assert!(matches!(result, Err(SessionError::InvalidToken)));
    }

    #[test]
    fn test_wrong_secret() {
        let manager1 = SessionManager::new("secret1", 3600);
        let manager2 = SessionManager::new("secret2", 3600);

        let token = manager1.generate_token(UserId::new()).unwrap();
        let result = manager2.validate_token(&token);
        assert!(matches!(result, Err(SessionError::InvalidToken)));
    }

    #[test]
    fn test_authenticate_header_forms() {
        let manager = SessionManager::new("test-secret", 3600);
        let user = UserId::new();
        let token = manager.generate_token(user).unwrap();

        let header = format!("Bearer {}", token);
        assert_eq!(manager.authenticate(Some(&header)).unwrap(), user);

        assert!(matches!(manager.authenticate(None), Err(SessionError::MissingToken)));
        assert!(matches!(
            manager.authenticate(Some(&token)),
            Err(SessionError::MissingToken)
        ));
        assert!(matches!(
            manager.authenticate(Some("Bearer ")),
            Err(SessionError::MissingToken)
        ));
    }

    #[test]
    fn test_token_with_malformed_user_is_invalid() {
        let manager = SessionManager::new("test-secret", 3600);
        let now = now_secs().unwrap();
        let claims = SessionClaims {
            user_id: "not-a-uuid".to_string(),
            exp: now + 60,
            iat: now,
        };
        let token = encode(&Header::default(), &claims, &manager.encoding_key).unwrap();

        let header = format!("Bearer {}", token);
        assert!(matches!(
            manager.authenticate(Some(&header)),
            Err(SessionError::InvalidToken)
        ));
    }

    #[test]
    fn test_establish_reports_expiry() {
        let manager = SessionManager::new("test-secret", 120);
        let user = UserId::new();
        let response = manager.establish(user).unwrap();

        assert_eq!(response.user_id, user.to_string());
        assert_eq!(response.expires_in, 120);
        assert!(manager.validate_token(&response.token).is_ok());
    }
}
