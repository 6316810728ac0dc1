//! JWT verification for handshake and HTTP credentials.
//!
//! Tokens are HS256-signed and carry the user ID in a `user_id` claim.
//! Issuing tokens belongs to the authentication service; this module only
//! verifies them.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::UserId;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Expiration time (Unix timestamp, seconds)
    pub exp: u64,
    /// Issued at time (Unix timestamp, seconds)
    #[serde(default)]
    pub iat: u64,
}

/// Credential verification errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Token not provided")]
    MissingToken,

    #[error("Authorization header must be 'Bearer <token>'")]
    MalformedHeader,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Verifies HS256 tokens against a shared secret
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Verify signature and expiry, returning the authenticated user.
    pub fn verify(&self, token: &str) -> Result<UserId, AuthError> {
        if token.trim().is_empty() {
            return Err(AuthError::MissingToken);
        }
        let data = decode::<Claims>(token, &self.key, &self.validation)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))?;
        Ok(UserId::new(data.claims.user_id))
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingToken)?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MalformedHeader)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MalformedHeader);
    }
    Ok(token)
}
