//! Authentication for the upload gateway
//!
//! Passwords are hashed with argon2 before they ever leave the gateway; the
//! metadata node only stores the hash. Logged-in users get a stateless HS256
//! JWT bearer token.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::common::utils::timestamp_now;

/// Token lifetime (24 hours, matching the original session length)
const TOKEN_EXPIRATION_SECS: u64 = 24 * 3600;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Password hash error: {0}")]
    Hash(String),

    #[error("JWT error: {0}")]
    Jwt(String),

    #[error("Invalid or expired token")]
    InvalidToken,
}

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    /// Issued at (Unix timestamp)
    pub iat: u64,
}

/// Hashes passwords and issues/verifies bearer tokens.
pub struct Authenticator {
    jwt_encoding_key: EncodingKey,
    jwt_decoding_key: DecodingKey,
    argon2: Argon2<'static>,
}

impl Authenticator {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            jwt_encoding_key: EncodingKey::from_secret(secret),
            jwt_decoding_key: DecodingKey::from_secret(secret),
            argon2: Argon2::default(),
        }
    }

    /// Hash a password for storage
    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AuthError::Hash(e.to_string()))
    }

    /// Verify a password against a stored hash
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }

    /// Issue a bearer token for an authenticated user
    pub fn issue_token(&self, username: &str) -> Result<String, AuthError> {
        let now = timestamp_now();

        let claims = Claims {
            sub: username.to_string(),
            exp: now + TOKEN_EXPIRATION_SECS,
            iat: now,
        };

        encode(&Header::default(), &claims, &self.jwt_encoding_key)
            .map_err(|e| AuthError::Jwt(e.to_string()))
    }

    /// Verify a bearer token and return the username it was issued to
    pub fn verify_token(&self, token: &str) -> Result<String, AuthError> {
        decode::<Claims>(token, &self.jwt_decoding_key, &Validation::default())
            .map(|data| data.claims.sub)
            .map_err(|_| AuthError::InvalidToken)
    }
}

/// Username extracted from a valid bearer token, available to handlers
/// behind [`require_auth`] via request extensions.
#[derive(Debug, Clone)]
pub struct AuthUser(pub String);

/// Authentication middleware: validates the `Authorization: Bearer` header
/// and injects [`AuthUser`] into request extensions.
pub async fn require_auth(
    State(auth): State<Arc<Authenticator>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let token = match header.and_then(|h| h.strip_prefix("Bearer ")) {
        Some(t) => t,
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "Missing or invalid token" })),
            )
                .into_response();
        }
    };

    match auth.verify_token(token) {
        Ok(username) => {
            request.extensions_mut().insert(AuthUser(username));
            next.run(request).await
        }
        Err(_) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid or expired token" })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let auth = Authenticator::new(b"test-secret");
        let hash = auth.hash_password("hunter2").unwrap();
        assert_ne!(hash, "hunter2");
        assert!(auth.verify_password("hunter2", &hash));
        assert!(!auth.verify_password("wrong", &hash));
    }

    #[test]
    fn test_token_roundtrip() {
        let auth = Authenticator::new(b"test-secret");
        let token = auth.issue_token("alice").unwrap();
        assert_eq!(auth.verify_token(&token).unwrap(), "alice");
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let auth = Authenticator::new(b"test-secret");
        let other = Authenticator::new(b"other-secret");
        let token = auth.issue_token("alice").unwrap();
        assert!(other.verify_token(&token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let auth = Authenticator::new(b"test-secret");
        assert!(auth.verify_token("not-a-jwt").is_err());
    }
}
