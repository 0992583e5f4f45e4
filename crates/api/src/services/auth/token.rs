//! Signed identity tokens.
//!
//! Tokens are HS256 JWTs whose claims carry the user id, the issue time
//! and an expiry exactly [`TOKEN_TTL_SECONDS`] later.

use core::fmt;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tienda_core::UserId;

/// Token lifetime: 3 days.
pub const TOKEN_TTL_SECONDS: i64 = 3 * 24 * 60 * 60;

/// Claims carried by every token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user.
    pub id: UserId,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expires at (unix seconds).
    pub exp: i64,
}

/// Errors from issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("could not sign token: {0}")]
    Sign(jsonwebtoken::errors::Error),

    #[error("token has expired")]
    Expired,

    #[error("no token provided")]
    Missing,

    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),
}

/// Issues and verifies tokens with one shared HMAC key.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl fmt::Debug for TokenService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenService")
            .field("key", &"[REDACTED]")
            .field("algorithm", &Algorithm::HS256)
            .finish()
    }
}

impl TokenService {
    /// Build a service around the signing key.
    #[must_use]
    pub fn new(secret: &SecretString) -> Self {
        let key = secret.expose_secret().as_bytes();
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation,
        }
    }

    /// Issue a token for `user_id`, valid from now.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Sign` if encoding fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token as if it were `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Sign` if encoding fails.
    pub fn issue_at(&self, user_id: UserId, issued_at: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = issued_at.timestamp();
        let claims = Claims {
            id: user_id,
            iat,
            exp: iat + TOKEN_TTL_SECONDS,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(TokenError::Sign)
    }

    /// Check the signature and expiry of `token` and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` past the expiry and
    /// `TokenError::Invalid` for anything else wrong with the token.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid(e),
            })
    }
}
