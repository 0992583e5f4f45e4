//! Authentication service.
//!
//! Registers users, verifies passwords and issues the identity token.

mod error;
pub mod token;

pub use error::AuthError;
pub use token::{Claims, TOKEN_TTL_SECONDS, TokenError, TokenService};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use secrecy::ExposeSecret;

use tienda_core::Email;

use crate::db::{RepositoryError, UserStore};
use crate::models::{Registration, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Result of a successful login.
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

/// Authentication service.
///
/// Handles registration, login and resolving a token back to its user.
pub struct AuthService<'a, S> {
    users: &'a S,
    tokens: &'a TokenService,
}

impl<'a, S: UserStore> AuthService<'a, S> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(users: &'a S, tokens: &'a TokenService) -> Self {
        Self { users, tokens }
    }

    /// Hash the password and store a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailTaken` if the email is already registered.
    pub async fn register(&self, registration: Registration) -> Result<User, AuthError> {
        let password_hash = hash_password(registration.password.expose_secret())?;

        self.users
            .create_user(registration.into_new_user(password_hash))
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailTaken,
                other => AuthError::Repository(other),
            })
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotRegistered` for an unknown (or malformed)
    /// email and `AuthError::IncorrectPassword` for a wrong password.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::NotRegistered)?;

        let credentials = self
            .users
            .find_credentials(&email)
            .await?
            .ok_or(AuthError::NotRegistered)?;

        verify_password(password, &credentials.password_hash)?;

        let token = self
            .tokens
            .issue(credentials.user.id)
            .map_err(AuthError::TokenIssue)?;
        Ok(LoginOutcome {
            token,
            user: credentials.user,
        })
    }

    /// Verify `token` and load the user it names.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Token` for a bad or expired token and
    /// `AuthError::UnknownUser` if the user has been deleted since.
    pub async fn resolve(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token)?;

        self.users
            .find_user_by_id(claims.id)
            .await?
            .ok_or(AuthError::UnknownUser)
    }

    /// Resolve the first usable token out of `candidates`, in order.
    ///
    /// A rejected token moves on to the next candidate. Store failures stop
    /// the search.
    ///
    /// # Errors
    ///
    /// Returns the last rejection when no candidate resolves, and
    /// `TokenError::Missing` if `candidates` is empty.
    pub async fn resolve_any(&self, candidates: &[String]) -> Result<User, AuthError> {
        let mut last = AuthError::Token(TokenError::Missing);
        for token in candidates {
            match self.resolve(token).await {
                Ok(user) => return Ok(user),
                Err(e @ (AuthError::Token(_) | AuthError::UnknownUser)) => {
                    tracing::debug!(error = %e, "Skipping unusable identity token");
                    last = e;
                }
                Err(e) => return Err(e),
            }
        }
        Err(last)
    }
}

/// Check password strength rules.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` with a user-facing message.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "La contraseña debe tener al menos {MIN_PASSWORD_LENGTH} caracteres."
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::IncorrectPassword)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::IncorrectPassword)
}
