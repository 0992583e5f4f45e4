//! Authentication error types.

use thiserror::Error;

use super::token::TokenError;
use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
///
/// The `Display` text of the first four variants is shown to users.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The email is already registered.
    #[error("El correo ya está registrado. Usa otro correo.")]
    EmailTaken,

    /// No account exists for the email.
    #[error("Este correo no está registrado.")]
    NotRegistered,

    /// The password does not match the stored hash.
    #[error("Contraseña incorrecta.")]
    IncorrectPassword,

    /// Password too weak or invalid.
    #[error("{0}")]
    WeakPassword(String),

    /// The token is missing a valid signature or has expired.
    #[error("token error: {0}")]
    Token(#[from] TokenError),

    /// A freshly issued token could not be signed.
    #[error("could not issue token: {0}")]
    TokenIssue(TokenError),

    /// The token is valid but its user has been deleted.
    #[error("token refers to a user that no longer exists")]
    UnknownUser,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
