//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! tienda-cli user create -e admin@tienda.test -n "Admin" -p 'una-clave-larga' -r admin
//! ```
//!
//! Input goes through the same validation and password hashing as
//! `POST /v2/api/auth/register`, except that a role may be given.

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use tienda_api::db::{self, PgStore, RepositoryError, UserStore};
use tienda_api::models::{Registration, UserInput};
use tienda_api::services::auth::hash_password;
use tienda_core::{UserId, ValidationErrors};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Input rejected by validation.
    #[error("Invalid user: {0}")]
    Invalid(#[from] ValidationErrors),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("Could not hash the password")]
    PasswordHash,

    #[error("Store error: {0}")]
    Repository(RepositoryError),
}

/// Validate the command-line input like a registration payload.
///
/// # Errors
///
/// Returns every field problem found.
pub fn registration(
    email: &str,
    name: &str,
    password: &SecretString,
    role: &str,
) -> Result<Registration, ValidationErrors> {
    UserInput {
        nombre_completo: Some(name.to_owned()),
        correo: Some(email.to_owned()),
        password: Some(password.expose_secret().to_owned()),
        rol: Some(role.to_owned()),
        fecha_nacimiento: None,
    }
    .into_registration()
}

/// Create a new user.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns an error if the input is invalid, the email is taken or the
/// database fails.
pub async fn create(
    email: &str,
    name: &str,
    password: &SecretString,
    role: &str,
) -> Result<UserId, UserError> {
    // Validate before connecting
    let registration = registration(email, name, password, role)?;

    let database_url =
        super::database_url().ok_or(UserError::MissingEnvVar("API_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;
    let store = PgStore::new(pool.clone());

    tracing::info!(
        "Creating user: {} ({})",
        registration.email,
        registration.role
    );

    let password_hash = hash_password(registration.password.expose_secret())
        .map_err(|_| UserError::PasswordHash)?;
    let normalized = registration.email.to_string();

    let user = store
        .create_user(registration.into_new_user(password_hash))
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => UserError::UserExists(normalized),
            other => UserError::Repository(other),
        })?;
    pool.close().await;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );

    Ok(user.id)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tienda_core::Role;

    use super::*;

    #[test]
    fn test_registration_normalizes_and_keeps_role() {
        let password = SecretString::from("una-clave-larga");
        let registration = registration(" Admin@Tienda.test ", "Admin", &password, "admin").unwrap();
        assert_eq!(registration.email.as_str(), "admin@tienda.test");
        assert_eq!(registration.role, Role::Admin);
    }

    #[test]
    fn test_registration_rejects_weak_input() {
        let password = SecretString::from("corta");
        let errors = registration("no-es-correo", "Admin", &password, "jefe").unwrap_err();
        assert_eq!(errors.fields(), vec!["correo", "password", "rol"]);
    }
}
