//! User management and the profile endpoint.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use tienda_core::Email;

use super::ApiJson;
use crate::db::{RepositoryError, UserStore};
use crate::error::{AppError, Result, conflict_message};
use crate::middleware::RequireUser;
use crate::models::{ProfileView, User, UserInput};
use crate::services::{AuthError, AuthService, ProfileService};
use crate::state::AppState;

fn not_found(email: &str) -> AppError {
    AppError::NotFound(format!("No se encontró el usuario con correo '{email}'"))
}

/// Parse the path segment. A malformed address cannot name a stored user.
fn path_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|_| not_found(raw))
}

/// List every user.
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<User>>> {
    Ok(Json(state.store().list_users().await?))
}

/// Create a user. Unlike registration, a role and birth date are accepted.
///
/// # Errors
///
/// Returns 400 for invalid fields and 409 for a taken email.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UserInput>,
) -> Result<impl IntoResponse> {
    let registration = input.into_registration()?;

    let user = AuthService::new(state.store(), state.tokens())
        .register(registration)
        .await
        .map_err(|e| match e {
            AuthError::EmailTaken => AppError::Conflict(
                "Error al crear el usuario: el correo ya está registrado.".to_owned(),
            ),
            other => other.into(),
        })?;

    tracing::info!(user_id = %user.id, role = %user.role, "User created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "mensaje": "Usuario creado exitosamente", "usuario": user })),
    ))
}

/// Update the user owning `email`. A password in the body is ignored.
///
/// # Errors
///
/// Returns 404 for an unknown email, 400 for invalid fields and 409 when the
/// new email is taken.
pub async fn update(
    State(state): State<AppState>,
    Path(email): Path<String>,
    ApiJson(input): ApiJson<UserInput>,
) -> Result<impl IntoResponse> {
    let key = path_email(&email)?;
    let changes = input.into_changes()?;

    let user = state
        .store()
        .update_user(&key, changes)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(field) => AppError::Conflict(conflict_message(&field)),
            other => other.into(),
        })?
        .ok_or_else(|| not_found(&email))?;

    Ok(Json(json!({ "mensaje": "Usuario actualizado exitosamente", "usuario": user })))
}

/// Delete the user owning `email`. Their client profile goes with them.
///
/// # Errors
///
/// Returns 404 for an unknown email.
pub async fn destroy(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<impl IntoResponse> {
    let key = path_email(&email)?;

    if !state.store().delete_user(&key).await? {
        return Err(not_found(&email));
    }

    tracing::info!(email = %key, "User deleted");
    Ok(Json(json!({ "mensaje": "Usuario eliminado exitosamente" })))
}

/// The authenticated user with their client profile (or `null`).
///
/// # Errors
///
/// Returns 401 without a valid token and 500 if the store fails.
pub async fn profile(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileView>> {
    let view = ProfileService::new(state.store()).get_profile(user).await?;
    Ok(Json(view))
}
