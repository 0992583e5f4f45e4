//! Client profile management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use tienda_core::UserId;

use super::ApiJson;
use crate::db::ClientStore;
use crate::error::{AppError, Result};
use crate::models::{ClientInput, ClientWithUser};
use crate::state::AppState;

fn not_found(user_id: &str) -> AppError {
    AppError::NotFound(format!(
        "No se encontró ningún cliente asociado al usuario con id '{user_id}'"
    ))
}

/// Parse the path segment. A non-numeric id cannot own a profile.
fn path_user_id(raw: &str) -> Result<UserId> {
    raw.parse().map_err(|_| not_found(raw))
}

/// List every client profile with its owner's public fields.
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn index(State(state): State<AppState>) -> Result<Json<Vec<ClientWithUser>>> {
    Ok(Json(state.store().list_clients().await?))
}

/// The profile owned by `user_id`.
///
/// # Errors
///
/// Returns 404 when the user has no profile.
pub async fn show(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ClientWithUser>> {
    let id = path_user_id(&user_id)?;

    state
        .store()
        .find_client_with_user(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&user_id))
}

/// Create a profile for the user named in `usuario`.
///
/// # Errors
///
/// Returns 400 for invalid fields, an unknown user, a user that already has
/// a profile, or a reused document.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ClientInput>,
) -> Result<impl IntoResponse> {
    let client = state.store().create_client(input.into_new_client()?).await?;

    tracing::info!(user_id = %client.user_id, client_id = %client.id, "Client created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "mensaje": "Cliente creado exitosamente", "cliente": client })),
    ))
}

/// Update the profile owned by `user_id`.
///
/// # Errors
///
/// Returns 404 when the user has no profile and 400 for invalid fields.
pub async fn update(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    ApiJson(input): ApiJson<ClientInput>,
) -> Result<impl IntoResponse> {
    let id = path_user_id(&user_id)?;
    let changes = input.into_changes()?;

    let client = state
        .store()
        .update_client(id, changes)
        .await?
        .ok_or_else(|| not_found(&user_id))?;

    Ok(Json(json!({ "mensaje": "Cliente actualizado exitosamente", "cliente": client })))
}

/// Delete the profile owned by `user_id`, history included. The user stays.
///
/// # Errors
///
/// Returns 404 when the user has no profile.
pub async fn destroy(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse> {
    let id = path_user_id(&user_id)?;

    if !state.store().delete_client(id).await? {
        return Err(not_found(&user_id));
    }

    tracing::info!(user_id = %id, "Client deleted");
    Ok(Json(json!({ "mensaje": "Cliente eliminado exitosamente." })))
}
