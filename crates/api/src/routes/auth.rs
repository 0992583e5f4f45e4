//! Registration, login and logout.

use axum::{
    Json,
    extract::State,
    http::{StatusCode, header::SET_COOKIE},
    response::{AppendHeaders, IntoResponse},
};
use serde::Deserialize;
use serde_json::json;

use super::ApiJson;
use crate::error::{Result, add_breadcrumb, clear_sentry_user};
use crate::middleware::{OptionalUser, expired_token_cookie, token_cookie};
use crate::models::UserInput;
use crate::services::AuthService;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "email")]
    pub correo: String,
    pub password: String,
}

/// Create an account with the basic role.
///
/// Only name, email and password are taken from the body; a role or birth
/// date sent here is ignored.
///
/// # Errors
///
/// Returns 400 for invalid fields or an email that is already registered.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<UserInput>,
) -> Result<impl IntoResponse> {
    let registration = UserInput {
        rol: None,
        fecha_nacimiento: None,
        ..input
    }
    .into_registration()?;

    let user = AuthService::new(state.store(), state.tokens())
        .register(registration)
        .await?;

    tracing::info!(user_id = %user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "mensaje": "Usuario registrado con éxito.",
            "usuario": user,
        })),
    ))
}

/// Check credentials, issue a token and set it as the `jwt` cookie.
///
/// # Errors
///
/// Returns 400 for an unknown email or a wrong password.
pub async fn login(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> Result<impl IntoResponse> {
    let outcome = AuthService::new(state.store(), state.tokens())
        .login(&request.correo, &request.password)
        .await?;

    add_breadcrumb("auth", "Login", &[("user_id", &outcome.user.id.to_string())]);
    tracing::info!(user_id = %outcome.user.id, "User logged in");

    let cookie = token_cookie(outcome.token.clone(), state.config().cookie_secure);

    Ok((
        AppendHeaders([(SET_COOKIE, cookie.to_string())]),
        Json(json!({
            "mensaje": "Login exitoso",
            "token": outcome.token,
            "usuario": outcome.user,
        })),
    ))
}

/// Expire the `jwt` cookie. The token itself stays valid until it expires.
pub async fn logout(OptionalUser(user): OptionalUser) -> impl IntoResponse {
    if let Some(user) = user {
        tracing::info!(user_id = %user.id, "User logged out");
    }
    clear_sentry_user();

    (
        AppendHeaders([(SET_COOKIE, expired_token_cookie().to_string())]),
        Json(json!({ "mensaje": "Sesión cerrada correctamente." })),
    )
}
