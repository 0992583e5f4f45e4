//! Login, registration and logout pages.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use secrecy::SecretString;
use serde::Deserialize;
use tower_sessions::Session;

use crate::error::{Result, clear_sentry_user};
use crate::filters;
use crate::middleware::{OptionalSession, clear_current_user, set_current_user};
use crate::models::CurrentUser;
use crate::services::BackendError;
use crate::state::AppState;

/// Shown on the login page after a successful registration.
const REGISTERED_BANNER: &str = "¡Registro exitoso! Ahora puedes iniciar sesión.";

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub correo: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    pub nombre_completo: String,
    pub correo: String,
    pub password: String,
}

/// Query parameters of the login page.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    pub registered: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub success: Option<String>,
    pub correo: String,
    pub usuario: Option<CurrentUser>,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
    pub nombre_completo: String,
    pub correo: String,
    pub usuario: Option<CurrentUser>,
}

/// User-facing text for a failed backend call.
fn failure_message(err: &BackendError, fallback: &str) -> String {
    err.backend_message().unwrap_or(fallback).to_string()
}

// =============================================================================
// Login Routes
// =============================================================================

/// Display the login page.
pub async fn login_page(
    OptionalSession(usuario): OptionalSession,
    Query(query): Query<LoginQuery>,
) -> impl IntoResponse {
    let registered = query.registered.as_deref() == Some("true");

    LoginTemplate {
        error: None,
        success: registered.then(|| REGISTERED_BANNER.to_string()),
        correo: String::new(),
        usuario,
    }
}

/// Handle login form submission.
///
/// Keeps the user and the backend token in the session, then goes to the
/// catalog.
///
/// # Errors
///
/// Returns an error if the session cannot be written.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    let password = SecretString::from(form.password);

    match state.backend().login(&form.correo, &password).await {
        Ok(outcome) => {
            let user = CurrentUser::new(outcome.usuario, outcome.token);
            set_current_user(&session, &user).await?;
            tracing::info!(user_id = %user.id, "Logged in");
            Ok(Redirect::to("/catalogo").into_response())
        }
        Err(e) => {
            tracing::warn!(error = %e, "Login failed");
            let page = LoginTemplate {
                error: Some(failure_message(
                    &e,
                    "Credenciales incorrectas o error del servidor",
                )),
                success: None,
                correo: form.correo,
                usuario: None,
            };
            Ok((StatusCode::UNAUTHORIZED, page).into_response())
        }
    }
}

// =============================================================================
// Registration Routes
// =============================================================================

/// Display the registration page.
pub async fn register_page(OptionalSession(usuario): OptionalSession) -> impl IntoResponse {
    RegisterTemplate {
        error: None,
        nombre_completo: String::new(),
        correo: String::new(),
        usuario,
    }
}

/// Handle registration form submission.
pub async fn register(State(state): State<AppState>, Form(form): Form<RegisterForm>) -> Response {
    let password = SecretString::from(form.password);

    match state
        .backend()
        .register(&form.nombre_completo, &form.correo, &password)
        .await
    {
        Ok(()) => Redirect::to("/login?registered=true").into_response(),
        Err(e) => {
            tracing::warn!(error = %e, "Registration failed");
            let page = RegisterTemplate {
                error: Some(failure_message(
                    &e,
                    "No se pudo completar el registro. Verifique sus datos.",
                )),
                nombre_completo: form.nombre_completo,
                correo: form.correo,
                usuario: None,
            };
            (StatusCode::BAD_REQUEST, page).into_response()
        }
    }
}

// =============================================================================
// Logout
// =============================================================================

/// Destroy the session and go back to the login page.
///
/// The backend is told as well; its answer does not change the outcome.
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn logout(
    State(state): State<AppState>,
    OptionalSession(usuario): OptionalSession,
    session: Session,
) -> Result<Redirect> {
    if let Some(user) = usuario {
        if let Err(e) = state.backend().logout(&user.token).await {
            tracing::debug!(error = %e, "Backend logout failed");
        }
        tracing::info!(user_id = %user.id, "Logged out");
    }

    clear_current_user(&session).await?;
    clear_sentry_user();
    Ok(Redirect::to("/login"))
}
