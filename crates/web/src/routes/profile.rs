//! Profile page and purchases.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use crate::error::{AppError, ErrorTemplate, Result};
use crate::filters;
use crate::middleware::{RequireSession, clear_current_user};
use crate::models::{ClientView, CurrentUser, PurchaseForm, UserView};
use crate::services::BackendError;
use crate::state::AppState;

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/perfil.html")]
pub struct ProfileTemplate {
    /// Session identity, for the header.
    pub usuario: Option<CurrentUser>,
    /// Account as stored by the backend.
    pub cuenta: Option<UserView>,
    pub cliente: Option<ClientView>,
    pub error: Option<String>,
}

/// Checkout form, shown when a first purchase lacks client details.
#[derive(Template, WebTemplate)]
#[template(path = "pages/checkout.html")]
pub struct CheckoutTemplate {
    pub usuario: Option<CurrentUser>,
    pub referencia: String,
    pub form: PurchaseForm,
    pub error: Option<String>,
}

/// Display the user with their client profile and purchase history.
///
/// # Errors
///
/// Returns an error if the session cannot be cleared after the backend
/// rejected the stored token.
pub async fn show(
    State(state): State<AppState>,
    RequireSession(user, session): RequireSession,
) -> Result<Response> {
    match state.backend().profile(&user.token).await {
        Ok(profile) => Ok(ProfileTemplate {
            usuario: Some(user),
            cuenta: Some(profile.usuario),
            cliente: profile.cliente,
            error: None,
        }
        .into_response()),
        Err(BackendError::Unauthorized) => {
            tracing::info!(user_id = %user.id, "Stored token rejected, logging out");
            clear_current_user(&session).await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load the profile");
            let page = ProfileTemplate {
                usuario: Some(user),
                cuenta: None,
                cliente: None,
                error: Some("Hubo un error al cargar tu información.".to_string()),
            };
            Ok((StatusCode::INTERNAL_SERVER_ERROR, page).into_response())
        }
    }
}

/// Buy a product, then show the profile.
///
/// The form carries the client details a first purchase needs. When the
/// backend reports missing or invalid details, the checkout form is shown
/// with its message and the values already typed.
///
/// # Errors
///
/// Returns an error page for unknown products and failed purchases.
pub async fn buy(
    State(state): State<AppState>,
    RequireSession(user, session): RequireSession,
    Path(reference): Path<String>,
    Form(form): Form<PurchaseForm>,
) -> Result<Response> {
    match state.backend().purchase(&user.token, &reference, &form).await {
        Ok(()) => {
            tracing::info!(user_id = %user.id, reference = %reference, "Purchase completed");
            Ok(Redirect::to("/perfil").into_response())
        }
        Err(BackendError::Unauthorized) => {
            clear_current_user(&session).await?;
            Ok(Redirect::to("/login").into_response())
        }
        Err(e) if e.status() == Some(400) => {
            let page = CheckoutTemplate {
                usuario: Some(user),
                referencia: reference,
                form,
                error: e.backend_message().map(str::to_string),
            };
            Ok((StatusCode::BAD_REQUEST, page).into_response())
        }
        Err(e) if e.status() == Some(404) => {
            let page = ErrorTemplate {
                titulo: "Producto no encontrado".to_string(),
                mensaje: e
                    .backend_message()
                    .unwrap_or("El producto que intentas comprar no existe.")
                    .to_string(),
                usuario: Some(user),
            };
            Ok((StatusCode::NOT_FOUND, page).into_response())
        }
        Err(e) => {
            tracing::error!(error = %e, reference = %reference, "Purchase failed");
            Err(AppError::Internal(
                "Hubo un error al procesar tu compra.".to_string(),
            ))
        }
    }
}
