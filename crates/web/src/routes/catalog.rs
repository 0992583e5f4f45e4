//! Product catalog page.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ErrorTemplate;
use crate::filters;
use crate::middleware::OptionalSession;
use crate::models::{CurrentUser, ProductView};
use crate::state::AppState;

/// Catalog page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/catalogo.html")]
pub struct CatalogTemplate {
    pub productos: Vec<ProductView>,
    pub usuario: Option<CurrentUser>,
}

/// Display the published products.
pub async fn index(
    State(state): State<AppState>,
    OptionalSession(usuario): OptionalSession,
) -> Response {
    match state.backend().published_products().await {
        Ok(productos) => CatalogTemplate { productos, usuario }.into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to load the catalog");
            let page = ErrorTemplate {
                titulo: "Error del servidor".to_string(),
                mensaje: "No se pudo cargar el catálogo. Revise el backend.".to_string(),
                usuario,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, page).into_response()
        }
    }
}
