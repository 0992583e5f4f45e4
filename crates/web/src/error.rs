//! Unified error handling with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Errors render the HTML error page;
//! server errors are captured to Sentry first.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::filters;
use crate::models::CurrentUser;
use crate::services::BackendError;

/// Error page template.
#[derive(Template, WebTemplate)]
#[template(path = "pages/error.html")]
pub struct ErrorTemplate {
    pub titulo: String,
    pub mensaje: String,
    pub usuario: Option<CurrentUser>,
}

impl ErrorTemplate {
    /// The 404 page.
    #[must_use]
    pub fn not_found(usuario: Option<CurrentUser>) -> Self {
        Self {
            titulo: "404 - Página no encontrada".to_string(),
            mensaje: "La página que buscas no existe.".to_string(),
            usuario,
        }
    }
}

/// Application-level error type for the frontend.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Session store failed.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Resource not found. Holds the message shown to the user.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error. Holds the message shown to the user.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, mensaje) = match &self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::Backend(_) | Self::Session(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Ocurrió un error inesperado. Intenta de nuevo más tarde.".to_string(),
            ),
        };

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let titulo = if status == StatusCode::NOT_FOUND {
            "404 - Página no encontrada"
        } else {
            "Error del servidor"
        };

        let page = ErrorTemplate {
            titulo: titulo.to_string(),
            mensaje,
            usuario: None,
        };
        (status, page).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, String) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_not_found_page() {
        let (status, html) = render(AppError::NotFound("No existe.".into())).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(html.contains("404 - Página no encontrada"));
        assert!(html.contains("No existe."));
    }

    #[tokio::test]
    async fn test_backend_details_are_hidden() {
        let (status, html) = render(AppError::Backend(BackendError::Api {
            status: 500,
            message: "connection pool exhausted".into(),
        }))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(html.contains("Error del servidor"));
        assert!(!html.contains("pool exhausted"));
    }
}
