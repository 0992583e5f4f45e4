//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors become a JSON body
//! `{"mensaje": "..."}` (plus `errores` for field-level problems). Server
//! errors are captured to Sentry and answered with a generic message.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use tienda_core::ValidationErrors;

use crate::db::RepositoryError;
use crate::services::{AuthError, PurchaseError};

/// Generic message for anything the client cannot fix.
const INTERNAL_MESSAGE: &str = "Error interno del servidor.";

/// Application-level error type for the backend.
#[derive(Debug, Error)]
pub enum AppError {
    /// Input failed validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Purchase flow failed.
    #[error("Purchase error: {0}")]
    Purchase(#[from] PurchaseError),

    /// Duplicate resource, answered with 409.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    mensaje: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errores: Option<&'a ValidationErrors>,
}

impl AppError {
    /// Status code and user-facing message.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Validation(errors) => (StatusCode::BAD_REQUEST, errors.message()),
            Self::Database(err) => repository_status(err),
            Self::Auth(err) => match err {
                AuthError::EmailTaken
                | AuthError::NotRegistered
                | AuthError::IncorrectPassword
                | AuthError::WeakPassword(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                AuthError::Token(_) | AuthError::UnknownUser => {
                    (StatusCode::UNAUTHORIZED, "No autenticado.".to_string())
                }
                AuthError::Repository(inner) => repository_status(inner),
                AuthError::PasswordHash | AuthError::TokenIssue(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
                }
            },
            Self::Purchase(err) => match err {
                PurchaseError::ProductNotFound(_) => {
                    (StatusCode::NOT_FOUND, "Producto no encontrado.".to_string())
                }
                PurchaseError::MissingClientDetails(errors) => (
                    StatusCode::BAD_REQUEST,
                    format!(
                        "Faltan datos para crear el perfil de cliente. {}",
                        errors.message()
                    ),
                ),
                PurchaseError::Repository(inner) => match repository_status(inner) {
                    (status, _) if status.is_server_error() => (
                        status,
                        "Hubo un error al procesar la compra.".to_string(),
                    ),
                    other => other,
                },
            },
            Self::Conflict(msg)
            | Self::NotFound(msg)
            | Self::Unauthorized(msg)
            | Self::BadRequest(msg) => (self.plain_status(), msg.clone()),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string()),
        }
    }

    const fn plain_status(&self) -> StatusCode {
        match self {
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn field_errors(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) | Self::Purchase(PurchaseError::MissingClientDetails(errors)) => {
                Some(errors)
            }
            _ => None,
        }
    }
}

/// Map a repository failure to a status and message.
fn repository_status(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound => (
            StatusCode::NOT_FOUND,
            "No se encontró el registro solicitado.".to_string(),
        ),
        RepositoryError::Conflict(field) => (StatusCode::BAD_REQUEST, conflict_message(field)),
        RepositoryError::MissingReference(field) => (
            StatusCode::BAD_REQUEST,
            format!("El {field} referenciado no existe."),
        ),
        RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
        }
    }
}

/// User-facing message for a unique-constraint violation on `field`.
#[must_use]
pub fn conflict_message(field: &str) -> String {
    match field {
        "correo" => "El correo ya está registrado. Usa otro correo.".to_string(),
        "referencia" => "Ya existe un producto con esa referencia.".to_string(),
        "usuario" => "El usuario ya tiene un perfil de cliente.".to_string(),
        "documento" => "Ya existe un cliente con ese documento.".to_string(),
        other => format!("Ya existe un registro con ese valor de '{other}'."),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, mensaje) = self.status_and_message();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let body = ErrorBody {
            mensaje,
            errores: self.field_errors(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Cuerpo JSON inválido: {}", rejection.body_text()))
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
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user
/// actions leading up to an error.
pub fn add_breadcrumb(category: &str, message: &str, data: &[(&str, &str)]) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
