//! REST backend client.
//!
//! Every call that needs an identity forwards the session's token as
//! `Authorization: Bearer`. Error bodies carry the user-facing text in
//! `mensaje` (older backends used `error`).

use std::time::Duration;

use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use url::Url;

use crate::models::{LoginResponse, ProductView, ProfileResponse, PurchaseForm};

/// Path prefix of every backend route.
const API_SEGMENTS: [&str; 2] = ["v2", "api"];

/// Upper bound for a single backend call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur when calling the backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend could not be reached or the body could not be read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with an error status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The token was rejected.
    #[error("not authenticated")]
    Unauthorized,

    /// The configured base URL cannot carry a path.
    #[error("invalid backend base URL")]
    BaseUrl,
}

impl BackendError {
    /// HTTP status answered by the backend, if it answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            Self::Http(_) | Self::BaseUrl => None,
        }
    }

    /// Message from the backend when it explained itself.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Api { message, .. } if !message.is_empty() => Some(message),
            _ => None,
        }
    }
}

/// Error body sent by the backend.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    mensaje: Option<String>,
    error: Option<String>,
}

impl ErrorBody {
    fn into_message(self) -> String {
        self.mensaje.or(self.error).unwrap_or_default()
    }
}

/// REST backend client.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: Url,
}

impl BackendClient {
    /// Create a new backend client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the base URL
    /// cannot carry a path.
    pub fn new(base_url: Url) -> Result<Self, BackendError> {
        if base_url.cannot_be_a_base() {
            return Err(BackendError::BaseUrl);
        }

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { client, base_url })
    }

    /// URL of a backend route. Segments are percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| BackendError::BaseUrl)?
            .pop_if_empty()
            .extend(API_SEGMENTS)
            .extend(segments);
        Ok(url)
    }

    /// Products with the publication flag set.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable or answers with an error.
    pub async fn published_products(&self) -> Result<Vec<ProductView>, BackendError> {
        let mut url = self.endpoint(&["productos"])?;
        url.query_pairs_mut().append_pair("publicado", "true");
        let response = self.client.get(url).send().await?;

        Ok(check(response).await?.json().await?)
    }

    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with the backend's message for unknown
    /// emails and wrong passwords.
    pub async fn login(
        &self,
        correo: &str,
        password: &SecretString,
    ) -> Result<LoginResponse, BackendError> {
        let url = self.endpoint(&["auth", "login"])?;
        let body = json!({ "correo": correo, "password": password.expose_secret() });
        let response = self.client.post(url).json(&body).send().await?;

        Ok(check(response).await?.json().await?)
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with the backend's message for invalid
    /// fields or a taken email.
    pub async fn register(
        &self,
        nombre_completo: &str,
        correo: &str,
        password: &SecretString,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&["auth", "register"])?;
        let body = json!({
            "nombreCompleto": nombre_completo,
            "correo": correo,
            "password": password.expose_secret(),
        });
        let response = self.client.post(url).json(&body).send().await?;

        check(response).await?;
        Ok(())
    }

    /// The user owning `token` with their client profile.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Unauthorized` when the token is no longer valid.
    pub async fn profile(&self, token: &str) -> Result<ProfileResponse, BackendError> {
        let url = self.endpoint(&["usuarios", "perfil"])?;
        let response = self.client.get(url).bearer_auth(token).send().await?;

        Ok(check(response).await?.json().await?)
    }

    /// Buy the product with `reference`, sending the client details.
    ///
    /// # Errors
    ///
    /// Returns `BackendError::Api` with status 400 when a first purchase
    /// lacks client details and 404 for an unknown product.
    pub async fn purchase(
        &self,
        token: &str,
        reference: &str,
        details: &PurchaseForm,
    ) -> Result<(), BackendError> {
        let url = self.endpoint(&["compras", "comprar", reference])?;
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(details)
            .send()
            .await?;

        check(response).await?;
        Ok(())
    }

    /// Tell the backend the user logged out.
    ///
    /// # Errors
    ///
    /// Returns error if the backend is unreachable.
    pub async fn logout(&self, token: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&["auth", "logout"])?;
        let response = self.client.get(url).bearer_auth(token).send().await?;

        check(response).await?;
        Ok(())
    }
}

/// Turn an error status into a `BackendError`, keeping the backend's message.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::UNAUTHORIZED {
        return Err(BackendError::Unauthorized);
    }

    let text = response.text().await.unwrap_or_default();
    Err(BackendError::Api {
        status: status.as_u16(),
        message: error_message(&text),
    })
}

/// Message of an error body; the raw text when it is not JSON.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .map_or_else(|_| body.trim().to_owned(), ErrorBody::into_message)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> BackendClient {
        BackendClient::new(Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn test_endpoint_from_bare_host() {
        let url = client("http://localhost:9090").endpoint(&["productos"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9090/v2/api/productos");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let url = client("https://tienda.test/backend/")
            .endpoint(&["auth", "login"])
            .unwrap();
        assert_eq!(url.as_str(), "https://tienda.test/backend/v2/api/auth/login");
    }

    #[test]
    fn test_endpoint_encodes_reference() {
        let url = client("http://localhost:9090")
            .endpoint(&["compras", "comprar", "TAZA 01/B"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:9090/v2/api/compras/comprar/TAZA%2001%2FB"
        );
    }

    #[test]
    fn test_error_message_prefers_mensaje() {
        assert_eq!(
            error_message(r#"{"mensaje":"Contraseña incorrecta.","error":"x"}"#),
            "Contraseña incorrecta."
        );
        assert_eq!(
            error_message(r#"{"error":"Este correo no está registrado."}"#),
            "Este correo no está registrado."
        );
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }

    #[test]
    fn test_status_and_message() {
        let err = BackendError::Api {
            status: 400,
            message: "Faltan datos".to_owned(),
        };
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.backend_message(), Some("Faltan datos"));
        assert_eq!(BackendError::Unauthorized.status(), Some(401));
        assert!(BackendError::BaseUrl.backend_message().is_none());
    }
}
