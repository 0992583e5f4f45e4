//! Route protection.
//!
//! The identity token is read from the `jwt` cookie and from an
//! `Authorization: Bearer` header (the web frontend forwards tokens that
//! way). The cookie is tried first; a cookie that fails to verify falls
//! back to the header.
//!
//! - [`RequireUser`] rejects with 401 when the token is missing, invalid,
//!   expired, or names a deleted user. A bad cookie is cleared.
//! - [`OptionalUser`] never rejects.

use axum::{
    Json,
    extract::FromRequestParts,
    http::{
        StatusCode,
        header::{AUTHORIZATION, COOKIE, SET_COOKIE},
        request::Parts,
    },
    response::{AppendHeaders, IntoResponse, Response},
};
use serde_json::json;
use tower_sessions::cookie::{Cookie, SameSite, time::Duration};

use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::services::auth::{AuthError, AuthService, TOKEN_TTL_SECONDS};
use crate::state::AppState;

/// Name of the cookie carrying the identity token.
pub const TOKEN_COOKIE: &str = "jwt";

/// The `Set-Cookie` value issued at login. Lives as long as the token.
#[must_use]
pub fn token_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(Duration::seconds(TOKEN_TTL_SECONDS))
        .build()
}

/// An empty, immediately expiring `jwt` cookie.
#[must_use]
pub fn expired_token_cookie() -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, ""))
        .http_only(true)
        .path("/")
        .max_age(Duration::ZERO)
        .build()
}

/// Tokens carried by the request: the `jwt` cookie first, then a bearer header.
fn token_candidates(parts: &Parts) -> Vec<String> {
    let from_cookie = parts
        .headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == TOKEN_COOKIE && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_owned());

    let from_header = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from);

    from_cookie.into_iter().chain(from_header).collect()
}

/// Extractor that requires a valid identity token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireUser(user): RequireUser) -> impl IntoResponse {
///     format!("Hola, {}!", user.full_name)
/// }
/// ```
pub struct RequireUser(pub User);

/// Error returned when a request lacks a usable identity.
pub enum AuthRejection {
    /// No token in the request.
    MissingToken,
    /// Token present but unusable; the cookie is cleared.
    InvalidToken,
    /// The lookup itself failed.
    Failed(AppError),
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let body = Json(json!({ "mensaje": "No autenticado." }));
        match self {
            Self::MissingToken => (StatusCode::UNAUTHORIZED, body).into_response(),
            Self::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                AppendHeaders([(SET_COOKIE, expired_token_cookie().to_string())]),
                body,
            )
                .into_response(),
            Self::Failed(err) => err.into_response(),
        }
    }
}

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let candidates = token_candidates(parts);
        if candidates.is_empty() {
            return Err(AuthRejection::MissingToken);
        }

        match AuthService::new(state.store(), state.tokens())
            .resolve_any(&candidates)
            .await
        {
            Ok(user) => {
                set_sentry_user(&user.id, Some(user.email.as_str()));
                Ok(Self(user))
            }
            Err(AuthError::Token(e)) => {
                tracing::debug!(error = %e, "Rejected identity token");
                Err(AuthRejection::InvalidToken)
            }
            Err(AuthError::UnknownUser) => Err(AuthRejection::InvalidToken),
            Err(e) => Err(AuthRejection::Failed(e.into())),
        }
    }
}

/// Extractor that optionally resolves the current user.
///
/// Unlike `RequireUser`, this never rejects: any problem yields `None`.
pub struct OptionalUser(pub Option<User>);

impl FromRequestParts<AppState> for OptionalUser {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let candidates = token_candidates(parts);
        if candidates.is_empty() {
            return Ok(Self(None));
        }

        let user = AuthService::new(state.store(), state.tokens())
            .resolve_any(&candidates)
            .await
            .inspect_err(|e| tracing::debug!(error = %e, "Ignoring unusable identity token"))
            .ok();

        Ok(Self(user))
    }
}
