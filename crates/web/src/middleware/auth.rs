//! Authentication extractors.
//!
//! The session holds a [`CurrentUser`] after a successful login. Pages that
//! need one redirect to `/login` when it is missing.

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;

use crate::error::set_sentry_user;
use crate::models::{CurrentUser, session_keys};

/// Extractor that requires a logged-in user.
///
/// Also hands out the session so handlers can clear it when the backend
/// rejects the stored token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireSession(user, _): RequireSession) -> impl IntoResponse {
///     format!("Hola, {}!", user.nombre_completo)
/// }
/// ```
pub struct RequireSession(pub CurrentUser, pub Session);

/// Error returned when a page needs a logged-in user.
pub enum SessionRejection {
    /// Redirect to login page.
    RedirectToLogin,
}

impl IntoResponse for SessionRejection {
    fn into_response(self) -> Response {
        match self {
            Self::RedirectToLogin => Redirect::to("/login").into_response(),
        }
    }
}

impl<S> FromRequestParts<S> for RequireSession
where
    S: Send + Sync,
{
    type Rejection = SessionRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Set by SessionManagerLayer
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(SessionRejection::RedirectToLogin)?;

        let user: CurrentUser = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten()
            .ok_or(SessionRejection::RedirectToLogin)?;

        set_sentry_user(&user.id, Some(&user.correo));
        Ok(Self(user, session))
    }
}

/// Extractor that optionally gets the current user.
///
/// Unlike `RequireSession`, this does not reject the request if nobody is
/// logged in.
pub struct OptionalSession(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = match parts.extensions.get::<Session>() {
            Some(session) => session
                .get::<CurrentUser>(session_keys::CURRENT_USER)
                .await
                .ok()
                .flatten(),
            None => None,
        };

        Ok(Self(user))
    }
}

/// Store the logged-in user, under a fresh session id.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(session_keys::CURRENT_USER, user).await
}

/// Drop the whole session (logout, or a token the backend no longer accepts).
///
/// # Errors
///
/// Returns an error if the session store fails.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
