//! HTTP middleware stack for the backend.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. Request ID (accept or generate `x-request-id`)
//! 3. `TraceLayer` (one span per request, tagged with the request ID)
//!
//! Route protection is done with extractors rather than layers, see
//! [`auth`].

pub mod auth;
pub mod request_id;

pub use auth::{
    AuthRejection, OptionalUser, RequireUser, TOKEN_COOKIE, expired_token_cookie, token_cookie,
};
pub use request_id::{make_request_span, request_id_middleware};
