//! HTTP middleware stack for the frontend.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. Request ID (accept or generate `x-request-id`)
//! 3. `TraceLayer` (one span per request, tagged with the request ID)
//! 4. Session (in-memory, `tienda_session` cookie)

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{
    OptionalSession, RequireSession, SessionRejection, clear_current_user, set_current_user,
};
pub use request_id::{make_request_span, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
