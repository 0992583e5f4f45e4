//! External service clients.

pub mod backend;

pub use backend::{BackendClient, BackendError};
