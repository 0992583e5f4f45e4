//! Data models for the frontend.
//!
//! - [`api`] - shapes returned by the REST backend
//! - [`session`] - what is kept in the browser session

pub mod api;
pub mod session;

pub use api::{
    ClientView, LoginResponse, ProductView, ProfileResponse, PurchaseForm, PurchaseView, UserView,
};
pub use session::{CurrentUser, keys as session_keys};
