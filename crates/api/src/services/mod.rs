//! Business flows: authentication, purchases and profiles.
//!
//! Services borrow a store implementing the store traits and never touch
//! HTTP types.

pub mod auth;
pub mod profile;
pub mod purchase;

pub use auth::{AuthError, AuthService, LoginOutcome, TokenService};
pub use profile::ProfileService;
pub use purchase::{PurchaseError, PurchaseService};
