//! HTTP route handlers for the frontend.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                    - Redirect to /login
//! GET  /catalogo            - Published products
//!
//! # Auth
//! GET  /login               - Login page (?registered=true shows a banner)
//! POST /login               - Login action
//! GET  /register            - Register page
//! POST /register            - Register action
//! GET  /auth/logout         - Logout
//!
//! # Account (requires session)
//! GET  /perfil              - Profile and purchase history
//! POST /comprar/{ref}       - Buy a product
//! ```

pub mod auth;
pub mod catalog;
pub mod profile;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};

use crate::state::AppState;

/// Build the page router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(|| async { Redirect::to("/login") }))
        .route("/catalogo", get(catalog::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/auth/logout", get(auth::logout))
        .route("/perfil", get(profile::show))
        .route("/comprar/{reference}", post(profile::buy))
}
