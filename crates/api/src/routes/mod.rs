//! HTTP route handlers for the backend.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Database round-trip
//!
//! # Auth (/v2/api/auth)
//! POST   /register                          - Create an account
//! POST   /login                             - Issue a token, set the `jwt` cookie
//! GET    /logout                            - Expire the `jwt` cookie
//!
//! # Users (/v2/api/usuarios)
//! GET    /                                  - List users
//! POST   /                                  - Create a user (role allowed)
//! GET    /perfil                            - Current user + client profile (token)
//! PUT    /{email}                           - Update a user
//! DELETE /{email}                           - Delete a user
//!
//! # Products (/v2/api/productos)
//! GET    /?publicado=...                    - List products
//! POST   /                                  - Create a product
//! GET    /{ref}                             - Product by reference
//! PUT    /{ref}                             - Update a product
//! DELETE /{ref}                             - Delete a product
//!
//! # Clients (/v2/api/clientes)
//! GET    /                                  - List client profiles
//! POST   /                                  - Create a client profile
//! GET    /usuario/{user_id}                 - Profile of a user
//! PUT    /usuario/{user_id}                 - Update the profile of a user
//! DELETE /usuario/{user_id}                 - Delete the profile of a user
//!
//! # Purchases (/v2/api/compras)
//! POST   /comprar/{product_ref}             - Buy a product (token)
//! ```

pub mod auth;
pub mod clients;
pub mod products;
pub mod purchases;
pub mod users;

use axum::{
    Router,
    extract::FromRequest,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;

use crate::error::AppError;
use crate::state::AppState;

/// Prefix shared by every REST route.
pub const API_PREFIX: &str = "/v2/api";

/// `axum::Json` whose rejection is an [`AppError`], so malformed bodies get
/// the same `{"mensaje": ...}` shape as every other error.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Build the router mounted under [`API_PREFIX`].
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/usuarios", user_routes())
        .nest("/productos", product_routes())
        .nest("/clientes", client_routes())
        .nest("/compras", purchase_routes())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", get(auth::logout))
}

/// Create the user routes router.
///
/// `/perfil` is registered before `/{email}`; axum prefers the static
/// segment either way.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(users::index).post(users::create))
        .route("/perfil", get(users::profile))
        .route("/{email}", axum::routing::put(users::update).delete(users::destroy))
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index).post(products::create))
        .route(
            "/{reference}",
            get(products::show)
                .put(products::update)
                .delete(products::destroy),
        )
}

/// Create the client routes router.
pub fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(clients::index).post(clients::create))
        .route(
            "/usuario/{user_id}",
            get(clients::show)
                .put(clients::update)
                .delete(clients::destroy),
        )
}

/// Create the purchase routes router.
pub fn purchase_routes() -> Router<AppState> {
    Router::new().route("/comprar/{product_ref}", post(purchases::buy))
}
