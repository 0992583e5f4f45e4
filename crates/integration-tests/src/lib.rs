//! Integration tests for the Tienda shop.
//!
//! # Running Tests
//!
//! ```bash
//! # Database, schema and both servers
//! cargo run -p tienda-cli -- migrate
//! cargo run -p tienda-api &
//! cargo run -p tienda-web &
//!
//! # The tests are ignored by default
//! cargo test -p tienda-integration-tests -- --ignored
//! ```
//!
//! # Environment Variables
//!
//! - `TIENDA_API_URL` - backend base URL (default: `http://localhost:9090`)
//! - `TIENDA_WEB_URL` - frontend base URL (default: `http://localhost:3000`)

#![cfg_attr(not(test), forbid(unsafe_code))]
#![allow(clippy::missing_panics_doc, clippy::expect_used)]

use reqwest::{Client, Response, StatusCode, redirect};
use serde_json::{Value, json};
use uuid::Uuid;

/// Password used for every account these tests create.
pub const PASSWORD: &str = "password123";

/// Backend base URL including the `/v2/api` prefix.
#[must_use]
pub fn api_url(path: &str) -> String {
    let base = std::env::var("TIENDA_API_URL").unwrap_or_else(|_| "http://localhost:9090".into());
    format!("{}/v2/api{path}", base.trim_end_matches('/'))
}

/// Frontend URL for `path`.
#[must_use]
pub fn web_url(path: &str) -> String {
    let base = std::env::var("TIENDA_WEB_URL").unwrap_or_else(|_| "http://localhost:3000".into());
    format!("{}{path}", base.trim_end_matches('/'))
}

/// A client with a cookie jar that does not follow redirects.
#[must_use]
pub fn client() -> Client {
    Client::builder()
        .cookie_store(true)
        .redirect(redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
}

/// An email no earlier run has used.
#[must_use]
pub fn unique_email() -> String {
    format!("it-{}@tienda.test", Uuid::new_v4().simple())
}

/// A product reference no earlier run has used.
#[must_use]
pub fn unique_reference() -> String {
    format!("IT-{}", Uuid::new_v4().simple()).to_uppercase()
}

/// Client details accepted for a first purchase.
#[must_use]
pub fn client_details() -> Value {
    json!({
        "telefono": "3001234567",
        "direccion": "Calle 10 # 5-20",
        "fechaNacimiento": "1990-05-17",
        "ciudad": "Bogotá",
        "codigoPostal": "110111"
    })
}

/// Register through the backend and assert it worked.
pub async fn register(client: &Client, email: &str) -> Value {
    let response = client
        .post(api_url("/auth/register"))
        .json(&json!({ "nombreCompleto": "Ana Prueba", "correo": email, "password": PASSWORD }))
        .send()
        .await
        .expect("register request failed");
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

/// Log in through the backend and return the token.
pub async fn login(client: &Client, email: &str) -> String {
    let response = client
        .post(api_url("/auth/login"))
        .json(&json!({ "correo": email, "password": PASSWORD }))
        .send()
        .await
        .expect("login request failed");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    body["token"].as_str().expect("token missing").to_owned()
}

/// Create a published product costing `price`.
pub async fn create_product(client: &Client, reference: &str, price: &str) -> Value {
    let response = client
        .post(api_url("/productos"))
        .json(&json!({
            "referencia": reference,
            "nombre": format!("Producto {reference}"),
            "precio": price,
            "publicado": true
        }))
        .send()
        .await
        .expect("product request failed");
    assert_eq!(response.status(), StatusCode::CREATED);
    json_body(response).await
}

/// Body of a JSON response.
pub async fn json_body(response: Response) -> Value {
    response.json().await.expect("response was not JSON")
}
