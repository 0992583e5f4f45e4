//! End-to-end tests for the REST backend.
//!
//! These tests require:
//! - A migrated `PostgreSQL` database (`tienda-cli migrate`)
//! - The backend running (`cargo run -p tienda-api`)

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::json;

use tienda_integration_tests::{
    PASSWORD, api_url, client, client_details, create_product, json_body, login, register,
    unique_email, unique_reference,
};

// ============================================================================
// Authentication
// ============================================================================

#[tokio::test]
#[ignore = "Requires running tienda-api and PostgreSQL"]
async fn test_register_login_profile() {
    let client = client();
    let email = unique_email();

    let body = register(&client, &email).await;
    assert_eq!(body["usuario"]["correo"], email.as_str());
    assert_eq!(body["usuario"]["rol"], "usuario_basico");
    assert!(body["usuario"].get("password").is_none());

    let response = client
        .post(api_url("/auth/login"))
        .json(&json!({ "correo": email, "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(reqwest::header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(cookie.starts_with("jwt="));
    assert!(cookie.contains("HttpOnly"));
    let body = json_body(response).await;
    assert_eq!(body["mensaje"], "Login exitoso");
    let token = body["token"].as_str().unwrap().to_owned();

    // Bearer token
    let response = reqwest::Client::new()
        .get(api_url("/usuarios/perfil"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = json_body(response).await;
    assert_eq!(profile["usuario"]["correo"], email.as_str());
    assert!(profile["cliente"].is_null());

    // Cookie jar
    let response = client.get(api_url("/usuarios/perfil")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running tienda-api and PostgreSQL"]
async fn test_register_twice_is_rejected() {
    let client = client();
    let email = unique_email();
    register(&client, &email).await;

    let response = client
        .post(api_url("/auth/register"))
        .json(&json!({ "nombreCompleto": "Otra", "correo": email.to_uppercase(), "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["mensaje"], "El correo ya está registrado. Usa otro correo.");
}

#[tokio::test]
#[ignore = "Requires running tienda-api and PostgreSQL"]
async fn test_login_failures() {
    let client = client();
    let email = unique_email();
    register(&client, &email).await;

    let response = client
        .post(api_url("/auth/login"))
        .json(&json!({ "correo": unique_email(), "password": PASSWORD }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["mensaje"], "Este correo no está registrado.");

    let response = client
        .post(api_url("/auth/login"))
        .json(&json!({ "correo": email, "password": "otra-clave" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["mensaje"], "Contraseña incorrecta.");
}

#[tokio::test]
#[ignore = "Requires running tienda-api and PostgreSQL"]
async fn test_logout_clears_cookie() {
    let client = client();
    let email = unique_email();
    register(&client, &email).await;
    login(&client, &email).await;

    let response = client.get(api_url("/auth/logout")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.get(api_url("/usuarios/perfil")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// Purchases
// ============================================================================

#[tokio::test]
#[ignore = "Requires running tienda-api and PostgreSQL"]
async fn test_purchase_flow() {
    let client = client();
    let email = unique_email();
    register(&client, &email).await;
    let token = login(&client, &email).await;
    let reference = unique_reference();
    create_product(&client, &reference, "19.99").await;

    // Unknown product
    let response = client
        .post(api_url("/compras/comprar/NO-EXISTE-123"))
        .bearer_auth(&token)
        .json(&client_details())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // First purchase without details
    let response = client
        .post(api_url(&format!("/compras/comprar/{reference}")))
        .bearer_auth(&token)
        .json(&json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // First purchase with details
    let response = client
        .post(api_url(&format!("/compras/comprar/{reference}")))
        .bearer_auth(&token)
        .json(&client_details())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["mensaje"], "Compra realizada exitosamente.");
    let history = body["cliente"]["historialCompras"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["precioCompra"], "19.99");

    // Price change does not touch the history
    let response = client
        .put(api_url(&format!("/productos/{reference}")))
        .json(&json!({ "precio": "25.00" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Returning client, no details needed
    let response = client
        .post(api_url(&format!("/compras/comprar/{reference}")))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get(api_url("/usuarios/perfil"))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    let profile = json_body(response).await;
    let history = profile["cliente"]["historialCompras"].as_array().unwrap();
    let prices: Vec<_> = history.iter().map(|e| e["precioCompra"].clone()).collect();
    assert_eq!(prices, vec![json!("19.99"), json!("25.00")]);
    assert_eq!(history[0]["producto"]["referencia"], reference.as_str());

    client
        .delete(api_url(&format!("/productos/{reference}")))
        .send()
        .await
        .unwrap();
}
