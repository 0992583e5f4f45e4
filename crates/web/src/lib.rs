//! Tienda frontend library.
//!
//! Server-rendered pages over the REST backend. The binary in `main.rs`
//! wires configuration, logging and Sentry around [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod filters;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, http::StatusCode, middleware::from_fn, response::IntoResponse, routing::get};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::error::ErrorTemplate;
use crate::middleware::{
    OptionalSession, create_session_layer, make_request_span, request_id_middleware,
};
use crate::state::AppState;

/// Build the complete application router.
///
/// Sentry layers are added by the binary, outside this router.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(state.config());
    let static_files = ServeDir::new(&state.config().static_dir);

    Router::new()
        .route("/health", get(health))
        .merge(routes::routes())
        .nest_service("/static", static_files)
        .fallback(not_found)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

async fn not_found(OptionalSession(usuario): OptionalSession) -> impl IntoResponse {
    (StatusCode::NOT_FOUND, ErrorTemplate::not_found(usuario))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        Json,
        body::{Body, to_bytes},
        extract::{Path, Query},
        http::{
            HeaderMap, Request,
            header::{AUTHORIZATION, CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        },
        response::Response,
        routing::post,
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use url::Url;

    use super::*;
    use crate::config::{DEFAULT_STATIC_DIR, WebConfig};
    use crate::middleware::SESSION_COOKIE_NAME;

    const TOKEN: &str = "tok-ana";

    fn usuario() -> Value {
        json!({
            "id": 1,
            "nombreCompleto": "Ana Gómez",
            "correo": "ana@x.com",
            "rol": "usuario_basico",
            "fechaNacimiento": null
        })
    }

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) == Some("Bearer tok-ana")
    }

    fn unauthorized() -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "mensaje": "No autenticado." })),
        )
            .into_response()
    }

    /// A backend that knows one user and one product, listening on a
    /// random local port.
    async fn fake_backend() -> Url {
        let api = Router::new()
            .route(
                "/v2/api/auth/login",
                post(|Json(body): Json<Value>| async move {
                    if body["correo"] == "ana@x.com" && body["password"] == "password123" {
                        Json(json!({
                            "mensaje": "Login exitoso",
                            "token": TOKEN,
                            "usuario": usuario()
                        }))
                        .into_response()
                    } else {
                        (
                            StatusCode::BAD_REQUEST,
                            Json(json!({ "mensaje": "Contraseña incorrecta." })),
                        )
                            .into_response()
                    }
                }),
            )
            .route(
                "/v2/api/auth/logout",
                get(|| async { Json(json!({ "mensaje": "Sesión cerrada correctamente." })) }),
            )
            .route(
                "/v2/api/productos",
                get(|Query(query): Query<HashMap<String, String>>| async move {
                    assert_eq!(query.get("publicado").map(String::as_str), Some("true"));
                    Json(json!([{
                        "referencia": "TAZA-01",
                        "nombre": "Taza",
                        "descripcion": "Cerámica blanca",
                        "precio": "19.99",
                        "imagen": null
                    }]))
                }),
            )
            .route(
                "/v2/api/usuarios/perfil",
                get(|headers: HeaderMap| async move {
                    if !authorized(&headers) {
                        return unauthorized();
                    }
                    Json(json!({ "usuario": usuario(), "cliente": null })).into_response()
                }),
            )
            .route(
                "/v2/api/compras/comprar/{reference}",
                post(
                    |headers: HeaderMap, Path(reference): Path<String>, Json(body): Json<Value>| async move {
                        if !authorized(&headers) {
                            return unauthorized();
                        }
                        if reference != "TAZA-01" {
                            return (
                                StatusCode::NOT_FOUND,
                                Json(json!({ "mensaje": "Producto no encontrado." })),
                            )
                                .into_response();
                        }
                        if body.get("telefono").is_none() {
                            return (
                                StatusCode::BAD_REQUEST,
                                Json(json!({ "mensaje": "El teléfono es obligatorio." })),
                            )
                                .into_response();
                        }
                        Json(json!({ "mensaje": "Compra realizada exitosamente." })).into_response()
                    },
                ),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, api).await.unwrap() });
        Url::parse(&format!("http://{addr}")).unwrap()
    }

    fn test_app(backend_url: Url) -> Router {
        let config = WebConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            backend_url,
            cookie_secure: false,
            static_dir: DEFAULT_STATIC_DIR.into(),
            sentry_dsn: None,
            sentry_environment: None,
        };
        app(AppState::new(config).unwrap())
    }

    /// Nothing listens on port 1.
    fn offline_app() -> Router {
        test_app(Url::parse("http://127.0.0.1:1").unwrap())
    }

    async fn body_text(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    fn get_page(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut request = Request::get(uri);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        request.body(Body::empty()).unwrap()
    }

    fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
        let mut request = Request::post(uri).header(CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }
        request.body(Body::from(body.to_owned())).unwrap()
    }

    fn location(response: &Response) -> &str {
        response.headers().get(LOCATION).unwrap().to_str().unwrap()
    }

    /// `name=value` part of the session cookie.
    fn session_cookie(response: &Response) -> String {
        let header = response.headers().get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(header.starts_with(SESSION_COOKIE_NAME));
        header.split(';').next().unwrap().to_owned()
    }

    async fn logged_in(app: &Router) -> String {
        let response = app
            .clone()
            .oneshot(post_form(
                "/login",
                "correo=ana%40x.com&password=password123",
                None,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/catalogo");
        session_cookie(&response)
    }

    #[tokio::test]
    async fn test_root_redirects_to_login() {
        let response = offline_app().oneshot(get_page("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_profile_without_session_redirects() {
        let response = offline_app().oneshot(get_page("/perfil", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }

    #[tokio::test]
    async fn test_unknown_page_is_html_404() {
        let response = offline_app().oneshot(get_page("/nada", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let html = body_text(response).await;
        assert!(html.contains("La página que buscas no existe."));
    }

    #[tokio::test]
    async fn test_login_page_shows_registered_banner() {
        let response = offline_app()
            .oneshot(get_page("/login?registered=true", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Registro exitoso"));

        let response = offline_app().oneshot(get_page("/login", None)).await.unwrap();
        assert!(!body_text(response).await.contains("Registro exitoso"));
    }

    #[tokio::test]
    async fn test_catalog_without_backend_is_500() {
        let response = offline_app().oneshot(get_page("/catalogo", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let html = body_text(response).await;
        assert!(html.contains("No se pudo cargar el catálogo. Revise el backend."));
    }

    #[tokio::test]
    async fn test_static_assets_are_served() {
        let response = offline_app()
            .oneshot(get_page("/static/js/header_menu.js", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_catalog_for_visitors() {
        let app = test_app(fake_backend().await);
        let response = app.oneshot(get_page("/catalogo", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let html = body_text(response).await;
        assert!(html.contains("Taza"));
        assert!(html.contains("$19.99"));
        assert!(html.contains("Inicia sesión para comprar"));
        assert!(!html.contains("action=\"/comprar/TAZA-01\""));
    }

    #[tokio::test]
    async fn test_wrong_password_shows_backend_message() {
        let app = test_app(fake_backend().await);
        let response = app
            .oneshot(post_form("/login", "correo=ana%40x.com&password=nope", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(response.headers().get(SET_COOKIE).is_none());
        let html = body_text(response).await;
        assert!(html.contains("Contraseña incorrecta."));
        assert!(html.contains("value=\"ana@x.com\""));
    }

    #[tokio::test]
    async fn test_login_then_profile() {
        let app = test_app(fake_backend().await);
        let cookie = logged_in(&app).await;

        let response = app
            .clone()
            .oneshot(get_page("/perfil", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Ana Gómez"));
        assert!(html.contains("Todavía no eres cliente"));

        let response = app.oneshot(get_page("/catalogo", Some(&cookie))).await.unwrap();
        let html = body_text(response).await;
        assert!(html.contains("action=\"/comprar/TAZA-01\""));
    }

    #[tokio::test]
    async fn test_purchase_without_details_shows_checkout() {
        let app = test_app(fake_backend().await);
        let cookie = logged_in(&app).await;

        let response = app
            .clone()
            .oneshot(post_form("/comprar/TAZA-01", "", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = body_text(response).await;
        assert!(html.contains("El teléfono es obligatorio."));

        let response = app
            .oneshot(post_form(
                "/comprar/TAZA-01",
                "telefono=3001234567&direccion=Calle+1&fechaNacimiento=1990-05-17&ciudad=Cali&codigoPostal=760001",
                Some(&cookie),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/perfil");
    }

    #[tokio::test]
    async fn test_purchase_of_unknown_product_is_404() {
        let app = test_app(fake_backend().await);
        let cookie = logged_in(&app).await;

        let response = app
            .oneshot(post_form("/comprar/NOPE", "telefono=3001234567", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("Producto no encontrado."));
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let app = test_app(fake_backend().await);
        let cookie = logged_in(&app).await;

        let response = app
            .clone()
            .oneshot(get_page("/auth/logout", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");

        let response = app.oneshot(get_page("/perfil", Some(&cookie))).await.unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/login");
    }
}
