//! Catalog management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;

use super::ApiJson;
use crate::db::ProductStore;
use crate::error::{AppError, Result};
use crate::models::{Product, ProductInput, ProductQuery};
use crate::state::AppState;

fn not_found(reference: &str) -> AppError {
    AppError::NotFound(format!(
        "No se encontró ningún producto con la referencia '{reference}'"
    ))
}

/// List products, optionally filtered by `?publicado=`.
///
/// # Errors
///
/// Returns 500 if the store fails.
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> Result<Json<Vec<Product>>> {
    let products = state.store().list_products(query.filter()).await?;
    Ok(Json(products))
}

/// A single product by reference.
///
/// # Errors
///
/// Returns 404 for an unknown reference.
pub async fn show(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<Json<Product>> {
    state
        .store()
        .find_product(&reference)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(&reference))
}

/// Create a product. Answers with the bare record.
///
/// # Errors
///
/// Returns 400 for invalid fields or a reused reference.
pub async fn create(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<impl IntoResponse> {
    let product = state
        .store()
        .create_product(input.into_new_product()?)
        .await?;

    tracing::info!(reference = %product.reference, "Product created");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update the product with `reference`.
///
/// # Errors
///
/// Returns 404 for an unknown reference and 400 for invalid fields.
pub async fn update(
    State(state): State<AppState>,
    Path(reference): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<impl IntoResponse> {
    let changes = input.into_changes()?;

    let product = state
        .store()
        .update_product(&reference, changes)
        .await?
        .ok_or_else(|| not_found(&reference))?;

    Ok(Json(json!({ "mensaje": "Actualización exitosa", "producto": product })))
}

/// Delete the product with `reference`. Purchase history keeps its
/// frozen reference and price.
///
/// # Errors
///
/// Returns 404 for an unknown reference.
pub async fn destroy(
    State(state): State<AppState>,
    Path(reference): Path<String>,
) -> Result<impl IntoResponse> {
    if !state.store().delete_product(&reference).await? {
        return Err(not_found(&reference));
    }

    tracing::info!(reference = %reference, "Product deleted");
    Ok(Json(json!({ "mensaje": "Producto eliminado exitosamente." })))
}
