//! Purchases.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireUser;
use crate::models::ClientInput;
use crate::services::PurchaseService;
use crate::state::AppState;

/// Read the optional client details. An empty body means none were sent.
fn client_details(body: &Bytes) -> Result<ClientInput> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(ClientInput::default());
    }
    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(format!("Cuerpo JSON inválido: {e}")))
}

/// Buy the product with reference `product_ref` for the current user.
///
/// The first purchase must carry the client details (phone, address, birth
/// date, city, postal code) used to create the profile.
///
/// # Errors
///
/// Returns 401 without a valid token, 404 for an unknown product, 400 for
/// missing client details and 500 if the store fails.
pub async fn buy(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(product_ref): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse> {
    let details = client_details(&body)?;

    add_breadcrumb(
        "purchase",
        "Purchase requested",
        &[("user_id", &user.id.to_string()), ("product", &product_ref)],
    );

    let client = PurchaseService::new(state.store())
        .execute(user.id, &product_ref, details)
        .await?;

    Ok(Json(json!({
        "mensaje": "Compra realizada exitosamente.",
        "cliente": client,
    })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_body_means_no_details() {
        let details = client_details(&Bytes::new()).unwrap();
        assert!(details.telefono.is_none());

        let details = client_details(&Bytes::from_static(b" \n")).unwrap();
        assert!(details.ciudad.is_none());
    }

    #[test]
    fn test_details_are_read_from_json() {
        let body = Bytes::from_static(br#"{"telefono":"3001234567","ciudad":"Cali"}"#);
        let details = client_details(&body).unwrap();
        assert_eq!(details.telefono.as_deref(), Some("3001234567"));
        assert_eq!(details.ciudad.as_deref(), Some("Cali"));
    }

    #[test]
    fn test_malformed_body_is_rejected() {
        let err = client_details(&Bytes::from_static(b"{telefono")).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
