//! Backend response shapes.
//!
//! Only the fields the views need are declared; anything else the backend
//! sends is ignored.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tienda_core::{Price, Role, UserId};

/// A user as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub nombre_completo: String,
    pub correo: String,
    pub rol: Role,
    pub fecha_nacimiento: Option<NaiveDate>,
}

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductView {
    pub referencia: String,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Price,
    pub imagen: Option<String>,
}

/// One entry of a purchase history, with its product when still listed.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseView {
    pub referencia: String,
    pub precio_compra: Price,
    pub fecha: DateTime<Utc>,
    pub producto: Option<ProductView>,
}

impl PurchaseView {
    /// Name of the product, or its reference once it left the catalog.
    #[must_use]
    pub fn nombre(&self) -> &str {
        self.producto
            .as_ref()
            .map_or(self.referencia.as_str(), |p| p.nombre.as_str())
    }

    /// Purchase date as shown in the history table.
    #[must_use]
    pub fn fecha_corta(&self) -> String {
        self.fecha.format("%d/%m/%Y %H:%M").to_string()
    }
}

/// A client profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    pub documento: Option<String>,
    pub telefono: String,
    pub direccion: String,
    pub fecha_nacimiento: NaiveDate,
    pub ciudad: String,
    pub codigo_postal: String,
    #[serde(default)]
    pub historial_compras: Vec<PurchaseView>,
}

/// Body of `GET /usuarios/perfil`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub usuario: UserView,
    pub cliente: Option<ClientView>,
}

/// Body of a successful login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub usuario: UserView,
}

/// Client details posted with a purchase.
///
/// Read from the checkout form and forwarded as JSON. Blank fields are
/// left out so the backend can name what is missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseForm {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub documento: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub telefono: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub direccion: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub fecha_nacimiento: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub ciudad: Option<String>,
    #[serde(default, skip_serializing_if = "is_blank")]
    pub codigo_postal: Option<String>,
}

#[allow(clippy::ref_option)]
fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(|v| v.trim().is_empty())
}
