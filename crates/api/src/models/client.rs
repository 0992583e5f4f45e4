//! Client profiles and purchase history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use tienda_core::{
    ClientId, Phone, Price, ProductId, PurchaseId, UserId, ValidationErrors, parse_date,
};

use super::product::Product;
use super::user::{User, UserSummary};

/// A client profile. `E` is the history entry type: stored entries, or
/// entries resolved against the catalog for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientProfile<E = PurchaseEntry> {
    pub id: ClientId,
    #[serde(rename = "usuario")]
    pub user_id: UserId,
    #[serde(rename = "documento")]
    pub document: Option<String>,
    #[serde(rename = "telefono")]
    pub phone: Phone,
    #[serde(rename = "direccion")]
    pub address: String,
    #[serde(rename = "fechaNacimiento")]
    pub birth_date: NaiveDate,
    #[serde(rename = "ciudad")]
    pub city: String,
    #[serde(rename = "codigoPostal")]
    pub postal_code: String,
    #[serde(rename = "historialCompras")]
    pub history: Vec<E>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// One purchase. Reference and price are frozen at purchase time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PurchaseEntry {
    pub id: PurchaseId,
    /// `None` once the product has been removed from the catalog.
    #[serde(rename = "productoId")]
    pub product_id: Option<ProductId>,
    #[serde(rename = "referencia")]
    pub product_reference: String,
    #[serde(rename = "precioCompra")]
    pub price_paid: Price,
    #[serde(rename = "fecha")]
    pub purchased_at: DateTime<Utc>,
}

/// A history entry with its product record attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedPurchase {
    #[serde(flatten)]
    pub entry: PurchaseEntry,
    #[serde(rename = "producto")]
    pub product: Option<Product>,
}

/// A client profile with the owner's public fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientWithUser {
    #[serde(flatten)]
    pub client: ClientProfile,
    #[serde(rename = "datosUsuario")]
    pub user: UserSummary,
}

/// Response of `GET /usuarios/perfil`.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    #[serde(rename = "usuario")]
    pub user: User,
    #[serde(rename = "cliente")]
    pub client: Option<ClientProfile<ResolvedPurchase>>,
}

/// A client profile ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub user_id: UserId,
    pub document: Option<String>,
    pub phone: Phone,
    pub address: String,
    pub birth_date: NaiveDate,
    pub city: String,
    pub postal_code: String,
}

/// Partial update of a client profile. The owner cannot change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientChanges {
    pub document: Option<String>,
    pub phone: Option<Phone>,
    pub address: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
}

/// A purchase about to be appended to a history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPurchase {
    pub product_id: ProductId,
    pub product_reference: String,
    pub price_paid: Price,
    pub purchased_at: DateTime<Utc>,
}

/// Raw client payload, also the optional body of a purchase.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientInput {
    pub usuario: Option<UserId>,
    pub documento: Option<String>,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub fecha_nacimiento: Option<String>,
    pub ciudad: Option<String>,
    pub codigo_postal: Option<String>,
}

impl ClientInput {
    /// Validate a payload for `POST /clientes`. Owner and document are required.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn into_new_client(self) -> Result<NewClient, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if self.usuario.is_none() {
            errors.push("usuario", "Falta el id del usuario en el cuerpo de la solicitud.");
        }
        let document = errors.require(
            "documento",
            self.documento.as_deref(),
            "El documento es obligatorio.",
        );
        let client = self.contact_details(&mut errors, self.usuario.unwrap_or(UserId::new(0)));
        match (client, document) {
            (Some(client), Some(document)) if errors.is_empty() => Ok(NewClient {
                document: Some(document),
                ..client
            }),
            _ => Err(errors),
        }
    }

    /// Validate the details needed to provision a profile on first purchase.
    /// The document is optional here.
    ///
    /// # Errors
    ///
    /// Returns every missing or malformed field.
    pub fn into_purchase_profile(self, user_id: UserId) -> Result<NewClient, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let client = self.contact_details(&mut errors, user_id);
        match client {
            Some(client) if errors.is_empty() => Ok(NewClient {
                document: self
                    .documento
                    .map(|d| d.trim().to_owned())
                    .filter(|d| !d.is_empty()),
                ..client
            }),
            _ => Err(errors),
        }
    }

    /// Validate a payload for a partial update. `usuario` is ignored.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn into_changes(self) -> Result<ClientChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut changes = ClientChanges::default();

        if let Some(document) = self.documento {
            changes.document =
                errors.require("documento", Some(&document), "El documento es obligatorio.");
        }
        if let Some(phone) = self.telefono {
            changes.phone = errors.check("telefono", Phone::parse(&phone));
        }
        if let Some(address) = self.direccion {
            changes.address =
                errors.require("direccion", Some(&address), "La dirección es obligatoria.");
        }
        if let Some(date) = self.fecha_nacimiento {
            changes.birth_date = errors.check("fechaNacimiento", parse_date(&date));
        }
        if let Some(city) = self.ciudad {
            changes.city = errors.require("ciudad", Some(&city), "La ciudad es obligatoria.");
        }
        if let Some(code) = self.codigo_postal {
            changes.postal_code =
                errors.require("codigoPostal", Some(&code), "El código postal es obligatorio.");
        }

        errors.into_result(changes)
    }

    fn contact_details(&self, errors: &mut ValidationErrors, user_id: UserId) -> Option<NewClient> {
        let phone = match self.telefono.as_deref() {
            Some(raw) => errors.check("telefono", Phone::parse(raw)),
            None => errors.check("telefono", Phone::parse("")),
        };
        let address = errors.require(
            "direccion",
            self.direccion.as_deref(),
            "La dirección es obligatoria.",
        );
        let birth_date = match self.fecha_nacimiento.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => errors.check("fechaNacimiento", parse_date(raw)),
            _ => {
                errors.push("fechaNacimiento", "La fecha de nacimiento es obligatoria.");
                None
            }
        };
        let city = errors.require("ciudad", self.ciudad.as_deref(), "La ciudad es obligatoria.");
        let postal_code = errors.require(
            "codigoPostal",
            self.codigo_postal.as_deref(),
            "El código postal es obligatorio.",
        );

        Some(NewClient {
            user_id,
            document: None,
            phone: phone?,
            address: address?,
            birth_date: birth_date?,
            city: city?,
            postal_code: postal_code?,
        })
    }
}
