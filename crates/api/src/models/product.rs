//! Catalog models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tienda_core::{Price, PriceError, ProductId, ValidationErrors};

/// A catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Product {
    pub id: ProductId,
    #[serde(rename = "referencia")]
    pub reference: String,
    #[serde(rename = "nombre")]
    pub name: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "precio")]
    pub price: Price,
    #[serde(rename = "publicado")]
    pub published: bool,
    #[serde(rename = "imagen")]
    pub image_url: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "updatedAt")]
    pub updated_at: DateTime<Utc>,
}

/// A product ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub reference: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    pub published: bool,
    pub image_url: Option<String>,
}

/// Partial update of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductChanges {
    pub reference: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub published: Option<bool>,
    pub image_url: Option<String>,
}

/// Listing filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Only products whose publication flag equals this value.
    pub published: Option<bool>,
}

/// Query string of `GET /productos`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductQuery {
    pub publicado: Option<String>,
}

impl ProductQuery {
    /// `true` lists published products, any other non-empty value lists
    /// unpublished ones. Absent or empty lists everything.
    #[must_use]
    pub fn filter(&self) -> ProductFilter {
        let published = match self.publicado.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(value == "true"),
        };
        ProductFilter { published }
    }
}

/// Raw product payload. `precio` may be a JSON number or a numeric string.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductInput {
    pub referencia: Option<String>,
    pub nombre: Option<String>,
    pub descripcion: Option<String>,
    pub precio: Option<Value>,
    pub publicado: Option<bool>,
    pub imagen: Option<String>,
}

impl ProductInput {
    /// Validate a payload for product creation.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn into_new_product(self) -> Result<NewProduct, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let reference = errors.require(
            "referencia",
            self.referencia.as_deref(),
            "La referencia es obligatoria.",
        );
        let name = errors.require("nombre", self.nombre.as_deref(), "El nombre es obligatorio.");
        let price = match self.precio {
            Some(ref value) => errors.check("precio", price_from_json(value)),
            None => {
                errors.push("precio", "El precio es obligatorio.");
                None
            }
        };

        match (reference, name, price) {
            (Some(reference), Some(name), Some(price)) => Ok(NewProduct {
                reference,
                name,
                description: non_blank(self.descripcion),
                price,
                published: self.publicado.unwrap_or(false),
                image_url: non_blank(self.imagen),
            }),
            _ => Err(errors),
        }
    }

    /// Validate a payload for a partial update.
    ///
    /// # Errors
    ///
    /// Returns every field problem found.
    pub fn into_changes(self) -> Result<ProductChanges, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut changes = ProductChanges {
            description: non_blank(self.descripcion),
            published: self.publicado,
            image_url: non_blank(self.imagen),
            ..ProductChanges::default()
        };

        if let Some(reference) = self.referencia {
            changes.reference =
                errors.require("referencia", Some(&reference), "La referencia es obligatoria.");
        }
        if let Some(name) = self.nombre {
            changes.name = errors.require("nombre", Some(&name), "El nombre es obligatorio.");
        }
        if let Some(ref value) = self.precio {
            changes.price = errors.check("precio", price_from_json(value));
        }

        errors.into_result(changes)
    }
}

fn price_from_json(value: &Value) -> Result<Price, PriceError> {
    match value {
        Value::Number(n) => Price::parse(&n.to_string()),
        Value::String(s) => Price::parse(s),
        _ => Err(PriceError::Invalid),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn parse(body: Value) -> ProductInput {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_query_filter() {
        let query = |v: &str| ProductQuery {
            publicado: Some(v.to_owned()),
        };
        assert_eq!(query("true").filter().published, Some(true));
        assert_eq!(query("false").filter().published, Some(false));
        assert_eq!(query("").filter().published, None);
        assert_eq!(ProductQuery::default().filter().published, None);
    }

    #[test]
    fn test_query_filter_other_values_select_unpublished() {
        let query = |v: &str| ProductQuery {
            publicado: Some(v.to_owned()),
        };
        assert_eq!(query("si").filter().published, Some(false));
        assert_eq!(query("yes").filter().published, Some(false));
        assert_eq!(query("TRUE").filter().published, Some(false));
    }

    #[test]
    fn test_new_product_accepts_number_or_string_price() {
        let a = parse(json!({"referencia": "A1", "nombre": "Taza", "precio": 12.5}))
            .into_new_product()
            .unwrap();
        let b = parse(json!({"referencia": "A1", "nombre": "Taza", "precio": "12.50"}))
            .into_new_product()
            .unwrap();
        assert_eq!(a.price, b.price);
        assert!(!a.published);
    }

    #[test]
    fn test_new_product_requires_fields() {
        let errors = parse(json!({"precio": -3})).into_new_product().unwrap_err();
        assert_eq!(errors.fields(), vec!["referencia", "nombre", "precio"]);
    }

    #[test]
    fn test_new_product_rejects_non_numeric_price() {
        let errors = parse(json!({"referencia": "A1", "nombre": "Taza", "precio": true}))
            .into_new_product()
            .unwrap_err();
        assert_eq!(errors.fields(), vec!["precio"]);
    }

    #[test]
    fn test_changes_are_partial() {
        let changes = parse(json!({"publicado": true})).into_changes().unwrap();
        assert_eq!(changes.published, Some(true));
        assert!(changes.price.is_none());
        assert!(changes.reference.is_none());
    }
}
