//! Field-level validation.
//!
//! Input from HTTP bodies is checked here before any store write is
//! attempted. Validators collect every problem instead of stopping at the
//! first one, so a client gets the full list in a single response.

use core::fmt;

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

/// A single problem with one input field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Wire name of the offending field (e.g. `correo`).
    #[serde(rename = "campo")]
    pub field: String,
    /// Human-readable message.
    #[serde(rename = "mensaje")]
    pub message: String,
}

/// An ordered collection of [`FieldError`]s.
///
/// # Example
///
/// ```
/// use tienda_core::ValidationErrors;
///
/// let mut errors = ValidationErrors::new();
/// let name = errors.require("nombreCompleto", Some("  "), "El nombre completo es obligatorio.");
/// assert!(name.is_none());
/// assert_eq!(errors.fields(), vec!["nombreCompleto"]);
/// assert!(errors.into_result(()).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    /// Create an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Create a collection holding one error.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.push(field, message);
        errors
    }

    /// Record an error for `field`.
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_owned(),
            message: message.into(),
        });
    }

    /// Returns `true` when no errors were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of recorded errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over the recorded errors.
    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    /// Names of the offending fields, in the order they were recorded.
    #[must_use]
    pub fn fields(&self) -> Vec<&str> {
        self.0.iter().map(|e| e.field.as_str()).collect()
    }

    /// All messages joined with a space.
    #[must_use]
    pub fn message(&self) -> String {
        self.0
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns `Ok(value)` when empty, otherwise `Err(self)`.
    ///
    /// # Errors
    ///
    /// Returns `self` if at least one error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }

    /// Record the error of a failed parse under `field`.
    ///
    /// Returns the parsed value on success.
    pub fn check<T, E: fmt::Display>(&mut self, field: &str, result: Result<T, E>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.push(field, e.to_string());
                None
            }
        }
    }

    /// Require a non-blank string. Returns the trimmed value.
    pub fn require(&mut self, field: &str, value: Option<&str>, message: &str) -> Option<String> {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Some(v.to_owned()),
            _ => {
                self.push(field, message);
                None
            }
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for ValidationErrors {}

/// Error returned by [`parse_date`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("La fecha '{0}' no es válida (formato esperado AAAA-MM-DD).")]
pub struct DateError(pub String);

/// Parse a calendar date given as `YYYY-MM-DD` or a full RFC 3339 timestamp.
///
/// # Errors
///
/// Returns `DateError` if neither format matches.
pub fn parse_date(raw: &str) -> Result<NaiveDate, DateError> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(trimmed).map(|dt| dt.date_naive()))
        .map_err(|_| DateError(trimmed.to_owned()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_collects_all_errors_in_order() {
        let mut errors = ValidationErrors::new();
        errors.require("telefono", None, "El teléfono es obligatorio.");
        errors.require("direccion", Some(""), "La dirección es obligatoria.");
        errors.require("ciudad", Some("Bogotá"), "La ciudad es obligatoria.");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.fields(), vec!["telefono", "direccion"]);
        assert_eq!(
            errors.message(),
            "El teléfono es obligatorio. La dirección es obligatoria."
        );
    }

    #[test]
    fn test_require_trims() {
        let mut errors = ValidationErrors::new();
        let value = errors.require("ciudad", Some("  Cali "), "obligatoria");
        assert_eq!(value.as_deref(), Some("Cali"));
        assert!(errors.is_empty());
    }

    #[test]
    fn test_check_records_display() {
        let mut errors = ValidationErrors::new();
        let parsed: Option<i32> = errors.check("edad", "x".parse::<i32>());
        assert!(parsed.is_none());
        assert_eq!(errors.fields(), vec!["edad"]);
    }

    #[test]
    fn test_into_result() {
        assert_eq!(ValidationErrors::new().into_result(5).unwrap(), 5);
        assert!(ValidationErrors::single("x", "bad").into_result(5).is_err());
    }

    #[test]
    fn test_serializes_with_wire_names() {
        let errors = ValidationErrors::single("correo", "inválido");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(json, serde_json::json!([{"campo": "correo", "mensaje": "inválido"}]));
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(1990, 5, 17).unwrap();
        assert_eq!(parse_date("1990-05-17").unwrap(), expected);
        assert_eq!(parse_date("1990-05-17T00:00:00Z").unwrap(), expected);
        assert!(parse_date("17/05/1990").is_err());
    }
}
