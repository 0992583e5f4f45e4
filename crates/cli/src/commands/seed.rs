//! Seed the product catalog from a YAML file.
//!
//! Products are upserted by reference: existing entries are updated in
//! place, so the same file can be applied repeatedly.
//!
//! ```yaml
//! products:
//!   - referencia: TAZA-01
//!     nombre: Taza de cerámica
//!     descripcion: 350 ml, apta para microondas
//!     precio: 19.99
//!     publicado: true
//! ```

use std::collections::HashSet;
use std::path::Path;

use serde::Deserialize;
use tracing::{error, info};

use tienda_api::db::{self, PgStore, ProductStore};
use tienda_api::models::ProductInput;

/// Contents of a catalog file.
#[derive(Debug, Deserialize)]
pub struct Catalog {
    pub products: Vec<ProductInput>,
}

/// Counts reported after seeding.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: usize,
    pub updated: usize,
}

/// Parse a catalog file.
///
/// # Errors
///
/// Returns the YAML error if the document does not match [`Catalog`].
pub fn parse_catalog(content: &str) -> Result<Catalog, serde_yaml::Error> {
    serde_yaml::from_str(content)
}

/// Every problem in the catalog, one line each. Empty when valid.
#[must_use]
pub fn validate_catalog(catalog: &Catalog) -> Vec<String> {
    let mut problems = Vec::new();
    let mut seen = HashSet::new();

    for (index, input) in catalog.products.iter().enumerate() {
        let label = input
            .referencia
            .as_deref()
            .map_or_else(|| format!("#{}", index + 1), |r| r.trim().to_owned());

        if let Err(errors) = input.clone().into_new_product() {
            problems.push(format!("{label}: {errors}"));
        } else if !seen.insert(label.clone()) {
            problems.push(format!("{label}: duplicated reference"));
        }
    }

    problems
}

/// Seed products from `file_path`.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is invalid, or if a
/// database operation fails.
pub async fn products(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = super::database_url().ok_or("API_DATABASE_URL not set")?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");

    // Read and validate before connecting to the database
    let content = tokio::fs::read_to_string(path).await?;
    let catalog = parse_catalog(&content)?;
    info!(products = catalog.products.len(), "Parsed catalog");

    let problems = validate_catalog(&catalog);
    if !problems.is_empty() {
        error!("Catalog validation failed:");
        for problem in &problems {
            error!("  - {problem}");
        }
        return Err(format!("{} validation errors found", problems.len()).into());
    }

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let summary = upsert_all(&PgStore::new(pool.clone()), catalog).await?;
    pool.close().await;

    info!("Seeding complete!");
    info!("  Products created: {}", summary.created);
    info!("  Products updated: {}", summary.updated);
    Ok(())
}

/// Create or update each product of an already validated catalog.
async fn upsert_all<S: ProductStore>(
    store: &S,
    catalog: Catalog,
) -> Result<SeedSummary, Box<dyn std::error::Error>> {
    let mut summary = SeedSummary::default();

    for input in catalog.products {
        let reference = input.referencia.as_deref().unwrap_or_default().trim().to_owned();

        if store.find_product(&reference).await?.is_some() {
            store.update_product(&reference, input.into_changes()?).await?;
            summary.updated += 1;
        } else {
            store.create_product(input.into_new_product()?).await?;
            summary.created += 1;
        }
    }

    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const CATALOG: &str = r"
products:
  - referencia: TAZA-01
    nombre: Taza de cerámica
    precio: 19.99
    publicado: true
  - referencia: CAMISETA-M
    nombre: Camiseta
    descripcion: Algodón, talla M
    precio: '45000'
";

    #[test]
    fn test_parse_catalog() {
        let catalog = parse_catalog(CATALOG).unwrap();
        assert_eq!(catalog.products.len(), 2);
        assert!(validate_catalog(&catalog).is_empty());

        let taza = catalog.products[0].clone().into_new_product().unwrap();
        assert_eq!(taza.price.to_string(), "19.99");
        assert!(taza.published);

        let camiseta = catalog.products[1].clone().into_new_product().unwrap();
        assert!(!camiseta.published);
        assert_eq!(camiseta.description.as_deref(), Some("Algodón, talla M"));
    }

    #[test]
    fn test_validate_reports_bad_entries() {
        let catalog = parse_catalog(
            r"
products:
  - nombre: Sin referencia
    precio: 10
  - referencia: TAZA-01
    nombre: Taza
    precio: 1
  - referencia: TAZA-01
    nombre: Otra taza
    precio: 2
  - referencia: GRATIS
    nombre: Regalo
    precio: -5
",
        )
        .unwrap();

        let problems = validate_catalog(&catalog);
        assert_eq!(problems.len(), 3);
        assert!(problems[0].starts_with("#1:"));
        assert_eq!(problems[1], "TAZA-01: duplicated reference");
        assert!(problems[2].starts_with("GRATIS:"));
    }

    #[test]
    fn test_missing_products_key_is_an_error() {
        assert!(parse_catalog("items: []").is_err());
    }
}
