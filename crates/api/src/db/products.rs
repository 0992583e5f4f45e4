//! `ProductStore` over `PostgreSQL`.

use chrono::{DateTime, Utc};

use tienda_core::{Price, ProductId};

use super::{PgStore, ProductStore, RepositoryError, map_write_error};
use crate::models::{NewProduct, Product, ProductChanges, ProductFilter};

pub(super) const PRODUCT_COLUMNS: &str =
    "id, reference, name, description, price, published, image_url, created_at, updated_at";

#[derive(sqlx::FromRow)]
pub(super) struct ProductRow {
    id: ProductId,
    reference: String,
    name: String,
    description: Option<String>,
    price: Price,
    published: bool,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            reference: row.reference,
            name: row.name,
            description: row.description,
            price: row.price,
            published: row.published,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl ProductStore for PgStore {
    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM tienda.products
            WHERE $1::BOOLEAN IS NULL OR published = $1
            ORDER BY id
            "
        ))
        .bind(filter.published)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn find_product(&self, reference: &str) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM tienda.products WHERE reference = $1"
        ))
        .bind(reference)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Product::from))
    }

    async fn create_product(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            INSERT INTO tienda.products (reference, name, description, price, published, image_url)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(&product.reference)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price)
        .bind(product.published)
        .bind(&product.image_url)
        .fetch_one(self.pool())
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }

    async fn update_product(
        &self,
        reference: &str,
        changes: ProductChanges,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE tienda.products
            SET reference = COALESCE($2, reference),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                published = COALESCE($6, published),
                image_url = COALESCE($7, image_url)
            WHERE reference = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(reference)
        .bind(changes.reference)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.published)
        .bind(changes.image_url)
        .fetch_optional(self.pool())
        .await
        .map_err(map_write_error)?;

        Ok(row.map(Product::from))
    }

    async fn delete_product(&self, reference: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM tienda.products WHERE reference = $1")
            .bind(reference)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
