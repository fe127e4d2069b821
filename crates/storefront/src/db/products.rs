//! Product catalog repository.
//!
//! The storefront treats the catalog as read-only: rows are seeded via
//! the CLI and only ever read here. Prices are stored as `NUMERIC` in the
//! currency's standard unit; the configured storefront currency is
//! applied when rows are lifted into domain [`Product`]s.

use rust_decimal::Decimal;
use sqlx::PgPool;

use marigold_core::{CurrencyCode, Price, ProductId};

use super::RepositoryError;
use crate::models::product::Product;

/// Database row for a product.
#[derive(sqlx::FromRow)]
struct ProductRow {
    id: i32,
    title: String,
    description: String,
    price: Decimal,
    image_url: String,
}

impl ProductRow {
    fn into_product(self, currency: CurrencyCode) -> Product {
        Product {
            id: ProductId::new(self.id),
            title: self.title,
            description: self.description,
            price: Price::new(self.price, currency),
            image_url: self.image_url,
        }
    }
}

/// Repository for catalog reads.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
    currency: CurrencyCode,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool, currency: CurrencyCode) -> Self {
        Self { pool, currency }
    }

    /// Get a product by its ID. Returns `None` for unknown ids.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, description, price, image_url
            FROM products
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| r.into_product(self.currency)))
    }

    /// List the whole catalog, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r"
            SELECT id, title, description, price, image_url
            FROM products
            ORDER BY id ASC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| r.into_product(self.currency))
            .collect())
    }

    /// Insert a catalog row. Used by the CLI seeder, not the storefront.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(
        &self,
        title: &str,
        description: &str,
        price: Decimal,
        image_url: &str,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(
            r"
            INSERT INTO products (title, description, price, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, description, price, image_url
            ",
        )
        .bind(title)
        .bind(description)
        .bind(price)
        .bind(image_url)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into_product(self.currency))
    }

    /// Delete every catalog row. Used by the CLI seeder's `--clear` flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM products").execute(self.pool).await?;
        Ok(result.rows_affected())
    }
}
