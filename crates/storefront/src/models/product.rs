//! Product domain type.

use marigold_core::{Price, ProductId};

/// A catalog product (domain type).
///
/// Read-only to the storefront; the catalog is maintained out of band
/// and seeded via the CLI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Product {
    /// Unique product ID.
    pub id: ProductId,
    /// Display title.
    pub title: String,
    /// Long-form description.
    pub description: String,
    /// Current unit price.
    pub price: Price,
    /// Image location for product pages.
    pub image_url: String,
}
