//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - User registration and login (Argon2id passwords)
//! - `checkout` - Builds hosted checkout sessions from the cart
//! - `orders` - Materializes carts into immutable orders
//! - `invoice` - Generates invoice documents from persisted orders
//!
//! Services borrow the pool per request and return their own typed
//! errors; `AppError` maps those onto HTTP responses.

pub mod auth;
pub mod checkout;
pub mod invoice;
pub mod orders;

use tracing::warn;

use crate::db::{ProductRepository, RepositoryError};
use crate::models::cart::Cart;
use crate::models::product::Product;

/// A cart line resolved against the live catalog.
#[derive(Debug, Clone)]
pub struct ResolvedLine {
    pub product: Product,
    pub quantity: u32,
}

/// Resolve a cart against the catalog, dropping stale lines.
///
/// A line whose product id no longer resolves is a stale-cart condition:
/// the line is skipped (with a warning) rather than failing the whole
/// operation, and the shopper sees a reduced total.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if a catalog read fails.
pub async fn resolve_cart(
    products: &ProductRepository<'_>,
    cart: &Cart,
) -> Result<Vec<ResolvedLine>, RepositoryError> {
    let mut resolved = Vec::with_capacity(cart.items().len());

    for item in cart.items() {
        match products.get_by_id(item.product_id).await? {
            Some(product) => resolved.push(ResolvedLine {
                product,
                quantity: item.quantity,
            }),
            None => {
                warn!(
                    product_id = %item.product_id,
                    "dropping stale cart line: product no longer exists"
                );
            }
        }
    }

    Ok(resolved)
}
