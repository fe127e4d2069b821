//! Checkout session builder.
//!
//! Converts a populated cart into a hosted checkout session with the
//! payment provider. Nothing is persisted here: the order is only
//! materialized at the success callback, so a provider failure leaves
//! the cart untouched and the shopper can retry immediately.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;

use marigold_core::{CurrencyCode, ProductId};

use crate::config::StorefrontConfig;
use crate::db::{ProductRepository, RepositoryError, UserRepository};
use crate::models::session::CurrentUser;
use crate::payments::types::{CheckoutSessionRequest, ProviderSession, SessionLineItem};
use crate::payments::{PaymentsClient, PaymentsError};
use crate::services::{ResolvedLine, resolve_cart};

/// Errors that can occur while building a checkout session.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The cart resolved to no purchasable lines.
    #[error("cart is empty")]
    EmptyCart,

    /// A line's price does not fit the provider's minor-unit amount.
    #[error("price of product {0} cannot be expressed in minor units")]
    AmountOverflow(ProductId),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// The payment provider call failed. Retryable; no state was mutated.
    #[error("payment provider error: {0}")]
    Provider(#[from] PaymentsError),
}

/// Everything the checkout page needs for one attempt.
#[derive(Debug)]
pub struct CheckoutSummary {
    /// The cart lines as they were priced for this session.
    pub lines: Vec<ResolvedLine>,
    /// Cart total in the storefront currency's standard unit.
    pub total: Decimal,
    /// The transient provider session driving the client-side redirect.
    pub session: ProviderSession,
}

/// Builds hosted checkout sessions from the shopper's cart.
pub struct CheckoutService<'a> {
    users: UserRepository<'a>,
    products: ProductRepository<'a>,
    payments: &'a PaymentsClient,
    base_url: &'a str,
    currency: CurrencyCode,
}

impl<'a> CheckoutService<'a> {
    /// Create a new checkout service.
    #[must_use]
    pub fn new(
        pool: &'a PgPool,
        payments: &'a PaymentsClient,
        config: &'a StorefrontConfig,
    ) -> Self {
        Self {
            users: UserRepository::new(pool),
            products: ProductRepository::new(pool, config.payments.currency),
            payments,
            base_url: config.base_url.as_str(),
            currency: config.payments.currency,
        }
    }

    /// Begin a checkout attempt for the shopper's current cart.
    ///
    /// Resolves the cart against the catalog (stale lines dropped),
    /// refuses an empty result before any provider call, and creates a
    /// hosted session with one line item per cart entry plus absolute
    /// success/cancel callback URLs.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if nothing is purchasable,
    /// `CheckoutError::Provider` if the session cannot be created
    /// (retryable, no state mutated), and `CheckoutError::Repository`
    /// for storage failures.
    pub async fn begin(&self, current: &CurrentUser) -> Result<CheckoutSummary, CheckoutError> {
        let cart = self.users.get_cart(current.id).await?;
        let resolved = resolve_cart(&self.products, &cart).await?;

        // The provider must never see an empty line-item list
        let line_items = line_items(&resolved, self.currency)?;
        let total = cart_total(&resolved);

        let request = CheckoutSessionRequest {
            line_items,
            success_url: format!("{}/checkout/success", self.base_url),
            cancel_url: format!("{}/checkout/cancel", self.base_url),
        };

        let session = self.payments.create_checkout_session(&request).await?;

        Ok(CheckoutSummary {
            lines: resolved,
            total,
            session,
        })
    }
}

/// Sum of `quantity x unit price` over resolved lines.
#[must_use]
pub fn cart_total(lines: &[ResolvedLine]) -> Decimal {
    lines
        .iter()
        .map(|l| l.product.price.amount * Decimal::from(l.quantity))
        .sum()
}

/// Build provider line items from resolved cart lines.
///
/// # Errors
///
/// Returns `CheckoutError::EmptyCart` for an empty slice and
/// `CheckoutError::AmountOverflow` if a price has no minor-unit
/// representation.
fn line_items(
    lines: &[ResolvedLine],
    currency: CurrencyCode,
) -> Result<Vec<SessionLineItem>, CheckoutError> {
    if lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    lines
        .iter()
        .map(|line| {
            let unit_amount = line
                .product
                .price
                .minor_units()
                .ok_or(CheckoutError::AmountOverflow(line.product.id))?;

            Ok(SessionLineItem {
                name: line.product.title.clone(),
                description: line.product.description.clone(),
                unit_amount,
                currency: currency.code(),
                quantity: line.quantity,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use marigold_core::Price;

    use crate::models::product::Product;

    fn resolved(id: i32, cents: i64, quantity: u32) -> ResolvedLine {
        ResolvedLine {
            product: Product {
                id: ProductId::new(id),
                title: format!("Product {id}"),
                description: "A test product".to_string(),
                price: Price::new(Decimal::new(cents, 2), CurrencyCode::USD),
                image_url: format!("/images/{id}.jpg"),
            },
            quantity,
        }
    }

    #[test]
    fn test_cart_total() {
        // $10.00 x 2 + $5.00 x 1 = $25.00
        let lines = vec![resolved(1, 1000, 2), resolved(2, 500, 1)];
        assert_eq!(cart_total(&lines), Decimal::new(2500, 2));
    }

    #[test]
    fn test_cart_total_empty_is_zero() {
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }

    #[test]
    fn test_line_items_converts_to_minor_units() {
        let lines = vec![resolved(1, 1999, 3)];
        let items = line_items(&lines, CurrencyCode::USD).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].unit_amount, 1999);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].currency, "usd");
        assert_eq!(items[0].name, "Product 1");
    }

    #[test]
    fn test_line_items_rejects_empty_cart() {
        // An empty cart must short-circuit before any provider call
        assert!(matches!(
            line_items(&[], CurrencyCode::USD),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_line_items_rejects_unrepresentable_amount() {
        let mut line = resolved(7, 1000, 1);
        line.product.price = Price::new(Decimal::MAX, CurrencyCode::USD);

        assert!(matches!(
            line_items(&[line], CurrencyCode::USD),
            Err(CheckoutError::AmountOverflow(id)) if id == ProductId::new(7)
        ));
    }
}
