//! Order domain types.
//!
//! An order is an immutable record of a completed purchase. Its lines
//! carry full product snapshots taken at order time, so invoices and
//! order history stay stable no matter what later happens to the
//! catalog.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use marigold_core::{CurrencyCode, Email, OrderId, Price, ProductId, UserId};

use crate::models::product::Product;

/// A full copy of a product's fields as they were at order time.
///
/// Deliberately a deep copy, never a reference to the catalog row: an
/// order must not change when the product is edited or deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSnapshot {
    pub product_id: ProductId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub image_url: String,
}

impl From<&Product> for ProductSnapshot {
    fn from(product: &Product) -> Self {
        Self {
            product_id: product.id,
            title: product.title.clone(),
            description: product.description.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
        }
    }
}

/// One order line: a product snapshot and the purchased quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product: ProductSnapshot,
    pub quantity: u32,
}

impl OrderLine {
    /// `quantity x unit price`, from the snapshot price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product.price.amount * Decimal::from(self.quantity)
    }
}

/// The identity an order belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchaser {
    pub user_id: UserId,
    pub email: Email,
}

/// An immutable, persisted order.
///
/// Created only by the order service; never updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: OrderId,
    pub lines: Vec<OrderLine>,
    pub purchaser: Purchaser,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Grand total over the order's own snapshot prices.
    ///
    /// Never re-reads current catalog prices, so the value is stable for
    /// the lifetime of the order.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(OrderLine::line_total).sum()
    }

    /// Currency of the order's lines.
    ///
    /// All lines share one currency (multi-currency carts don't exist);
    /// an empty order falls back to the default currency.
    #[must_use]
    pub fn currency(&self) -> CurrencyCode {
        self.lines
            .first()
            .map_or_else(CurrencyCode::default, |l| l.product.price.currency_code)
    }

    /// The order total as a displayable [`Price`].
    #[must_use]
    pub fn total_price(&self) -> Price {
        Price::new(self.total(), self.currency())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample_product(id: i32, amount: Decimal) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            description: "A test product".to_string(),
            price: Price::new(amount, CurrencyCode::USD),
            image_url: format!("/images/{id}.jpg"),
        }
    }

    fn order_from(lines: Vec<OrderLine>) -> Order {
        Order {
            id: OrderId::new(1),
            lines,
            purchaser: Purchaser {
                user_id: UserId::new(1),
                email: Email::parse("shopper@example.com").unwrap(),
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_line_total() {
        let product = sample_product(1, Decimal::new(1000, 2)); // $10.00
        let line = OrderLine {
            product: ProductSnapshot::from(&product),
            quantity: 3,
        };

        assert_eq!(line.line_total(), Decimal::new(3000, 2));
    }

    #[test]
    fn test_order_total_sums_lines() {
        let a = sample_product(1, Decimal::new(1000, 2)); // $10.00 x 2
        let b = sample_product(2, Decimal::new(500, 2)); // $5.00 x 1
        let order = order_from(vec![
            OrderLine {
                product: ProductSnapshot::from(&a),
                quantity: 2,
            },
            OrderLine {
                product: ProductSnapshot::from(&b),
                quantity: 1,
            },
        ]);

        assert_eq!(order.total(), Decimal::new(2500, 2)); // $25.00
        assert_eq!(order.total_price().display(), "$25.00");
    }

    #[test]
    fn test_snapshot_is_immune_to_product_mutation() {
        let mut product = sample_product(1, Decimal::new(1000, 2));
        let order = order_from(vec![OrderLine {
            product: ProductSnapshot::from(&product),
            quantity: 1,
        }]);

        // Catalog price moves after the order was created
        product.price = Price::new(Decimal::new(9900, 2), CurrencyCode::USD);
        product.title = "Renamed".to_string();

        assert_eq!(order.total(), Decimal::new(1000, 2));
        assert_eq!(order.lines[0].product.title, "Product 1");
    }

    #[test]
    fn test_empty_order_total_is_zero() {
        let order = order_from(Vec::new());
        assert_eq!(order.total(), Decimal::ZERO);
        assert_eq!(order.currency(), CurrencyCode::default());
    }

    #[test]
    fn test_order_lines_serde_roundtrip() {
        // Lines are persisted as JSONB; the snapshot must survive intact
        let product = sample_product(1, Decimal::new(1999, 2));
        let lines = vec![OrderLine {
            product: ProductSnapshot::from(&product),
            quantity: 2,
        }];

        let value = serde_json::to_value(&lines).unwrap();
        let parsed: Vec<OrderLine> = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, lines);
    }
}
