//! The shopper's cart.
//!
//! A cart is owned by exactly one user and stored whole as a JSONB
//! column on the user row, so these operations are pure mutations on an
//! owned value; persistence is the repository's concern.

use serde::{Deserialize, Serialize};

use marigold_core::ProductId;

/// One cart line: a product reference and a quantity of at least 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// A shopper's current selections, keyed uniquely by product id.
///
/// Invariants:
/// - no two items share a `product_id` (adds merge into the existing
///   line instead of appending a duplicate),
/// - every quantity is at least 1 (a zero-quantity add is rejected at
///   the route boundary and ignored here).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// The cart lines, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0, |acc, item| acc.saturating_add(item.quantity))
    }

    /// Add `quantity` units of a product.
    ///
    /// If the product is already in the cart its line quantity is
    /// incremented; otherwise a new line is appended. A zero quantity
    /// leaves the cart unchanged.
    pub fn add(&mut self, product_id: ProductId, quantity: u32) {
        if quantity == 0 {
            return;
        }

        if let Some(item) = self.items.iter_mut().find(|i| i.product_id == product_id) {
            item.quantity = item.quantity.saturating_add(quantity);
        } else {
            self.items.push(CartItem {
                product_id,
                quantity,
            });
        }
    }

    /// Remove a product's line entirely.
    ///
    /// Removing a product that is not in the cart is a no-op.
    pub fn remove(&mut self, product_id: ProductId) {
        self.items.retain(|i| i.product_id != product_id);
    }

    /// Empty the cart.
    ///
    /// Called exactly once, after an order has been materialized from it.
    pub fn clear(&mut self) {
        self.items.clear();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn product(id: i32) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn test_add_appends_new_line() {
        let mut cart = Cart::default();
        cart.add(product(1), 2);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn test_add_merges_existing_line() {
        let mut cart = Cart::default();
        cart.add(product(1), 2);
        cart.add(product(1), 3);

        // One line for the product, quantities summed
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut cart = Cart::default();
        cart.add(product(2), 1);
        cart.add(product(7), 1);
        cart.add(product(2), 1);

        let ids: Vec<i32> = cart.items().iter().map(|i| i.product_id.as_i32()).collect();
        assert_eq!(ids, vec![2, 7]);
    }

    #[test]
    fn test_add_zero_quantity_is_noop() {
        let mut cart = Cart::default();
        cart.add(product(1), 0);

        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_filters_line() {
        let mut cart = Cart::default();
        cart.add(product(1), 1);
        cart.add(product(2), 1);
        cart.remove(product(1));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].product_id, product(2));
    }

    #[test]
    fn test_remove_absent_product_is_noop() {
        let mut cart = Cart::default();
        cart.add(product(1), 1);

        let before = cart.clone();
        cart.remove(product(99));

        assert_eq!(cart, before);
    }

    #[test]
    fn test_clear_empties_cart() {
        let mut cart = Cart::default();
        cart.add(product(1), 4);
        cart.add(product(2), 1);
        cart.clear();

        assert!(cart.is_empty());
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_item_count_sums_quantities() {
        let mut cart = Cart::default();
        cart.add(product(1), 2);
        cart.add(product(2), 1);

        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_serde_roundtrip() {
        let mut cart = Cart::default();
        cart.add(product(1), 2);

        let json = serde_json::to_value(&cart).unwrap();
        let parsed: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, cart);
    }

    #[test]
    fn test_deserializes_empty_column_default() {
        // The users.cart column default
        let cart: Cart = serde_json::from_str(r#"{"items": []}"#).unwrap();
        assert!(cart.is_empty());
    }
}
