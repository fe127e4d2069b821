//! Order materialization.
//!
//! The transactional heart of the pipeline: snapshots the cart into an
//! immutable order, persists it, and only then clears the cart.

use sqlx::PgPool;
use thiserror::Error;

use crate::config::StorefrontConfig;
use crate::db::{OrderRepository, ProductRepository, RepositoryError, UserRepository};
use crate::models::cart::Cart;
use crate::models::order::{Order, OrderLine, ProductSnapshot, Purchaser};
use crate::models::session::CurrentUser;
use crate::services::resolve_cart;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum OrderError {
    /// The cart resolved to no purchasable lines; nothing was written.
    #[error("cart is empty")]
    EmptyCart,

    /// Repository/database error. On an order-write failure the cart is
    /// left untouched so the shopper can retry.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Materializes carts into persisted orders.
pub struct OrderService<'a> {
    users: UserRepository<'a>,
    products: ProductRepository<'a>,
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, config: &StorefrontConfig) -> Self {
        Self {
            users: UserRepository::new(pool),
            products: ProductRepository::new(pool, config.payments.currency),
            orders: OrderRepository::new(pool),
        }
    }

    /// Snapshot the shopper's cart into a new immutable order.
    ///
    /// Steps, in a fixed sequence:
    ///
    /// 1. read the current cart and resolve each line to a live product,
    /// 2. reject an empty result before any write,
    /// 3. persist the order with deep-copied product snapshots,
    /// 4. clear the cart - only reached once step 3 has succeeded.
    ///
    /// A cart-clear failure after the order row is durable is logged and
    /// accepted: the shopper may briefly see both the completed order
    /// and leftover cart items. There is no rollback of a persisted
    /// order.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::EmptyCart` if there is nothing to order and
    /// `OrderError::Repository` if persistence fails (the cart is left
    /// unchanged in that case).
    pub async fn place_order(&self, current: &CurrentUser) -> Result<Order, OrderError> {
        let cart = self.users.get_cart(current.id).await?;
        let resolved = resolve_cart(&self.products, &cart).await?;

        if resolved.is_empty() {
            return Err(OrderError::EmptyCart);
        }

        let lines: Vec<OrderLine> = resolved
            .iter()
            .map(|line| OrderLine {
                product: ProductSnapshot::from(&line.product),
                quantity: line.quantity,
            })
            .collect();

        let purchaser = Purchaser {
            user_id: current.id,
            email: current.email.clone(),
        };

        let order = self.orders.create(&purchaser, &lines).await?;

        // The cart is cleared only after the order row is durable. A
        // failure here leaves both in place; it is not rolled back.
        if let Err(e) = self.users.save_cart(current.id, &Cart::default()).await {
            tracing::error!(
                order_id = %order.id,
                user_id = %current.id,
                "order persisted but cart clear failed: {e}"
            );
        }

        Ok(order)
    }
}
