//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};

use marigold_core::{Email, UserId};

use crate::models::cart::Cart;

/// A storefront user (domain type).
///
/// The user owns their cart; it lives on the user row and is only
/// mutated through the cart operations.
#[derive(Debug, Clone)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// User's email address.
    pub email: Email,
    /// Optional display name shown on orders.
    pub name: Option<String>,
    /// The user's current cart.
    pub cart: Cart,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
    /// When the user was last updated.
    pub updated_at: DateTime<Utc>,
}
