//! Domain models for storefront.
//!
//! These types represent validated domain objects separate from database
//! row types. The cart and order models are pure: all of their behavior
//! is expressed without I/O so it can be tested directly.

pub mod cart;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{Cart, CartItem};
pub use order::{Order, OrderLine, ProductSnapshot, Purchaser};
pub use product::Product;
pub use session::CurrentUser;
pub use session::keys as session_keys;
pub use user::User;
