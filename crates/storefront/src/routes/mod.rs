//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Product listing (home)
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products/{id}          - Product detail
//!
//! # Cart (requires auth)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add a product (merges quantities)
//! POST /cart/remove            - Remove a product (idempotent)
//!
//! # Checkout (requires auth)
//! GET  /checkout               - Build a payment session, render checkout page
//! GET  /checkout/success       - Provider success callback: materialize the order
//! GET  /checkout/cancel        - Provider cancel callback: back to the cart
//!
//! # Orders (requires auth)
//! GET  /orders                 - Order history
//! POST /orders                 - Place an order directly from the cart
//! GET  /orders/{id}/invoice    - Download the invoice document
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/success", get(checkout::success))
        .route("/cancel", get(checkout::cancel))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::create))
        .route("/{id}/invoice", get(orders::invoice))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Product listing doubles as the home page
        .route("/", get(products::index))
        .route("/products/{id}", get(products::show))
        // Cart routes
        .nest("/cart", cart_routes())
        // Checkout routes
        .nest("/checkout", checkout_routes())
        // Order routes
        .nest("/orders", order_routes())
        // Auth routes
        .nest("/auth", auth_routes())
}
