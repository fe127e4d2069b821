//! Cart route handlers.
//!
//! The cart lives on the authenticated user's row and is mutated only
//! here: add merges quantities per product, remove is idempotent. Each
//! mutation is a whole-cart write (last-write-wins for the single
//! owner).

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::Redirect,
};
use serde::Deserialize;
use tracing::instrument;

use marigold_core::ProductId;

use crate::db::{ProductRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::services::{ResolvedLine, resolve_cart};
use crate::state::AppState;

/// Cart line display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub product_id: i32,
    pub title: String,
    pub quantity: u32,
    pub price: String,
    pub line_price: String,
}

impl From<&ResolvedLine> for CartItemView {
    fn from(line: &ResolvedLine) -> Self {
        let unit = line.product.price;
        let line_price = marigold_core::Price::new(
            unit.amount * rust_decimal::Decimal::from(line.quantity),
            unit.currency_code,
        );

        Self {
            product_id: line.product.id.as_i32(),
            title: line.product.title.clone(),
            quantity: line.quantity,
            price: unit.display(),
            line_price: line_price.display(),
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub subtotal: String,
    pub item_count: u32,
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: i32,
    pub quantity: Option<u32>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub product_id: i32,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
}

/// Display the cart page.
///
/// Lines whose product no longer exists are dropped from the display
/// (and from any later checkout) rather than failing the page.
#[instrument(skip(state, current))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<CartShowTemplate> {
    let users = UserRepository::new(state.pool());
    let products = ProductRepository::new(state.pool(), state.config().payments.currency);

    let cart = users.get_cart(current.id).await?;
    let resolved = resolve_cart(&products, &cart).await?;

    let subtotal = marigold_core::Price::new(
        crate::services::checkout::cart_total(&resolved),
        state.config().payments.currency,
    );

    Ok(CartShowTemplate {
        cart: CartView {
            items: resolved.iter().map(CartItemView::from).collect(),
            subtotal: subtotal.display(),
            item_count: resolved.iter().map(|l| l.quantity).sum(),
        },
    })
}

/// Add a product to the cart.
///
/// Adding a product that is already in the cart increments its line
/// quantity instead of appending a duplicate line.
#[instrument(skip(state, current))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let quantity = form.quantity.unwrap_or(1);
    if quantity == 0 {
        return Err(AppError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }

    // The product must exist right now; its current state is what the
    // shopper saw when they clicked "add"
    let product = ProductRepository::new(state.pool(), state.config().payments.currency)
        .get_by_id(ProductId::new(form.product_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product {}", form.product_id)))?;

    let users = UserRepository::new(state.pool());
    let mut cart = users.get_cart(current.id).await?;
    cart.add(product.id, quantity);
    users.save_cart(current.id, &cart).await?;

    tracing::debug!(product_id = %product.id, quantity, "added to cart");

    Ok(Redirect::to("/cart"))
}

/// Remove a product from the cart.
///
/// Removing a product that is not in the cart is a no-op, so retries
/// are harmless.
#[instrument(skip(state, current))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect> {
    let users = UserRepository::new(state.pool());

    let mut cart = users.get_cart(current.id).await?;
    cart.remove(ProductId::new(form.product_id));
    users.save_cart(current.id, &cart).await?;

    Ok(Redirect::to("/cart"))
}
