//! Checkout route handlers.
//!
//! `GET /checkout` builds a hosted payment session and renders the page
//! that redirects the shopper to the provider. The provider sends the
//! shopper back to `/checkout/success` (which materializes the order)
//! or `/checkout/cancel` (which leaves the cart untouched). A shopper
//! who abandons the hosted page simply never hits either callback; the
//! session was never persisted and the cart is unchanged.

use askama::Template;
use askama_web::WebTemplate;
use axum::{extract::State, response::Redirect};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::routes::cart::CartItemView;
use crate::services::checkout::CheckoutService;
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Checkout page template.
///
/// Carries the opaque provider session id and the publishable key; the
/// page's script hands both to the provider's client library for the
/// redirect.
#[derive(Template, WebTemplate)]
#[template(path = "checkout/show.html")]
pub struct CheckoutTemplate {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub session_id: String,
    pub session_url: String,
    pub publishable_key: String,
}

/// Begin a checkout attempt and display the checkout page.
#[instrument(skip(state, current))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<CheckoutTemplate> {
    let service = CheckoutService::new(state.pool(), state.payments(), state.config());
    let summary = service.begin(&current).await?;

    let total = marigold_core::Price::new(summary.total, state.config().payments.currency);

    Ok(CheckoutTemplate {
        items: summary.lines.iter().map(CartItemView::from).collect(),
        total: total.display(),
        session_id: summary.session.id,
        session_url: summary.session.url,
        publishable_key: state.config().payments.publishable_key.clone(),
    })
}

/// Provider success callback: materialize the order and show history.
#[instrument(skip(state, current))]
pub async fn success(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Redirect> {
    let order = OrderService::new(state.pool(), state.config())
        .place_order(&current)
        .await?;

    tracing::info!(order_id = %order.id, "order placed via checkout");

    Ok(Redirect::to("/orders"))
}

/// Provider cancel callback: nothing happened, back to the cart.
#[instrument(skip(_current))]
pub async fn cancel(RequireAuth(_current): RequireAuth) -> Redirect {
    Redirect::to("/cart")
}
