//! Order route handlers.
//!
//! Orders are immutable once placed; these handlers only create (from
//! the cart), list, and produce invoice documents.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Path, State},
    http::header,
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use tracing::instrument;

use marigold_core::OrderId;

use crate::db::OrderRepository;
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::order::Order;
use crate::services::invoice::InvoiceService;
use crate::services::orders::OrderService;
use crate::state::AppState;

/// Order display data for templates.
#[derive(Clone)]
pub struct OrderView {
    pub id: i32,
    pub placed_at: String,
    pub item_count: u32,
    pub total: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id.as_i32(),
            placed_at: order.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
            item_count: order.lines.iter().map(|l| l.quantity).sum(),
            // Always the snapshot total, never current catalog prices
            total: order.total_price().display(),
        }
    }
}

/// Order history page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/index.html")]
pub struct OrdersIndexTemplate {
    pub orders: Vec<OrderView>,
}

/// Display the shopper's order history, newest first.
#[instrument(skip(state, current))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<OrdersIndexTemplate> {
    let orders = OrderRepository::new(state.pool())
        .list_for_user(current.id)
        .await?;

    Ok(OrdersIndexTemplate {
        orders: orders.iter().map(OrderView::from).collect(),
    })
}

/// Place an order directly from the cart (no payment session).
#[instrument(skip(state, current))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
) -> Result<Redirect> {
    let order = OrderService::new(state.pool(), state.config())
        .place_order(&current)
        .await?;

    tracing::info!(order_id = %order.id, "order placed");

    Ok(Redirect::to("/orders"))
}

/// Stream an order's invoice document.
///
/// The document is generated once and delivered to the response while a
/// durable copy is written in the background; a slow or failing disk
/// never affects this response.
#[instrument(skip(state, current))]
pub async fn invoice(
    State(state): State<AppState>,
    RequireAuth(current): RequireAuth,
    Path(id): Path<i32>,
) -> Result<Response> {
    let service = InvoiceService::new(state.pool(), &state.config().invoice_dir);
    let document = service.generate(&current, OrderId::new(id)).await?;

    Ok((
        AppendHeaders([
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", document.file_name),
            ),
            (
                header::CONTENT_TYPE,
                "text/html; charset=utf-8".to_string(),
            ),
        ]),
        Html(document.html),
    )
        .into_response())
}
