//! Invoice generation.
//!
//! Renders a persisted order into a document in a single pass, then
//! feeds the bytes to two sinks: a durable file named after the order
//! and the live HTTP response. The disk write is best-effort and never
//! delays or fails the response.

use std::path::{Path, PathBuf};

use askama::Template;
use sqlx::PgPool;
use thiserror::Error;

use marigold_core::OrderId;

use crate::db::{OrderRepository, RepositoryError};
use crate::models::order::Order;
use crate::models::session::CurrentUser;

/// Errors that can occur while generating an invoice.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// No order exists with the requested id.
    #[error("order not found")]
    NotFound,

    /// The requester is not the order's purchaser. No document bytes are
    /// produced in this case.
    #[error("order belongs to a different user")]
    NotPurchaser,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Template rendering failed.
    #[error("failed to render invoice: {0}")]
    Render(#[from] askama::Error),
}

/// One rendered invoice line.
struct InvoiceLineView {
    title: String,
    quantity: u32,
    unit_price: String,
    line_total: String,
}

/// Invoice document template.
#[derive(Template)]
#[template(path = "invoice/document.html")]
struct InvoiceTemplate {
    order_id: String,
    created_at: String,
    purchaser: String,
    lines: Vec<InvoiceLineView>,
    total: String,
}

/// A generated invoice document.
pub struct InvoiceDocument {
    /// Deterministic file name derived from the order id.
    pub file_name: String,
    /// The rendered document.
    pub html: String,
}

/// Generates invoice documents from persisted orders.
pub struct InvoiceService<'a> {
    orders: OrderRepository<'a>,
    invoice_dir: &'a Path,
}

impl<'a> InvoiceService<'a> {
    /// Create a new invoice service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, invoice_dir: &'a Path) -> Self {
        Self {
            orders: OrderRepository::new(pool),
            invoice_dir,
        }
    }

    /// Generate the invoice for an order, for its purchaser only.
    ///
    /// The document is rendered once from the order's own line
    /// snapshots - current catalog prices are never consulted, so the
    /// invoice cannot change after the fact. The rendered bytes are
    /// handed to a background task for the durable copy; the returned
    /// document is the response sink.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::NotFound` for an unknown order id and
    /// `InvoiceError::NotPurchaser` if the requester does not own the
    /// order.
    pub async fn generate(
        &self,
        current: &CurrentUser,
        order_id: OrderId,
    ) -> Result<InvoiceDocument, InvoiceError> {
        let order = self
            .orders
            .get_by_id(order_id)
            .await?
            .ok_or(InvoiceError::NotFound)?;

        // Purchaser-only: reject before any bytes are produced
        if order.purchaser.user_id != current.id {
            return Err(InvoiceError::NotPurchaser);
        }

        let document = render_invoice(&order)?;

        // Durable sink: spawned so the response never waits on disk,
        // and a disk failure never prevents delivery
        spawn_file_write(
            self.invoice_dir.join(&document.file_name),
            document.html.clone().into_bytes(),
        );

        Ok(document)
    }
}

/// Render an order into its invoice document (single generation pass).
fn render_invoice(order: &Order) -> Result<InvoiceDocument, askama::Error> {
    let currency = order.currency();

    let lines = order
        .lines
        .iter()
        .map(|line| InvoiceLineView {
            title: line.product.title.clone(),
            quantity: line.quantity,
            unit_price: line.product.price.display(),
            line_total: marigold_core::Price::new(line.line_total(), currency).display(),
        })
        .collect();

    let template = InvoiceTemplate {
        order_id: order.id.to_string(),
        created_at: order.created_at.format("%Y-%m-%d %H:%M UTC").to_string(),
        purchaser: order.purchaser.email.to_string(),
        lines,
        total: order.total_price().display(),
    };

    Ok(InvoiceDocument {
        file_name: invoice_file_name(order.id),
        html: template.render()?,
    })
}

/// Deterministic invoice file name for an order.
fn invoice_file_name(order_id: OrderId) -> String {
    format!("invoice-{order_id}.html")
}

/// Write the durable copy in the background, logging on failure.
fn spawn_file_write(path: PathBuf, bytes: Vec<u8>) {
    tokio::spawn(async move {
        if let Err(e) = write_invoice_file(&path, &bytes).await {
            tracing::warn!(path = %path.display(), "failed to persist invoice copy: {e}");
        }
    });
}

async fn write_invoice_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, bytes).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use marigold_core::{CurrencyCode, Email, Price, ProductId, UserId};

    use crate::models::order::{OrderLine, ProductSnapshot, Purchaser};

    fn sample_order() -> Order {
        let snapshot = |id: i32, cents: i64| ProductSnapshot {
            product_id: ProductId::new(id),
            title: format!("Product {id}"),
            description: "A test product".to_string(),
            price: Price::new(Decimal::new(cents, 2), CurrencyCode::USD),
            image_url: format!("/images/{id}.jpg"),
        };

        Order {
            id: OrderId::new(42),
            lines: vec![
                OrderLine {
                    product: snapshot(1, 1000),
                    quantity: 2,
                },
                OrderLine {
                    product: snapshot(2, 500),
                    quantity: 1,
                },
            ],
            purchaser: Purchaser {
                user_id: UserId::new(7),
                email: Email::parse("shopper@example.com").unwrap(),
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_invoice_file_name_is_deterministic() {
        assert_eq!(invoice_file_name(OrderId::new(42)), "invoice-42.html");
    }

    #[test]
    fn test_render_contains_lines_and_total() {
        let document = render_invoice(&sample_order()).unwrap();

        assert_eq!(document.file_name, "invoice-42.html");
        assert!(document.html.contains("Product 1"));
        assert!(document.html.contains("Product 2"));
        // Per-line "quantity x unit price" rows
        assert!(document.html.contains("$10.00"));
        assert!(document.html.contains("$5.00"));
        // Grand total computed from the snapshots
        assert!(document.html.contains("$25.00"));
        assert!(document.html.contains("shopper@example.com"));
    }

    #[test]
    fn test_render_uses_snapshot_prices_only() {
        // The renderer receives no catalog access at all; totals can
        // only come from the order's own snapshots
        let mut order = sample_order();
        order.lines.truncate(1);

        let document = render_invoice(&order).unwrap();
        assert!(document.html.contains("$20.00"));
    }
}
