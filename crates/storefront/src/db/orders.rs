//! Order repository.
//!
//! Orders are insert-only: there is no update or delete path. Line
//! snapshots are embedded in the row as JSONB so an order stays intact
//! even if the products it references are later edited or removed.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use marigold_core::{Email, OrderId, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderLine, Purchaser};

/// Database row for an order.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: i32,
    user_id: i32,
    email: String,
    lines: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self) -> Result<Order, RepositoryError> {
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        let lines: Vec<OrderLine> = serde_json::from_value(self.lines).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid order lines in database: {e}"))
        })?;

        Ok(Order {
            id: OrderId::new(self.id),
            lines,
            purchaser: Purchaser {
                user_id: UserId::new(self.user_id),
                email,
            },
            created_at: self.created_at,
        })
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist a new order with its line snapshots.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails; nothing
    /// is written in that case.
    pub async fn create(
        &self,
        purchaser: &Purchaser,
        lines: &[OrderLine],
    ) -> Result<Order, RepositoryError> {
        let lines_value = serde_json::to_value(lines).map_err(|e| {
            RepositoryError::DataCorruption(format!("failed to serialize order lines: {e}"))
        })?;

        let row = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO orders (user_id, email, lines)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, email, lines, created_at
            ",
        )
        .bind(purchaser.user_id.as_i32())
        .bind(purchaser.email.as_str())
        .bind(lines_value)
        .fetch_one(self.pool)
        .await?;

        row.into_order()
    }

    /// Get an order by its ID. Returns `None` for unknown ids.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored line
    /// snapshots cannot be decoded.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, email, lines, created_at
            FROM orders
            WHERE id = $1
            ",
        )
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        row.map(OrderRow::into_order).transpose()
    }

    /// List a user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, email, lines, created_at
            FROM orders
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            ",
        )
        .bind(user_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(OrderRow::into_order).collect()
    }
}
