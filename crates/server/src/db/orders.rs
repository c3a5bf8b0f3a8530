//! Order lifecycle repository.
//!
//! Orders move `pending -> approved` or `pending -> rejected` and never
//! leave a terminal state through the fixed transitions. Every operation
//! here is a single statement; concurrent approve/reject races resolve to
//! whichever update commits last.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use loomcart_core::{Email, OrderStatus, PaymentStatus};

use super::{RepositoryError, UpdateOutcome};

/// An order record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Primary key.
    pub id: Uuid,
    /// Owning buyer, stamped lowercased at creation.
    pub buyer_email: Email,
    /// Selling manager, caller-supplied.
    pub seller_email: Email,
    /// Opaque line items as sent by the storefront.
    pub line_items: serde_json::Value,
    /// Order total.
    pub total_price: Decimal,
    /// Payment state derived at creation.
    pub payment_status: PaymentStatus,
    /// Lifecycle stage.
    pub order_status: OrderStatus,
    /// Server-stamped creation time.
    pub created_at: DateTime<Utc>,
    /// Last status-update time.
    pub updated_at: DateTime<Utc>,
}

/// Fields for creating an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_email: Email,
    pub seller_email: Email,
    pub line_items: serde_json::Value,
    pub total_price: Decimal,
    pub payment_status: PaymentStatus,
}

/// Scope for manager/admin order listings.
#[derive(Debug, Clone)]
pub enum OrderScope {
    /// Admin: every order.
    All,
    /// Manager: only orders sold by this email.
    Seller(Email),
}

const SELECT_COLUMNS: &str = "SELECT id, buyer_email, seller_email, line_items, total_price, \
     payment_status, order_status, created_at, updated_at FROM orders";

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

    /// Insert a new order with `order_status = pending`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, order: &NewOrder) -> Result<Uuid, RepositoryError> {
        let id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO orders
                (buyer_email, seller_email, line_items, total_price, payment_status, order_status)
            VALUES ($1, $2, $3, $4, $5, 'pending')
            RETURNING id
            ",
        )
        .bind(&order.buyer_email)
        .bind(&order.seller_email)
        .bind(&order.line_items)
        .bind(order.total_price)
        .bind(order.payment_status)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// A buyer's own orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_buyer(&self, buyer: &Email) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "{SELECT_COLUMNS} WHERE buyer_email = $1 ORDER BY created_at DESC"
        ))
        .bind(buyer)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Orders visible to a manager or admin, optionally filtered by status,
    /// newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_scoped(
        &self,
        scope: &OrderScope,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, RepositoryError> {
        // Both optional predicates are folded into the statement so the
        // query stays a single prepared form.
        let orders = sqlx::query_as::<_, Order>(&format!(
            "{SELECT_COLUMNS}
             WHERE ($1::text IS NULL OR seller_email = $1)
               AND ($2::text IS NULL OR order_status = $2)
             ORDER BY created_at DESC"
        ))
        .bind(match scope {
            OrderScope::All => None,
            OrderScope::Seller(email) => Some(email.clone()),
        })
        .bind(status.map(|s| s.to_string()))
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// All orders still awaiting a decision.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_pending(&self) -> Result<Vec<Order>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "{SELECT_COLUMNS} WHERE order_status = 'pending' ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// Get an order by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: Uuid) -> Result<Option<Order>, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(order)
    }

    /// Apply a fixed approve/reject transition.
    ///
    /// The write is guarded so re-applying an already-held status matches the
    /// row but modifies nothing; callers report `success` from `modified`.
    /// One statement, so matched/modified are read atomically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the statement fails.
    pub async fn apply_transition(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<UpdateOutcome, RepositoryError> {
        let (matched, modified): (i64, i64) = sqlx::query_as(
            r"
            WITH target AS (
                SELECT id FROM orders WHERE id = $1
            ), updated AS (
                UPDATE orders
                SET order_status = $2
                WHERE id = $1 AND order_status IS DISTINCT FROM $2
                RETURNING id
            )
            SELECT
                (SELECT COUNT(*) FROM target),
                (SELECT COUNT(*) FROM updated)
            ",
        )
        .bind(id)
        .bind(status)
        .fetch_one(self.pool)
        .await?;

        Ok(UpdateOutcome { matched, modified })
    }

    /// Set an order's status directly, stamping `updated_at`.
    ///
    /// Unlike [`Self::apply_transition`] the write is unconditional: the
    /// timestamp always moves, so a matched row is always a modified row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn set_status(
        &self,
        id: Uuid,
        status: OrderStatus,
    ) -> Result<UpdateOutcome, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET order_status = $1, updated_at = now()
            WHERE id = $2
            ",
        )
        .bind(status)
        .bind(id)
        .execute(self.pool)
        .await?;

        let matched = i64::try_from(result.rows_affected()).unwrap_or(i64::MAX);
        Ok(UpdateOutcome {
            matched,
            modified: matched,
        })
    }
}
