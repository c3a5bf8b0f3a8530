//! Aggregate dashboard statistics.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use super::RepositoryError;
use super::orders::Order;

/// How many of the newest orders appear on the dashboard.
const RECENT_ORDER_LIMIT: i64 = 5;

/// One slice of the orders-by-status chart.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    /// Order status label.
    pub status: String,
    /// Number of orders currently in that status.
    pub count: i64,
}

/// Aggregate metrics for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_users: i64,
    pub total_orders: i64,
    pub total_revenue: Decimal,
    pub total_products: i64,
    pub chart_data: Vec<ChartPoint>,
    pub recent_orders: Vec<Order>,
}

/// Compute the dashboard summary.
///
/// Revenue is the sum of `total_price` over all orders regardless of payment
/// state, matching what the dashboard has always shown.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any query fails.
pub async fn compute_stats(pool: &PgPool) -> Result<StatsSummary, RepositoryError> {
    let total_users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await?;

    let total_orders: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(pool)
        .await?;

    let total_revenue: Decimal =
        sqlx::query_scalar("SELECT COALESCE(SUM(total_price), 0) FROM orders")
            .fetch_one(pool)
            .await?;

    let total_products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;

    let chart_data = sqlx::query_as::<_, ChartPoint>(
        r"
        SELECT order_status AS status, COUNT(*) AS count
        FROM orders
        GROUP BY order_status
        ORDER BY order_status
        ",
    )
    .fetch_all(pool)
    .await?;

    let recent_orders = sqlx::query_as::<_, Order>(
        r"
        SELECT id, buyer_email, seller_email, line_items, total_price,
               payment_status, order_status, created_at, updated_at
        FROM orders
        ORDER BY created_at DESC
        LIMIT $1
        ",
    )
    .bind(RECENT_ORDER_LIMIT)
    .fetch_all(pool)
    .await?;

    Ok(StatsSummary {
        total_users,
        total_orders,
        total_revenue,
        total_products,
        chart_data,
        recent_orders,
    })
}
