//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET   /                           - Service banner
//! GET   /health                     - Liveness check
//! GET   /health/ready               - Readiness check (DB ping)
//!
//! # Principals
//! POST  /users                      - Register (public, default role buyer)
//! GET   /users                      - List principals (admin)
//! GET   /user/{email}/role          - Role lookup (public, defaults to buyer)
//! PATCH /users/{id}                 - Set role (admin)
//!
//! # Catalog
//! GET   /products/home              - Newest products for the home page (public)
//! GET   /products                   - Paged/filtered/sorted catalog (public)
//! GET   /products/{id}              - Single product (public)
//! GET   /all-products/{email}       - Caller-scoped product list (manager/admin)
//! POST  /products                   - Create product (manager/admin)
//! PATCH /products/{id}              - Update product fields (owner or admin)
//! PATCH /products/toggle-home/{id}  - Toggle home visibility (owner or admin)
//! DELETE /products/{id}             - Delete product (owner or admin)
//!
//! # Orders
//! GET   /orders                     - Caller's own orders (authenticated)
//! GET   /orders/pending             - Pending orders (manager/admin)
//! GET   /allorders?status=          - Scoped + filtered orders (manager/admin)
//! GET   /order-details/{id}         - Single order (authenticated)
//! GET   /orders/{id}                - Single order, compatibility alias
//! POST  /orders                     - Create order (authenticated)
//! PATCH /orders/approve/{id}        - Approve (manager/admin)
//! PATCH /orders/reject/{id}         - Reject (manager/admin)
//! PATCH /orders/{id}                - Validated status set (manager/admin)
//!
//! # Tracking
//! POST  /tracking                   - Append event (manager/admin)
//! GET   /tracking/{orderId}         - Event history (public, [] if none)
//!
//! # Payment & dashboard
//! POST  /create-checkout-session    - Hosted payment redirect URL (public)
//! GET   /admin-stats                - Aggregate metrics (admin)
//! ```
//!
//! Result bodies mirror the original API's store-result shapes
//! (`insertedId`, `matchedCount`, `modifiedCount`, `deletedCount`,
//! `success`); errors are `{"message": ...}`.

pub mod checkout;
pub mod orders;
pub mod products;
pub mod stats;
pub mod tracking;
pub mod users;

use axum::Router;
use serde::Serialize;

use crate::state::AppState;

/// Body for a successful insert.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertResult<T> {
    pub acknowledged: bool,
    pub inserted_id: T,
}

impl<T> InsertResult<T> {
    pub(crate) const fn new(inserted_id: T) -> Self {
        Self {
            acknowledged: true,
            inserted_id,
        }
    }
}

/// Body for an update.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: i64,
    pub modified_count: i64,
}

impl UpdateResult {
    pub(crate) const fn new(matched_count: i64, modified_count: i64) -> Self {
        Self {
            acknowledged: true,
            matched_count,
            modified_count,
        }
    }
}

/// Body for the fixed approve/reject transitions: an update plus the
/// `success` flag the storefront keys off.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResult {
    pub acknowledged: bool,
    pub matched_count: i64,
    pub modified_count: i64,
    pub success: bool,
}

/// Body for a delete.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: i64,
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(users::router())
        .merge(products::router())
        .merge(orders::router())
        .merge(tracking::router())
        .merge(checkout::router())
        .merge(stats::router())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_result_wire_shape() {
        let body = serde_json::to_value(InsertResult::new(7)).unwrap();
        assert_eq!(body["acknowledged"], true);
        assert_eq!(body["insertedId"], 7);
    }

    #[test]
    fn test_update_result_wire_shape() {
        let body = serde_json::to_value(UpdateResult::new(1, 0)).unwrap();
        assert_eq!(body["matchedCount"], 1);
        assert_eq!(body["modifiedCount"], 0);
    }
}
