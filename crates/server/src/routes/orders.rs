//! Order lifecycle route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use loomcart_core::{Email, OrderStatus, PaymentStatus};

use crate::db::OrderRepository;
use crate::db::orders::{NewOrder, Order, OrderScope};
use crate::error::AppError;
use crate::middleware::auth::{Principal, RequireAuth, RequireManager};
use crate::routes::{InsertResult, TransitionResult, UpdateResult};
use crate::state::AppState;

/// Build the order router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_own).post(create))
        .route("/orders/pending", get(list_pending))
        .route("/allorders", get(list_all))
        .route("/order-details/{id}", get(detail))
        .route("/orders/{id}", get(detail).patch(set_status))
        .route("/orders/approve/{id}", patch(approve))
        .route("/orders/reject/{id}", patch(reject))
}

/// The caller's own orders, newest first.
///
/// # Errors
///
/// Returns `AppError::Database` if the store fails.
pub async fn list_own(
    RequireAuth(principal): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderRepository::new(state.pool())
        .list_for_buyer(&principal.email)
        .await?;

    Ok(Json(orders))
}

/// All orders awaiting a decision.
///
/// # Errors
///
/// Returns `AppError::Database` if the store fails.
pub async fn list_pending(
    RequireManager(_principal): RequireManager,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>, AppError> {
    let orders = OrderRepository::new(state.pool()).list_pending().await?;
    Ok(Json(orders))
}

/// Filter for the scoped order listing.
#[derive(Debug, Default, Deserialize)]
pub struct AllOrdersQuery {
    pub status: Option<String>,
}

/// Orders visible to the caller: everything for admins, own sales for
/// managers, optionally filtered by status.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a status outside the enumerated
/// domain and `AppError::Database` if the store fails.
pub async fn list_all(
    RequireManager(principal): RequireManager,
    State(state): State<AppState>,
    Query(query): Query<AllOrdersQuery>,
) -> Result<Json<Vec<Order>>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(OrderStatus::parse)
        .transpose()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let scope = scope_for(&principal);
    let orders = OrderRepository::new(state.pool())
        .list_scoped(&scope, status)
        .await?;

    Ok(Json(orders))
}

/// Single order by id; any verified caller may read it.
///
/// # Errors
///
/// Returns `AppError::NotFound` if the order does not exist and
/// `AppError::Database` if the store fails.
pub async fn detail(
    RequireAuth(_principal): RequireAuth,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Order not found".to_owned()))?;

    Ok(Json(order))
}

/// Order creation request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub seller_email: String,
    #[serde(default)]
    pub line_items: serde_json::Value,
    #[serde(default)]
    pub total_price: Decimal,
    #[serde(default)]
    pub payment_required: bool,
}

/// Create an order.
///
/// The buyer is always the verified caller (lowercased); the declared
/// payment-required flag picks `unpaid` vs `cod`; the order starts
/// `pending`.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for an unusable seller email or negative
/// total, `AppError::Database` if the store fails.
pub async fn create(
    RequireAuth(principal): RequireAuth,
    State(state): State<AppState>,
    Json(body): Json<CreateOrderRequest>,
) -> Result<Json<InsertResult<Uuid>>, AppError> {
    if body.total_price.is_sign_negative() {
        return Err(AppError::BadRequest("totalPrice must be >= 0".to_owned()));
    }
    let seller_email = Email::parse(&body.seller_email)
        .map_err(|e| AppError::BadRequest(format!("sellerEmail: {e}")))?
        .normalized();

    let line_items = if body.line_items.is_null() {
        serde_json::Value::Array(vec![])
    } else {
        body.line_items
    };

    let id = OrderRepository::new(state.pool())
        .create(&NewOrder {
            buyer_email: principal.email,
            seller_email,
            line_items,
            total_price: body.total_price,
            payment_status: PaymentStatus::from_payment_required(body.payment_required),
        })
        .await?;

    Ok(Json(InsertResult::new(id)))
}

/// Approve a pending order.
///
/// # Errors
///
/// Returns `AppError::Database` if the store fails.
pub async fn approve(
    RequireManager(_principal): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResult>, AppError> {
    transition(&state, id, OrderStatus::Approved).await
}

/// Reject a pending order.
///
/// # Errors
///
/// Returns `AppError::Database` if the store fails.
pub async fn reject(
    RequireManager(_principal): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<TransitionResult>, AppError> {
    transition(&state, id, OrderStatus::Rejected).await
}

/// Status update request for the generic endpoint.
#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub status: String,
}

/// Set an order's status directly, stamping `updatedAt`.
///
/// Unlike the original API this validates the status against the enumerated
/// domain instead of storing whatever string arrives.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for a status outside the domain and
/// `AppError::Database` if the store fails.
pub async fn set_status(
    RequireManager(_principal): RequireManager,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<SetStatusRequest>,
) -> Result<Json<UpdateResult>, AppError> {
    let status =
        OrderStatus::parse(&body.status).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let outcome = OrderRepository::new(state.pool())
        .set_status(id, status)
        .await?;

    Ok(Json(UpdateResult::new(outcome.matched, outcome.modified)))
}

/// Shared approve/reject implementation: re-applying a held status matches
/// without modifying, and `success` reports whether the row changed.
async fn transition(
    state: &AppState,
    id: Uuid,
    status: OrderStatus,
) -> Result<Json<TransitionResult>, AppError> {
    let outcome = OrderRepository::new(state.pool())
        .apply_transition(id, status)
        .await?;

    Ok(Json(TransitionResult {
        acknowledged: true,
        matched_count: outcome.matched,
        modified_count: outcome.modified,
        success: outcome.changed(),
    }))
}

/// Listing scope for a manager-or-admin caller.
fn scope_for(principal: &Principal) -> OrderScope {
    if principal.role.is_admin() {
        OrderScope::All
    } else {
        OrderScope::Seller(principal.email.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use loomcart_core::Role;

    fn principal(role: Role) -> Principal {
        Principal {
            email: Email::parse("seller@example.com").unwrap(),
            role,
        }
    }

    #[test]
    fn test_scope_for_admin_sees_all() {
        assert!(matches!(scope_for(&principal(Role::Admin)), OrderScope::All));
    }

    #[test]
    fn test_scope_for_manager_is_seller_scoped() {
        let scope = scope_for(&principal(Role::Manager));
        let OrderScope::Seller(email) = scope else {
            panic!("expected seller scope");
        };
        assert_eq!(email.as_str(), "seller@example.com");
    }

    #[test]
    fn test_create_order_request_defaults() {
        let body: CreateOrderRequest =
            serde_json::from_str(r#"{"sellerEmail": "seller@example.com"}"#).unwrap();
        assert!(!body.payment_required);
        assert_eq!(body.total_price, Decimal::ZERO);
        assert!(body.line_items.is_null());
    }
}
