//! Hosted checkout route handler.

use axum::{Json, Router, extract::State, routing::post};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::services::checkout::CheckoutSessionParams;
use crate::state::AppState;

/// Build the checkout router.
pub fn router() -> Router<AppState> {
    Router::new().route("/create-checkout-session", post(create_session))
}

/// Checkout session request from the storefront.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub product_title: String,
    pub price: Decimal,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub email: String,
    #[serde(default)]
    pub order_data: serde_json::Value,
}

const fn default_quantity() -> u32 {
    1
}

/// The hosted payment page to redirect to.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

/// Create a hosted payment session and return its redirect URL.
///
/// # Errors
///
/// Returns `AppError::Payment` (a 500 to the client) when the processor
/// call fails.
pub async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>, AppError> {
    let session = state
        .checkout()
        .create_session(&CheckoutSessionParams {
            product_title: body.product_title,
            price: body.price,
            quantity: body.quantity,
            email: body.email,
            order_data: body.order_data,
        })
        .await?;

    Ok(Json(CheckoutResponse { url: session.url }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_checkout_request_quantity_defaults_to_one() {
        let body: CheckoutRequest = serde_json::from_str(
            r#"{"productTitle": "Denim Jacket", "price": "19.99", "email": "buyer@example.com"}"#,
        )
        .unwrap();
        assert_eq!(body.quantity, 1);
        assert!(body.order_data.is_null());
    }
}
